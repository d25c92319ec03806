//! Galaxy application runtime.
//!
//! Wires the Sans-IO [`galaxy_client::Client`] to real I/O. The generic
//! [`Runtime`] owns the event loop; a [`Driver`] supplies the platform side
//! (WebSocket links, clock, rendering).
//!
//! # Components
//!
//! - [`Runtime`]: event loop over link events, commands and timer ticks
//! - [`Driver`]: I/O abstraction, implemented by [`WsDriver`] in production
//! - [`Command`]: consumer intents parsed from input lines
//! - [`AppConfig`]: runtime settings mapped onto the client configuration

#![forbid(unsafe_code)]

mod command;
mod config;
mod driver;
mod runtime;
mod system_env;
mod ws_driver;

pub use command::{Command, CommandError};
pub use config::AppConfig;
pub use driver::Driver;
pub use runtime::Runtime;
pub use system_env::SystemEnv;
pub use ws_driver::{WsDriver, WsDriverError};
