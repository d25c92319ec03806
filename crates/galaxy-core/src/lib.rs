//! Galaxy connection core
//!
//! Sans-IO state machines for the single persistent link a signed-in user
//! keeps with the chat server. Methods take the current time as input and
//! return actions for a driver to execute; nothing here touches a socket or a
//! clock.
//!
//! # Components
//!
//! - [`connection`]: link lifecycle, single-retry reconnect, gated send
//! - [`heartbeat`]: diagnostic PING/PONG liveness monitor
//! - [`env`]: time abstraction implemented by drivers

#![forbid(unsafe_code)]

pub mod connection;
pub mod env;
pub mod error;
pub mod heartbeat;

pub use connection::{
    Connection, ConnectionAction, ConnectionConfig, ConnectionState, DEFAULT_CHAT_PATH,
    DEFAULT_RECONNECT_DELAY, LinkId,
};
pub use env::Environment;
pub use error::ConnectionError;
pub use heartbeat::{DEFAULT_DEGRADED_AFTER, DEFAULT_PING_INTERVAL, LivenessConfig, LivenessMonitor};
