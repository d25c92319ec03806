//! Client
//!
//! Session object for the Galaxy chat client. Owns the identity's single
//! connection, routes inbound frames to the views that care about them, and
//! turns consumer intents into outbound frames.
//!
//! # Architecture
//!
//! The client follows the same Sans-IO and action-based patterns as
//! [`galaxy_core`]. It receives events ([`ClientEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ClientAction`])
//! for the caller to execute.
//!
//! # Components
//!
//! - [`Client`]: session state machine, one connection per identity
//! - [`Dispatcher`]: tag-keyed subscription registry
//! - [`projection`]: chat list, transcript, roster, new-contact and profile
//!   views, each a fold over its own tags
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides
//! [`transport::open_link`], which runs one WebSocket link in a background
//! task and reports its events as [`ClientEvent`]s.

#![forbid(unsafe_code)]

mod client;
mod dispatcher;
mod error;
mod event;
pub mod projection;

#[cfg(feature = "transport")]
pub mod transport;

pub use client::{Client, ClientConfig, ViewHandle};
pub use dispatcher::{Dispatcher, SubscriptionId, ViewKind};
pub use error::ClientError;
pub use event::{ClientAction, ClientEvent};
pub use galaxy_core::{Environment, LinkId, LivenessConfig};
pub use projection::{
    ChatListView, ChatSummary, Contact, Message, NewContactView, ProfileView, Projection,
    RosterView, TranscriptView, View,
};
