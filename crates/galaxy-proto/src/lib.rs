//! Galaxy wire protocol
//!
//! Every exchange with the chat server is a JSON text frame carrying a `type`
//! tag and a tag-dependent payload. This crate owns the shape of those frames
//! and nothing else: no I/O, no connection state.
//!
//! # Components
//!
//! - [`Tag`]: the fixed vocabulary of frame tags
//! - [`Envelope`]: a decoded frame (`type` + payload)
//! - [`Request`]: typed outbound operations
//! - [`MessageBody`]: the `[IMAGE]:` / `[FILE]:` body convention as a tagged
//!   variant
//! - [`payloads`]: wire structs for users, chats and chat-list entries

#![forbid(unsafe_code)]

mod body;
mod envelope;
pub mod errors;
pub mod payloads;
mod tag;

pub use body::{FILE_PREFIX, IMAGE_PREFIX, MessageBody};
pub use envelope::{Envelope, MAX_FRAME_SIZE};
pub use errors::ProtocolError;
pub use payloads::Request;
pub use tag::Tag;

/// Numeric identity of a signed-in user or a counterpart.
pub type UserId = u64;
