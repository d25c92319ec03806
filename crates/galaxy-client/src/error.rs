//! Client error types.

use galaxy_core::ConnectionError;
use thiserror::Error;

use crate::SubscriptionId;

/// Errors returned by [`crate::Client`] operations.
///
/// Transport faults never show up here; they arrive as events and are
/// recovered by reconnecting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Connection state machine rejected the operation
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Handle does not name an attached view of the expected kind
    #[error("no attached view for {0}")]
    UnknownView(SubscriptionId),
}
