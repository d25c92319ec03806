//! Error types for the connection core.

use thiserror::Error;

use crate::connection::ConnectionState;

/// Errors returned by connection state machine operations.
///
/// These are programming errors at the call site (connecting twice, say),
/// never transport faults. Transport faults are events, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Operation not allowed in the current state
    #[error("invalid state transition: cannot {operation} from {state:?}")]
    InvalidState {
        /// Current state when the error occurred
        state: ConnectionState,
        /// Operation that was attempted
        operation: String,
    },

    /// Connection was torn down and cannot be reused
    #[error("connection was torn down")]
    TornDown,
}
