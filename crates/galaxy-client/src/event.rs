//! Client events and actions.

use galaxy_core::{ConnectionAction, LinkId};

use crate::SubscriptionId;

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Reporting link lifecycle and inbound frames, tagged with the link id
///   from the `OpenLink` action that created the link
/// - Driving time forward via ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Link finished opening.
    LinkOpened {
        /// Link that opened
        link: LinkId,
    },

    /// Link closed, by either side.
    LinkClosed {
        /// Link that closed
        link: LinkId,
        /// Close reason, if the peer gave one
        reason: String,
    },

    /// Link failed.
    LinkError {
        /// Link that failed
        link: LinkId,
        /// Error description
        reason: String,
    },

    /// Text frame received.
    FrameReceived {
        /// Link the frame arrived on
        link: LinkId,
        /// Raw frame text
        text: String,
    },

    /// Time tick for reconnect and heartbeat timers.
    ///
    /// The caller should tick periodically, well below the ping interval.
    Tick,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientAction {
    /// Open a new link to `url`.
    OpenLink {
        /// Id to tag the link's events with
        link: LinkId,
        /// Endpoint to dial
        url: String,
    },

    /// Write one text frame.
    SendText {
        /// Link to write on
        link: LinkId,
        /// Encoded frame
        text: String,
    },

    /// Close a link.
    CloseLink {
        /// Link to close
        link: LinkId,
        /// Reason for closing
        reason: String,
    },

    /// A view's state changed; consumers should re-read it.
    ViewUpdated {
        /// View that changed
        view: SubscriptionId,
    },

    /// The connected flag flipped.
    ConnectivityChanged {
        /// New value
        connected: bool,
    },
}

impl From<ConnectionAction> for ClientAction {
    fn from(action: ConnectionAction) -> Self {
        match action {
            ConnectionAction::OpenLink { link, url } => Self::OpenLink { link, url },
            ConnectionAction::SendText { link, text } => Self::SendText { link, text },
            ConnectionAction::CloseLink { link, reason } => Self::CloseLink { link, reason },
        }
    }
}
