//! Connection lifecycle state machine.
//!
//! Owns the identity's single link to the chat server: opens it, notices when
//! it drops, and schedules exactly one reconnect after a fixed delay. Uses the
//! action pattern: methods take time as input and return actions for the
//! driver to execute. The driver owns the socket; this type only decides.
//!
//! # State Machine
//!
//! ```text
//!                 connect               open
//! ┌──────────────┐ ──────> ┌────────────┐ ──────> ┌───────────┐
//! │ Disconnected │         │ Connecting │         │ Connected │
//! └──────────────┘ <────── └────────────┘         └───────────┘
//!        ↑  │    close/error                            │
//!        │  │ tick (delay elapsed)                      │ close/error
//!        │  └─────> connect with a fresh link           │
//!        └──────────────────────────────────────────────┘
//! ```
//!
//! Every physical link gets a fresh [`LinkId`]. Events carry the id of the
//! link they came from, and events for any link other than the current one
//! are ignored, so a late close from a replaced link can never schedule a
//! reconnect or flip the state.

use std::{
    fmt,
    ops::Sub,
    time::{Duration, Instant},
};

use galaxy_proto::{Envelope, UserId};
use tracing::{debug, info, warn};

use crate::error::ConnectionError;

/// Delay between losing the link and the single reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(4000);

/// Path of the chat endpoint below the base URL.
pub const DEFAULT_CHAT_PATH: &str = "/ChatApp/chat";

/// Default base URL for local development servers.
const DEFAULT_BASE_URL: &str = "ws://localhost:8080";

/// Handle naming one physical link.
///
/// Ids increase monotonically for the lifetime of a client, across identity
/// changes, so a stale link can always be told apart from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(u64);

impl LinkId {
    /// First id handed out by a fresh client.
    pub const FIRST: LinkId = LinkId(1);

    /// Wrap a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw id.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Id following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// Actions returned by the connection state machine.
///
/// The driver executes these:
/// - `OpenLink`: dial `url` and report open/close/error against `link`
/// - `SendText`: write one text frame on `link`
/// - `CloseLink`: close `link` and drop it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a new physical link
    OpenLink {
        /// Id the driver must tag this link's events with
        link: LinkId,
        /// Endpoint to dial
        url: String,
    },

    /// Transmit an encoded frame
    SendText {
        /// Link to write on
        link: LinkId,
        /// Encoded frame
        text: String,
    },

    /// Close a link deliberately
    CloseLink {
        /// Link to close
        link: LinkId,
        /// Reason for closing
        reason: String,
    },
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No link, or the link dropped. A reconnect may be pending.
    Disconnected,
    /// Link requested, waiting for it to open
    Connecting,
    /// Link open; sends are transmitted
    Connected,
}

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server base URL. A `wss://` scheme is assumed when no `ws` scheme is
    /// given.
    pub base_url: String,
    /// Endpoint path appended to the base URL
    pub path: String,
    /// Delay before the single reconnect attempt
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            path: DEFAULT_CHAT_PATH.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ConnectionConfig {
    /// Default policy against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Self::default() }
    }

    /// Endpoint for `identity`: `{base}{path}?userId={identity}`.
    pub fn endpoint_url(&self, identity: UserId) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.starts_with("ws") {
            format!("{base}{}?userId={identity}", self.path)
        } else {
            format!("wss://{base}{}?userId={identity}", self.path)
        }
    }
}

/// Connection state machine for one identity.
///
/// Pure: no I/O and no clock. Generic over `Instant` so tests can drive
/// virtual time.
///
/// # Invariants
///
/// - At most one reconnect is pending at any time.
/// - No reconnect is pending while `Connected`.
/// - Once torn down, no action other than a final `CloseLink` is ever
///   returned.
#[derive(Debug, Clone)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Identity merged into every outbound frame
    identity: UserId,
    /// Configuration
    config: ConnectionConfig,
    /// Current state
    state: ConnectionState,
    /// Current physical link, if one was ever requested
    link: Option<LinkId>,
    /// Id for the next link this connection opens
    next_link: LinkId,
    /// Last open, send or inbound frame
    last_activity: Option<I>,
    /// When the pending reconnect was scheduled
    reconnect_since: Option<I>,
    /// Set by `teardown`; stops all further reconnects
    torn_down: bool,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a connection in [`ConnectionState::Disconnected`].
    ///
    /// `first_link` is the id used by the first `connect`; later reconnects
    /// count up from it.
    pub fn new(identity: UserId, config: ConnectionConfig, first_link: LinkId) -> Self {
        Self {
            identity,
            config,
            state: ConnectionState::Disconnected,
            link: None,
            next_link: first_link,
            last_activity: None,
            reconnect_since: None,
            torn_down: false,
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True while the link is open.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Identity this connection belongs to.
    pub fn identity(&self) -> UserId {
        self.identity
    }

    /// Current link, if any was requested.
    pub fn current_link(&self) -> Option<LinkId> {
        self.link
    }

    /// Id the next link will get.
    pub fn next_link(&self) -> LinkId {
        self.next_link
    }

    /// When the pending reconnect was scheduled. `None` if none is pending.
    pub fn reconnect_pending_since(&self) -> Option<I> {
        self.reconnect_since
    }

    /// Configured reconnect delay.
    pub fn reconnect_delay(&self) -> Duration {
        self.config.reconnect_delay
    }

    /// Last observed activity.
    pub fn last_activity(&self) -> Option<I> {
        self.last_activity
    }

    /// True after `teardown`.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Endpoint this connection dials.
    pub fn endpoint_url(&self) -> String {
        self.config.endpoint_url(self.identity)
    }

    /// True if `link` is the current link.
    pub fn is_current(&self, link: LinkId) -> bool {
        self.link == Some(link)
    }

    /// Start a connect attempt on a fresh link.
    ///
    /// Clears any pending reconnect, since this attempt supersedes it.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::TornDown` after `teardown`
    /// - `ConnectionError::InvalidState` unless `Disconnected`
    pub fn connect(&mut self, now: I) -> Result<Vec<ConnectionAction>, ConnectionError> {
        if self.torn_down {
            return Err(ConnectionError::TornDown);
        }

        if self.state != ConnectionState::Disconnected {
            return Err(ConnectionError::InvalidState {
                state: self.state,
                operation: "connect".to_string(),
            });
        }

        let link = self.next_link;
        self.next_link = link.next();
        self.link = Some(link);
        self.state = ConnectionState::Connecting;
        self.reconnect_since = None;
        self.last_activity = Some(now);

        let url = self.endpoint_url();
        info!(identity = self.identity, %link, %url, "connecting");

        Ok(vec![ConnectionAction::OpenLink { link, url }])
    }

    /// Link reported open.
    pub fn handle_open(&mut self, link: LinkId, now: I) -> Vec<ConnectionAction> {
        if self.torn_down || !self.is_current(link) {
            debug!(%link, "ignoring open from stale link");
            return Vec::new();
        }

        if self.state != ConnectionState::Connecting {
            debug!(%link, state = ?self.state, "ignoring duplicate open");
            return Vec::new();
        }

        self.state = ConnectionState::Connected;
        self.reconnect_since = None;
        self.last_activity = Some(now);
        info!(identity = self.identity, %link, "connected");

        Vec::new()
    }

    /// Link reported closed.
    pub fn handle_close(&mut self, link: LinkId, now: I, reason: &str) -> Vec<ConnectionAction> {
        if self.torn_down || !self.is_current(link) {
            debug!(%link, "ignoring close from stale link");
            return Vec::new();
        }

        warn!(identity = self.identity, %link, reason, "link closed");
        self.link_lost(now);

        Vec::new()
    }

    /// Link reported an error.
    ///
    /// Handled like a close, plus a deliberate `CloseLink` for the failed link
    /// if it was still live.
    pub fn handle_error(&mut self, link: LinkId, now: I, reason: &str) -> Vec<ConnectionAction> {
        if self.torn_down || !self.is_current(link) {
            debug!(%link, "ignoring error from stale link");
            return Vec::new();
        }

        warn!(identity = self.identity, %link, reason, "link error");
        let was_live = self.state != ConnectionState::Disconnected;
        self.link_lost(now);

        if was_live {
            vec![ConnectionAction::CloseLink { link, reason: reason.to_string() }]
        } else {
            Vec::new()
        }
    }

    fn link_lost(&mut self, now: I) {
        self.state = ConnectionState::Disconnected;

        if self.reconnect_since.is_some() {
            debug!(identity = self.identity, "reconnect already pending");
            return;
        }

        self.reconnect_since = Some(now);
        info!(
            identity = self.identity,
            delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "reconnect scheduled"
        );
    }

    /// Process timers. Fires the pending reconnect once its delay elapsed.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        if self.torn_down || self.state != ConnectionState::Disconnected {
            return Vec::new();
        }

        let Some(since) = self.reconnect_since else {
            return Vec::new();
        };

        if now - since < self.config.reconnect_delay {
            return Vec::new();
        }

        info!(identity = self.identity, "reconnecting");
        match self.connect(now) {
            Ok(actions) => actions,
            Err(err) => {
                warn!(identity = self.identity, %err, "reconnect failed");
                Vec::new()
            },
        }
    }

    /// Record inbound traffic on the current link.
    pub fn record_activity(&mut self, now: I) {
        self.last_activity = Some(now);
    }

    /// Transmit `envelope` with this connection's identity merged in.
    ///
    /// Not connected: logs a warning and returns no actions. Nothing is
    /// queued.
    pub fn send(&mut self, envelope: &Envelope, now: I) -> Vec<ConnectionAction> {
        let (ConnectionState::Connected, Some(link)) = (self.state, self.link) else {
            warn!(tag = envelope.raw_tag(), state = ?self.state, "cannot send, link not open");
            return Vec::new();
        };

        match envelope.encode(self.identity) {
            Ok(text) => {
                self.last_activity = Some(now);
                vec![ConnectionAction::SendText { link, text }]
            },
            Err(err) => {
                warn!(tag = envelope.raw_tag(), %err, "dropping unencodable frame");
                Vec::new()
            },
        }
    }

    /// End this connection for good.
    ///
    /// Cancels any pending reconnect and closes a live link. Idempotent.
    pub fn teardown(&mut self) -> Vec<ConnectionAction> {
        let was = self.state;
        self.torn_down = true;
        self.reconnect_since = None;
        self.state = ConnectionState::Disconnected;

        match (was, self.link) {
            (ConnectionState::Connecting | ConnectionState::Connected, Some(link)) => {
                info!(identity = self.identity, %link, "tearing down");
                vec![ConnectionAction::CloseLink { link, reason: "teardown".to_string() }]
            },
            _ => Vec::new(),
        }
    }
}
