//! Liveness monitor.
//!
//! Sends `PING` on a fixed interval while the link is open and counts how
//! many went unanswered. The monitor is diagnostic only: it logs degradation
//! and exposes it as a query, but it never closes the link. Reconnects are
//! triggered solely by the transport's own close and error events.
//!
//! The monitor is armed when the connection becomes `Connected` and disarmed
//! the moment it drops, so no ping timer outlives its link.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use galaxy_proto::Request;
use tracing::{debug, info, warn};

/// Default interval between pings.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_millis(5000);

/// Consecutive unanswered pings after which the link counts as degraded.
pub const DEFAULT_DEGRADED_AFTER: u32 = 3;

/// Liveness configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessConfig {
    /// Interval between pings
    pub interval: Duration,
    /// Unanswered pings before degradation is reported
    pub degraded_after: u32,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self { interval: DEFAULT_PING_INTERVAL, degraded_after: DEFAULT_DEGRADED_AFTER }
    }
}

impl LivenessConfig {
    /// Default threshold with a caller-supplied interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self { interval, ..Self::default() }
    }
}

/// PING/PONG liveness monitor.
#[derive(Debug, Clone)]
pub struct LivenessMonitor<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    config: LivenessConfig,
    /// Time of the last ping, or of arming. `None` while disarmed.
    last_ping: Option<I>,
    /// Pings sent since the last PONG
    unanswered: u32,
    /// Degradation already reported
    degraded: bool,
}

impl<I> LivenessMonitor<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a disarmed monitor.
    pub fn new(config: LivenessConfig) -> Self {
        Self { config, last_ping: None, unanswered: 0, degraded: false }
    }

    /// Configuration in effect.
    pub fn config(&self) -> LivenessConfig {
        self.config
    }

    /// True while pings are being scheduled.
    pub fn is_armed(&self) -> bool {
        self.last_ping.is_some()
    }

    /// Pings sent since the last PONG.
    pub fn unanswered(&self) -> u32 {
        self.unanswered
    }

    /// True once `degraded_after` pings in a row went unanswered.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Start the ping timer. The first ping goes out one interval from `now`.
    ///
    /// Arming an armed monitor keeps its schedule.
    pub fn arm(&mut self, now: I) {
        if self.last_ping.is_some() {
            return;
        }
        debug!(interval_ms = self.config.interval.as_millis() as u64, "liveness armed");
        self.last_ping = Some(now);
        self.unanswered = 0;
        self.degraded = false;
    }

    /// Stop the ping timer and forget all counts.
    pub fn disarm(&mut self) {
        if self.last_ping.take().is_some() {
            debug!("liveness disarmed");
        }
        self.unanswered = 0;
        self.degraded = false;
    }

    /// Returns a `PING` request when one is due.
    pub fn tick(&mut self, now: I) -> Option<Request> {
        let last = self.last_ping?;
        if now - last < self.config.interval {
            return None;
        }

        if self.unanswered >= self.config.degraded_after && !self.degraded {
            self.degraded = true;
            warn!(unanswered = self.unanswered, "link degraded, pings going unanswered");
        }

        self.last_ping = Some(now);
        self.unanswered = self.unanswered.saturating_add(1);

        Some(Request::Ping)
    }

    /// A `PONG` arrived.
    pub fn handle_pong(&mut self) {
        debug!("PONG");
        if self.degraded {
            info!("link recovered");
        }
        self.unanswered = 0;
        self.degraded = false;
    }
}
