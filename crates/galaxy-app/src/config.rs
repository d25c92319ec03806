//! Runtime configuration.

use std::time::Duration;

use galaxy_client::{ClientConfig, LivenessConfig};
use galaxy_core::{
    ConnectionConfig, DEFAULT_CHAT_PATH, DEFAULT_DEGRADED_AFTER, DEFAULT_PING_INTERVAL,
    DEFAULT_RECONNECT_DELAY,
};
use galaxy_proto::UserId;

/// Default timer resolution of the runtime loop.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Settings for one runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Server base URL, with or without a `ws://`/`wss://` scheme
    pub server_url: String,
    /// Chat endpoint path appended to the base URL
    pub chat_path: String,
    /// Identity to sign in as
    pub identity: UserId,
    /// Delay before reconnecting a dropped link
    pub reconnect_delay: Duration,
    /// Heartbeat interval, or `None` to run without a liveness monitor
    pub ping_interval: Option<Duration>,
    /// Unanswered pings before the link is reported degraded
    pub degraded_after: u32,
    /// How often timers are checked
    pub tick_interval: Duration,
}

impl AppConfig {
    /// Defaults for `identity` against `server_url`.
    pub fn new(server_url: impl Into<String>, identity: UserId) -> Self {
        Self {
            server_url: server_url.into(),
            chat_path: DEFAULT_CHAT_PATH.to_string(),
            identity,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            ping_interval: Some(DEFAULT_PING_INTERVAL),
            degraded_after: DEFAULT_DEGRADED_AFTER,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    /// Client configuration derived from these settings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            connection: ConnectionConfig {
                base_url: self.server_url.clone(),
                path: self.chat_path.clone(),
                reconnect_delay: self.reconnect_delay,
            },
            liveness: LivenessConfig {
                interval: self.ping_interval.unwrap_or(DEFAULT_PING_INTERVAL),
                degraded_after: self.degraded_after,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_client_config() {
        let mut config = AppConfig::new("chat.example.com", 7);
        config.reconnect_delay = Duration::from_secs(1);
        config.ping_interval = None;

        let client = config.client_config();

        assert_eq!(client.connection.reconnect_delay, Duration::from_secs(1));
        assert_eq!(client.liveness.interval, DEFAULT_PING_INTERVAL);
        assert_eq!(
            client.connection.endpoint_url(7),
            "wss://chat.example.com/ChatApp/chat?userId=7"
        );
    }
}
