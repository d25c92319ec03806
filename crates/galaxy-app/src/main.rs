//! Galaxy chat command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Sign in as user 7 against a local server
//! galaxy --server ws://localhost:8080 --user 7
//!
//! # Same, configured through the environment
//! GALAXY_WS_URL=chat.example.com GALAXY_USER_ID=7 galaxy
//! ```
//!
//! Commands are read from stdin, one per line; see `/open`, `@<id> <text>`
//! and friends in the `Command` docs.

use std::time::Duration;

use clap::Parser;
use galaxy_app::{AppConfig, Command, Runtime, SystemEnv, WsDriver};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Galaxy chat client
#[derive(Parser, Debug)]
#[command(name = "galaxy")]
#[command(about = "Realtime sync client for Galaxy chat")]
#[command(version)]
struct Args {
    /// Server base URL; `wss://` is assumed when no ws scheme is given
    #[arg(short, long, env = "GALAXY_WS_URL", default_value = "ws://localhost:8080")]
    server: String,

    /// User id to sign in as
    #[arg(short, long, env = "GALAXY_USER_ID")]
    user: u64,

    /// Heartbeat interval in milliseconds, 0 disables the liveness monitor
    #[arg(long, default_value = "5000")]
    ping_ms: u64,

    /// Reconnect delay in milliseconds
    #[arg(long, default_value = "4000")]
    reconnect_ms: u64,

    /// Open the transcript with this user on start
    #[arg(long)]
    chat: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn config(&self) -> AppConfig {
        let mut config = AppConfig::new(self.server.clone(), self.user);
        config.reconnect_delay = Duration::from_millis(self.reconnect_ms);
        config.ping_interval = (self.ping_ms > 0).then(|| Duration::from_millis(self.ping_ms));
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let config = args.config();
    tracing::info!(server = %config.server_url, user = config.identity, "Galaxy client starting");

    let (commands_tx, commands_rx) = mpsc::channel(32);

    if let Some(friend) = args.chat {
        commands_tx.send(Command::OpenChat { friend }).await?;
    }

    let stdin_tx = commands_tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match line.parse::<Command>() {
                Ok(command) => {
                    if stdin_tx.send(command).await.is_err() {
                        break;
                    }
                },
                Err(galaxy_app::CommandError::Empty) => {},
                Err(err) => tracing::warn!(%err, "ignoring input"),
            }
        }
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = commands_tx.send(Command::Quit).await;
        }
    });

    let runtime = Runtime::new(WsDriver::new(SystemEnv::new()), config);
    runtime.run(commands_rx).await?;

    Ok(())
}
