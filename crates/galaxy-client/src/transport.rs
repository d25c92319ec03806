//! WebSocket transport for the client.
//!
//! [`open_link`] runs one link in a background task and reports everything
//! that happens on it as [`ClientEvent`]s tagged with the link id. Protocol
//! logic stays in the Sans-IO [`crate::Client`]; this layer only moves text.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::{ClientEvent, LinkId};

/// Outbound queue depth per link.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Time a stopped link gets to send its Close frame before it is aborted.
pub const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Dial or handshake failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Read or write failed on an open link.
    #[error("stream error: {0}")]
    Stream(String),

    /// Link task is gone.
    #[error("link closed")]
    Closed,

    /// Outbound queue is full; the frame was not queued.
    #[error("outbound queue full")]
    Full,
}

/// Handle to a running link task.
///
/// Dropping the handle closes the outbound queue, which makes the task send a
/// Close frame and finish.
pub struct LinkHandle {
    link: LinkId,
    to_server: mpsc::Sender<String>,
    abort_handle: tokio::task::AbortHandle,
}

impl LinkHandle {
    /// Link this handle drives.
    pub fn link(&self) -> LinkId {
        self.link
    }

    /// Queue a text frame without waiting.
    ///
    /// # Errors
    ///
    /// - `TransportError::Full` if the outbound queue has no room
    /// - `TransportError::Closed` if the link task has ended
    pub fn send(&self, text: String) -> Result<(), TransportError> {
        self.to_server.try_send(text).map_err(|err| match err {
            TrySendError::Full(_) => TransportError::Full,
            TrySendError::Closed(_) => TransportError::Closed,
        })
    }

    /// Close the link.
    ///
    /// The task sends a Close frame and reports `LinkClosed`. A task that has
    /// not finished within [`CLOSE_GRACE`] is aborted.
    pub fn stop(self) {
        let Self { link, to_server, abort_handle } = self;
        drop(to_server);

        tokio::spawn(async move {
            tokio::time::sleep(CLOSE_GRACE).await;
            if !abort_handle.is_finished() {
                debug!(%link, "link did not close in time, aborting");
                abort_handle.abort();
            }
        });
    }
}

/// Dial `url` in a background task.
///
/// Returns immediately. The task reports `LinkOpened` once the handshake
/// completes, a `FrameReceived` per text frame, and exactly one of
/// `LinkClosed` or `LinkError` when the link ends.
pub fn open_link(link: LinkId, url: String, events: mpsc::Sender<ClientEvent>) -> LinkHandle {
    let (to_server, outbound) = mpsc::channel(OUTBOUND_CAPACITY);
    let task = tokio::spawn(run_link(link, url, outbound, events));

    LinkHandle { link, to_server, abort_handle: task.abort_handle() }
}

async fn run_link(
    link: LinkId,
    url: String,
    outbound: mpsc::Receiver<String>,
    events: mpsc::Sender<ClientEvent>,
) {
    let event = match drive(link, &url, outbound, &events).await {
        Ok(reason) => ClientEvent::LinkClosed { link, reason },
        Err(err) => {
            warn!(%link, %err, "link failed");
            ClientEvent::LinkError { link, reason: err.to_string() }
        },
    };

    // Receiver gone means the runtime is shutting down
    let _ = events.send(event).await;
}

/// Pump frames until either side closes. Returns the close reason.
async fn drive(
    link: LinkId,
    url: &str,
    mut outbound: mpsc::Receiver<String>,
    events: &mpsc::Sender<ClientEvent>,
) -> Result<String, TransportError> {
    let (stream, _) =
        connect_async(url).await.map_err(|e| TransportError::Connection(e.to_string()))?;
    debug!(%link, url, "link open");

    if events.send(ClientEvent::LinkOpened { link }).await.is_err() {
        return Ok("runtime stopped".to_string());
    }

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            text = outbound.recv() => {
                let Some(text) = text else {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok("closed locally".to_string());
                };
                write
                    .send(Message::Text(text))
                    .await
                    .map_err(|e| TransportError::Stream(e.to_string()))?;
            },
            message = read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        let event = ClientEvent::FrameReceived { link, text: text.to_string() };
                        if events.send(event).await.is_err() {
                            return Ok("runtime stopped".to_string());
                        }
                    },
                    Some(Ok(Message::Close(frame))) => {
                        return Ok(frame.map(|f| f.reason.to_string()).unwrap_or_default());
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = write.send(Message::Pong(payload)).await;
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(TransportError::Stream(e.to_string())),
                    None => return Ok(String::new()),
                }
            },
        }
    }
}
