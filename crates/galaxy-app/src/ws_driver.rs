//! WebSocket driver.
//!
//! Implements [`Driver`] with one [`transport::open_link`] task per link and
//! renders view updates as log lines.

use std::collections::HashMap;

use galaxy_client::{
    ClientEvent, LinkId, View,
    transport::{self, LinkHandle, TransportError},
};
use galaxy_core::Environment;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{Driver, SystemEnv};

/// Inbound event queue depth shared by all links.
const EVENT_CAPACITY: usize = 256;

/// WebSocket driver errors.
#[derive(Debug, Error)]
pub enum WsDriverError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Production driver over WebSocket links.
pub struct WsDriver {
    env: SystemEnv,
    links: HashMap<LinkId, LinkHandle>,
    events_tx: mpsc::Sender<ClientEvent>,
    events_rx: mpsc::Receiver<ClientEvent>,
}

impl WsDriver {
    /// Create a driver with no links.
    pub fn new(env: SystemEnv) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        Self { env, links: HashMap::new(), events_tx, events_rx }
    }
}

impl Driver for WsDriver {
    type Error = WsDriverError;
    type Instant = std::time::Instant;

    async fn poll_event(&mut self) -> Option<ClientEvent> {
        let event = self.events_rx.recv().await?;

        // Link tasks end after reporting close or error
        if let ClientEvent::LinkClosed { link, .. } | ClientEvent::LinkError { link, .. } = &event {
            self.links.remove(link);
        }
        Some(event)
    }

    fn open_link(&mut self, link: LinkId, url: String) -> Result<(), Self::Error> {
        debug!(%link, %url, "dialing");
        let handle = transport::open_link(link, url, self.events_tx.clone());
        if let Some(previous) = self.links.insert(link, handle) {
            previous.stop();
        }
        Ok(())
    }

    async fn send_text(&mut self, link: LinkId, text: String) -> Result<(), Self::Error> {
        let Some(handle) = self.links.get(&link) else {
            warn!(%link, "no such link, dropping frame");
            return Ok(());
        };

        // Sends are fire-and-forget; a dead link reports its own close event
        if let Err(err) = handle.send(text) {
            warn!(%link, %err, "dropping frame");
        }
        Ok(())
    }

    fn close_link(&mut self, link: LinkId, reason: &str) {
        if let Some(handle) = self.links.remove(&link) {
            debug!(%link, reason, "closing link");
            handle.stop();
        }
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }

    fn render(&mut self, view: &View) -> Result<(), Self::Error> {
        match view {
            View::ChatList(list) => {
                info!(chats = list.chats().len(), unread = list.total_unread(), "chat list");
                for chat in list.chats() {
                    info!(
                        friend = chat.friend_id,
                        name = %chat.friend_name,
                        unread = chat.unread_count,
                        "  {}",
                        chat.last_message
                    );
                }
            },
            View::Transcript(transcript) => {
                if let Some(message) = transcript.messages().last() {
                    info!(
                        counterpart = transcript.counterpart(),
                        from = message.sender,
                        status = message.status.as_str(),
                        "{}",
                        message.body
                    );
                }
            },
            View::Roster(roster) => info!(contacts = roster.contacts().len(), "roster"),
            View::NewContact(result) => {
                info!(response = result.response_text().unwrap_or_default(), "new contact");
            },
            View::Profile(profile) => {
                if let Some(me) = profile.profile() {
                    info!(id = me.id, name = %me.display_name(), status = %me.status, "profile");
                }
            },
        }
        Ok(())
    }

    fn connectivity_changed(&mut self, connected: bool) {
        if connected {
            info!("online");
        } else {
            warn!("offline");
        }
    }

    fn stop(&mut self) {
        for (_, handle) in self.links.drain() {
            handle.stop();
        }
    }
}
