//! Generic runtime for application orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Client`]: session state machine and views
//! - [`Driver`]: platform-specific I/O
//! - a stream of [`Command`]s from the consumer

use std::collections::HashMap;

use galaxy_client::{
    ChatListView, Client, ClientAction, ClientEvent, NewContactView, ProfileView, RosterView,
    TranscriptView, ViewHandle,
};
use galaxy_proto::{UserId, payloads::OutgoingMessage};
use tokio::{
    sync::mpsc,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{AppConfig, Command, Driver};

/// Views every session keeps attached.
struct StandingViews {
    chat_list: ViewHandle<ChatListView>,
    roster: ViewHandle<RosterView>,
    profile: ViewHandle<ProfileView>,
    new_contact: ViewHandle<NewContactView>,
}

/// Generic runtime over a [`Driver`].
pub struct Runtime<D: Driver> {
    driver: D,
    client: Client<D::Instant>,
    config: AppConfig,
    standing: Option<StandingViews>,
    transcripts: HashMap<UserId, ViewHandle<TranscriptView>>,
}

impl<D: Driver> Runtime<D> {
    /// Create a runtime. Nothing is dialed until [`Runtime::start`].
    pub fn new(driver: D, config: AppConfig) -> Self {
        let client = Client::new(config.client_config());
        Self { driver, client, config, standing: None, transcripts: HashMap::new() }
    }

    /// Session state.
    pub fn client(&self) -> &Client<D::Instant> {
        &self.client
    }

    /// Underlying driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Underlying driver, mutably.
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Chat summary list, once started.
    pub fn chat_list(&self) -> Option<&ChatListView> {
        self.standing.as_ref().and_then(|s| self.client.view(&s.chat_list))
    }

    /// Latest new-contact response, once started.
    pub fn new_contact(&self) -> Option<&NewContactView> {
        self.standing.as_ref().and_then(|s| self.client.view(&s.new_contact))
    }

    /// Transcript handle for `friend`, if open.
    pub fn transcript(&self, friend: UserId) -> Option<ViewHandle<TranscriptView>> {
        self.transcripts.get(&friend).copied()
    }

    /// Attach the standing views, mount liveness and sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver fails to start the first link.
    pub async fn start(&mut self) -> Result<(), D::Error> {
        let now = self.driver.now();

        if self.standing.is_none() {
            let (chat_list, _) = self.client.attach_chat_list(now);
            let (roster, _) = self.client.attach_roster(now);
            let (profile, _) = self.client.attach_profile(now);
            let (new_contact, _) = self.client.attach_new_contact(now);
            self.standing = Some(StandingViews { chat_list, roster, profile, new_contact });
        }

        if let Some(interval) = self.config.ping_interval {
            self.client.mount_liveness(interval, now);
        }

        self.sign_in(self.config.identity).await
    }

    /// Run until a `Quit` command, the command stream ends, or the driver
    /// runs dry.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Result<(), D::Error> {
        self.start().await?;

        let mut ticker = time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                event = self.driver.poll_event() => {
                    let Some(event) = event else { break };
                    self.handle_event(event).await?;
                },
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command).await? {
                        break;
                    }
                },
                _ = ticker.tick() => self.tick().await?,
            }
        }

        self.shutdown().await
    }

    /// Feed one link event to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn handle_event(&mut self, event: ClientEvent) -> Result<(), D::Error> {
        let now = self.driver.now();
        let actions = self.client.handle(event, now);
        self.execute(actions).await
    }

    /// Advance timers.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn tick(&mut self) -> Result<(), D::Error> {
        self.handle_event(ClientEvent::Tick).await
    }

    /// Apply one consumer command. Returns `true` if the runtime should quit.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn handle_command(&mut self, command: Command) -> Result<bool, D::Error> {
        let now = self.driver.now();

        let actions = match command {
            Command::Quit => return Ok(true),
            Command::Send { to, body } => {
                self.client.send_message(OutgoingMessage::new(to, &body), now)
            },
            Command::OpenChat { friend } => {
                if let Some(handle) = self.transcripts.get(&friend) {
                    self.client.refresh(handle, now).unwrap_or_default()
                } else {
                    let (handle, actions) = self.client.attach_transcript(friend, now);
                    self.transcripts.insert(friend, handle);
                    actions
                }
            },
            Command::CloseChat { friend } => {
                match self.transcripts.remove(&friend) {
                    Some(handle) => {
                        self.client.detach(&handle);
                    },
                    None => debug!(friend, "no open transcript"),
                }
                Vec::new()
            },
            Command::SaveContact(contact) => self.client.save_new_contact(contact, now),
            Command::Refresh => self.refresh_all(now),
            Command::SwitchUser(identity) => {
                self.sign_in(identity).await?;
                Vec::new()
            },
        };

        self.execute(actions).await?;
        Ok(false)
    }

    /// Sign out, close every link and stop the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn shutdown(&mut self) -> Result<(), D::Error> {
        let actions = self.client.sign_out();
        self.execute(actions).await?;
        self.client.unmount_liveness();
        self.driver.stop();
        info!("stopped");
        Ok(())
    }

    async fn sign_in(&mut self, identity: UserId) -> Result<(), D::Error> {
        let now = self.driver.now();
        match self.client.sign_in(identity, now) {
            Ok(actions) => self.execute(actions).await,
            Err(err) => {
                warn!(identity, %err, "sign-in failed");
                Ok(())
            },
        }
    }

    fn refresh_all(&mut self, now: D::Instant) -> Vec<ClientAction> {
        let mut actions = Vec::new();

        if let Some(standing) = &self.standing {
            actions.extend(self.client.refresh(&standing.chat_list, now).unwrap_or_default());
            actions.extend(self.client.refresh(&standing.roster, now).unwrap_or_default());
            actions.extend(self.client.refresh(&standing.profile, now).unwrap_or_default());
        }
        for handle in self.transcripts.values() {
            actions.extend(self.client.refresh(handle, now).unwrap_or_default());
        }
        actions
    }

    async fn execute(&mut self, actions: Vec<ClientAction>) -> Result<(), D::Error> {
        for action in actions {
            match action {
                ClientAction::OpenLink { link, url } => self.driver.open_link(link, url)?,
                ClientAction::SendText { link, text } => self.driver.send_text(link, text).await?,
                ClientAction::CloseLink { link, reason } => self.driver.close_link(link, &reason),
                ClientAction::ViewUpdated { view } => {
                    if let Some(view) = self.client.view_by_id(view) {
                        self.driver.render(view)?;
                    }
                },
                ClientAction::ConnectivityChanged { connected } => {
                    self.driver.connectivity_changed(connected);
                },
            }
        }
        Ok(())
    }
}
