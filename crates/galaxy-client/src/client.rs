//! Client session state machine.
//!
//! The `Client` owns the signed-in identity's single [`Connection`], the
//! subscription registry and every attached view. All mutation goes through
//! it, so views never see a connection and consumers never see a socket.

use std::{
    collections::BTreeMap,
    fmt,
    marker::PhantomData,
    ops::Sub,
    time::{Duration, Instant},
};

use galaxy_core::{
    Connection, ConnectionAction, ConnectionConfig, LinkId, LivenessConfig, LivenessMonitor,
};
use galaxy_proto::{Request, UserId, payloads::OutgoingMessage};
use tracing::{debug, info, warn};

use crate::{
    ClientAction, ClientError, ClientEvent, Dispatcher, SubscriptionId, ViewKind,
    projection::{
        ChatListView, Contact, NewContactView, ProfileView, Projection, RosterView,
        TranscriptView, View,
    },
};

/// Client configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientConfig {
    /// Endpoint and reconnect policy
    pub connection: ConnectionConfig,
    /// Heartbeat policy used when a liveness monitor is mounted
    pub liveness: LivenessConfig,
}

/// Typed handle to an attached view.
pub struct ViewHandle<V> {
    id: SubscriptionId,
    _view: PhantomData<fn() -> V>,
}

impl<V> ViewHandle<V> {
    fn new(id: SubscriptionId) -> Self {
        Self { id, _view: PhantomData }
    }

    /// Subscription behind this handle. Matches `ClientAction::ViewUpdated`.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl<V> Clone for ViewHandle<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ViewHandle<V> {}

impl<V> PartialEq for ViewHandle<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for ViewHandle<V> {}

impl<V> fmt::Debug for ViewHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ViewHandle").field(&self.id).finish()
    }
}

/// Session state machine for one client process.
///
/// # Invariants
///
/// - At most one connection exists; signing in as someone else tears the old
///   one down first.
/// - Link ids only grow, across identities, so events from a replaced
///   connection's links are recognised as stale and dropped.
/// - Views and the liveness monitor belong to the client, not to a link, and
///   survive reconnects and identity changes.
pub struct Client<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Configuration
    config: ClientConfig,
    /// Current identity's connection
    connection: Option<Connection<I>>,
    /// First link id for the next connection
    next_link: LinkId,
    /// Tag-keyed routes
    dispatcher: Dispatcher,
    /// Attached views, in attach order
    views: BTreeMap<SubscriptionId, View>,
    /// Mounted liveness monitor and its subscription
    liveness: Option<(SubscriptionId, LivenessMonitor<I>)>,
}

impl<I> Client<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a signed-out client.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            connection: None,
            next_link: LinkId::FIRST,
            dispatcher: Dispatcher::new(),
            views: BTreeMap::new(),
            liveness: None,
        }
    }

    /// Configuration in effect.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Signed-in identity.
    pub fn identity(&self) -> Option<UserId> {
        self.connection.as_ref().map(Connection::identity)
    }

    /// Current connection, if signed in.
    pub fn connection(&self) -> Option<&Connection<I>> {
        self.connection.as_ref()
    }

    /// True while the link is open.
    pub fn is_connected(&self) -> bool {
        self.connection.as_ref().is_some_and(Connection::is_connected)
    }

    /// Subscription registry.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Mounted liveness monitor.
    pub fn liveness(&self) -> Option<&LivenessMonitor<I>> {
        self.liveness.as_ref().map(|(_, monitor)| monitor)
    }

    /// Start a session for `identity`.
    ///
    /// Any existing session for a different identity is torn down first, so
    /// its pending reconnect is cancelled before the new link is requested.
    /// Signing in again as the current identity does nothing.
    ///
    /// # Errors
    ///
    /// - `ClientError::Connection` if the new connection refuses to connect
    pub fn sign_in(&mut self, identity: UserId, now: I) -> Result<Vec<ClientAction>, ClientError> {
        if self.identity() == Some(identity) {
            debug!(identity, "already signed in");
            return Ok(Vec::new());
        }

        let mut actions = self.sign_out();

        let mut conn = Connection::new(identity, self.config.connection.clone(), self.next_link);
        let opened = conn.connect(now)?;
        self.next_link = conn.next_link();
        self.connection = Some(conn);

        info!(identity, "signed in");
        actions.extend(opened.into_iter().map(ClientAction::from));
        Ok(actions)
    }

    /// End the current session.
    ///
    /// Views stay attached but receive nothing until the next sign-in.
    pub fn sign_out(&mut self) -> Vec<ClientAction> {
        let Some(mut conn) = self.connection.take() else {
            return Vec::new();
        };

        let was_connected = conn.is_connected();
        self.next_link = conn.next_link();

        let mut actions = map_actions(conn.teardown());
        self.link_down();
        if was_connected {
            actions.push(ClientAction::ConnectivityChanged { connected: false });
        }

        info!(identity = conn.identity(), "signed out");
        actions
    }

    /// Process an event and return resulting actions.
    pub fn handle(&mut self, event: ClientEvent, now: I) -> Vec<ClientAction> {
        match event {
            ClientEvent::LinkOpened { link } => self.handle_open(link, now),
            ClientEvent::LinkClosed { link, reason } => self.handle_lost(link, now, &reason, false),
            ClientEvent::LinkError { link, reason } => self.handle_lost(link, now, &reason, true),
            ClientEvent::FrameReceived { link, text } => self.handle_frame(link, &text, now),
            ClientEvent::Tick => self.handle_tick(now),
        }
    }

    fn handle_open(&mut self, link: LinkId, now: I) -> Vec<ClientAction> {
        let Some(conn) = self.connection.as_mut() else {
            debug!(%link, "open while signed out");
            return Vec::new();
        };

        let was_connected = conn.is_connected();
        let mut actions = map_actions(conn.handle_open(link, now));
        if was_connected || !conn.is_connected() {
            return actions;
        }

        actions.push(ClientAction::ConnectivityChanged { connected: true });
        if let Some((_, monitor)) = &mut self.liveness {
            monitor.arm(now);
        }
        actions.extend(self.refresh_all(now));
        actions
    }

    fn handle_lost(&mut self, link: LinkId, now: I, reason: &str, error: bool) -> Vec<ClientAction> {
        let Some(conn) = self.connection.as_mut() else {
            debug!(%link, "link event while signed out");
            return Vec::new();
        };

        let was_connected = conn.is_connected();
        let mut actions = if error {
            map_actions(conn.handle_error(link, now, reason))
        } else {
            map_actions(conn.handle_close(link, now, reason))
        };

        if was_connected && !conn.is_connected() {
            self.link_down();
            actions.push(ClientAction::ConnectivityChanged { connected: false });
        }
        actions
    }

    /// Stop timers and loading indicators tied to the dropped link.
    fn link_down(&mut self) {
        if let Some((_, monitor)) = &mut self.liveness {
            monitor.disarm();
        }
        for view in self.views.values_mut() {
            view.set_loading(false);
        }
    }

    fn handle_frame(&mut self, link: LinkId, text: &str, now: I) -> Vec<ClientAction> {
        let Some(conn) = self.connection.as_mut() else {
            return Vec::new();
        };

        if !conn.is_current(link) {
            debug!(%link, "dropping frame from stale link");
            return Vec::new();
        }
        conn.record_activity(now);

        let Some((tag, envelope)) = self.dispatcher.decode(text) else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        for id in self.dispatcher.route(tag) {
            if let Some((liveness_id, monitor)) = &mut self.liveness {
                if liveness_id == id {
                    monitor.handle_pong();
                    continue;
                }
            }

            let Some(view) = self.views.get_mut(id) else {
                continue;
            };

            match view.fold(tag, &envelope) {
                Ok(true) => actions.push(ClientAction::ViewUpdated { view: *id }),
                Ok(false) => {},
                Err(err) => warn!(%tag, view = %id, %err, "dropping frame"),
            }
        }
        actions
    }

    fn handle_tick(&mut self, now: I) -> Vec<ClientAction> {
        let Some(conn) = self.connection.as_mut() else {
            return Vec::new();
        };

        let mut actions = map_actions(conn.tick(now));
        if !conn.is_connected() {
            return actions;
        }

        let ping = self.liveness.as_mut().and_then(|(_, monitor)| monitor.tick(now));
        if let Some(ping) = ping {
            actions.extend(self.transmit(ping, now));
        }
        actions
    }

    /// Attach a view and return its handle.
    ///
    /// A view with a refresh request issues it right away when connected; it
    /// is re-issued every time the link comes back.
    pub fn attach<V: Projection>(&mut self, view: V, now: I) -> (ViewHandle<V>, Vec<ClientAction>) {
        let id = self.dispatcher.attach(V::KIND);
        let request = view.refresh_request();
        self.views.insert(id, view.into());

        let actions = match request {
            Some(request) if self.is_connected() => self.issue_refresh(id, request, now),
            _ => Vec::new(),
        };
        (ViewHandle::new(id), actions)
    }

    /// Attach a chat summary list.
    pub fn attach_chat_list(&mut self, now: I) -> (ViewHandle<ChatListView>, Vec<ClientAction>) {
        self.attach(ChatListView::new(), now)
    }

    /// Attach a transcript scoped to `counterpart`.
    pub fn attach_transcript(
        &mut self,
        counterpart: UserId,
        now: I,
    ) -> (ViewHandle<TranscriptView>, Vec<ClientAction>) {
        self.attach(TranscriptView::new(counterpart), now)
    }

    /// Attach the contact roster.
    pub fn attach_roster(&mut self, now: I) -> (ViewHandle<RosterView>, Vec<ClientAction>) {
        self.attach(RosterView::new(), now)
    }

    /// Attach a new-contact result view.
    pub fn attach_new_contact(&mut self, now: I) -> (ViewHandle<NewContactView>, Vec<ClientAction>) {
        self.attach(NewContactView::new(), now)
    }

    /// Attach the own-profile view.
    pub fn attach_profile(&mut self, now: I) -> (ViewHandle<ProfileView>, Vec<ClientAction>) {
        self.attach(ProfileView::new(), now)
    }

    /// Detach a view. Returns `false` if it was already detached.
    pub fn detach<V>(&mut self, handle: &ViewHandle<V>) -> bool {
        self.views.remove(&handle.id);
        self.dispatcher.detach(handle.id)
    }

    /// Borrow an attached view.
    pub fn view<V: Projection>(&self, handle: &ViewHandle<V>) -> Option<&V> {
        self.views.get(&handle.id).and_then(V::from_view)
    }

    /// Borrow an attached view by subscription id.
    pub fn view_by_id(&self, id: SubscriptionId) -> Option<&View> {
        self.views.get(&id)
    }

    /// Re-issue a view's refresh request.
    ///
    /// Dropped with a warning while disconnected, like any other send.
    ///
    /// # Errors
    ///
    /// - `ClientError::UnknownView` if the handle was detached
    pub fn refresh<V: Projection>(
        &mut self,
        handle: &ViewHandle<V>,
        now: I,
    ) -> Result<Vec<ClientAction>, ClientError> {
        let request = self
            .view(handle)
            .ok_or(ClientError::UnknownView(handle.id))?
            .refresh_request();

        Ok(match request {
            Some(request) => self.issue_refresh(handle.id, request, now),
            None => Vec::new(),
        })
    }

    /// Send a chat message.
    ///
    /// No view changes; the transcript shows the message once the server
    /// echoes it back.
    pub fn send_message(&mut self, message: OutgoingMessage, now: I) -> Vec<ClientAction> {
        self.transmit(Request::SendMessage(message), now)
    }

    /// Submit a new contact.
    ///
    /// Attached new-contact views report loading until the server answers.
    pub fn save_new_contact(&mut self, contact: Contact, now: I) -> Vec<ClientAction> {
        let actions = self.transmit(Request::SaveNewContact(contact), now);
        if !actions.is_empty() {
            for view in self.views.values_mut() {
                if let View::NewContact(view) = view {
                    view.set_loading(true);
                }
            }
        }
        actions
    }

    /// Start pinging every `interval` while connected.
    ///
    /// Mounting twice keeps the first monitor.
    pub fn mount_liveness(&mut self, interval: Duration, now: I) {
        if self.liveness.is_some() {
            debug!("liveness already mounted");
            return;
        }

        let id = self.dispatcher.attach(ViewKind::Liveness);
        let mut monitor =
            LivenessMonitor::new(LivenessConfig { interval, ..self.config.liveness });
        if self.is_connected() {
            monitor.arm(now);
        }
        self.liveness = Some((id, monitor));
    }

    /// Stop pinging. Returns `false` if nothing was mounted.
    pub fn unmount_liveness(&mut self) -> bool {
        let Some((id, mut monitor)) = self.liveness.take() else {
            return false;
        };
        monitor.disarm();
        self.dispatcher.detach(id);
        true
    }

    /// Re-issue every attached view's refresh request, once per distinct
    /// request.
    fn refresh_all(&mut self, now: I) -> Vec<ClientAction> {
        let pending: Vec<(SubscriptionId, Request)> = self
            .views
            .iter()
            .filter_map(|(id, view)| view.refresh_request().map(|request| (*id, request)))
            .collect();

        let mut sent: Vec<Request> = Vec::new();
        let mut actions = Vec::new();
        for (id, request) in pending {
            if sent.contains(&request) {
                if let Some(view) = self.views.get_mut(&id) {
                    view.set_loading(true);
                }
                continue;
            }

            let issued = self.issue_refresh(id, request.clone(), now);
            if !issued.is_empty() {
                sent.push(request);
            }
            actions.extend(issued);
        }
        actions
    }

    fn issue_refresh(&mut self, id: SubscriptionId, request: Request, now: I) -> Vec<ClientAction> {
        let actions = self.transmit(request, now);
        if !actions.is_empty() {
            if let Some(view) = self.views.get_mut(&id) {
                view.set_loading(true);
            }
        }
        actions
    }

    fn transmit(&mut self, request: Request, now: I) -> Vec<ClientAction> {
        let tag = request.tag();
        let Some(conn) = self.connection.as_mut() else {
            warn!(%tag, "not signed in, dropping request");
            return Vec::new();
        };

        match request.into_envelope() {
            Ok(envelope) => map_actions(conn.send(&envelope, now)),
            Err(err) => {
                warn!(%tag, %err, "dropping unencodable request");
                Vec::new()
            },
        }
    }
}

fn map_actions(actions: Vec<ConnectionAction>) -> Vec<ClientAction> {
    actions.into_iter().map(ClientAction::from).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn frame_count(actions: &[ClientAction]) -> usize {
        actions.iter().filter(|a| matches!(a, ClientAction::SendText { .. })).count()
    }

    #[test]
    fn sign_in_opens_first_link() {
        let t0 = Instant::now();
        let mut client: Client = Client::new(ClientConfig::default());

        let actions = client.sign_in(7, t0).unwrap();
        assert!(matches!(
            actions.as_slice(),
            [ClientAction::OpenLink { link, .. }] if *link == LinkId::FIRST
        ));
        assert_eq!(client.identity(), Some(7));
        assert!(!client.is_connected());
    }

    #[test]
    fn signing_in_twice_as_same_identity_is_noop() {
        let t0 = Instant::now();
        let mut client: Client = Client::new(ClientConfig::default());
        client.sign_in(7, t0).unwrap();

        assert!(client.sign_in(7, t0).unwrap().is_empty());
    }

    #[test]
    fn attach_while_disconnected_defers_refresh() {
        let t0 = Instant::now();
        let mut client: Client = Client::new(ClientConfig::default());
        client.sign_in(7, t0).unwrap();

        let (handle, actions) = client.attach_chat_list(t0);
        assert!(actions.is_empty());
        assert!(!client.view(&handle).unwrap().is_loading());

        let actions = client.handle(ClientEvent::LinkOpened { link: LinkId::FIRST }, t0);
        assert_eq!(frame_count(&actions), 1);
        assert!(client.view(&handle).unwrap().is_loading());
    }

    #[test]
    fn identical_refreshes_are_sent_once() {
        let t0 = Instant::now();
        let mut client: Client = Client::new(ClientConfig::default());
        client.sign_in(7, t0).unwrap();
        let (a, _) = client.attach_chat_list(t0);
        let (b, _) = client.attach_chat_list(t0);

        let actions = client.handle(ClientEvent::LinkOpened { link: LinkId::FIRST }, t0);
        assert_eq!(frame_count(&actions), 1);
        assert!(client.view(&a).unwrap().is_loading());
        assert!(client.view(&b).unwrap().is_loading());
    }

    #[test]
    fn detached_handle_cannot_refresh() {
        let t0 = Instant::now();
        let mut client: Client = Client::new(ClientConfig::default());
        let (handle, _) = client.attach_roster(t0);

        assert!(client.detach(&handle));
        assert!(!client.detach(&handle));
        assert_eq!(client.refresh(&handle, t0), Err(ClientError::UnknownView(handle.id())));
        assert!(client.view(&handle).is_none());
    }

    #[test]
    fn liveness_mounts_once() {
        let t0 = Instant::now();
        let mut client: Client = Client::new(ClientConfig::default());

        client.mount_liveness(Duration::from_secs(5), t0);
        client.mount_liveness(Duration::from_secs(1), t0);
        assert_eq!(client.liveness().map(|m| m.config().interval), Some(Duration::from_secs(5)));

        assert!(client.unmount_liveness());
        assert!(!client.unmount_liveness());
        assert!(client.dispatcher().is_empty());
    }
}
