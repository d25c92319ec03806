//! Subscription dispatcher.
//!
//! One registry keyed by tag fans the single inbound frame stream out to the
//! attached views. Each tag has exactly one owning view kind; a view kind
//! registers only its own tags when attached, so a frame is never delivered
//! to two kinds.

use std::{collections::HashMap, fmt};

use galaxy_proto::{Envelope, Tag};
use tracing::{debug, warn};

/// Handle for one attached subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Kinds of subscriber, each owning a fixed set of tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    /// Chat summary list
    ChatList,
    /// One conversation's transcript
    Transcript,
    /// Contact roster
    Roster,
    /// New-contact submission result
    NewContact,
    /// Own profile
    Profile,
    /// Liveness monitor
    Liveness,
}

impl ViewKind {
    /// Inbound tags this kind folds.
    pub fn owned_tags(self) -> &'static [Tag] {
        match self {
            Self::ChatList => &[Tag::FriendList],
            Self::Transcript => &[Tag::SingleChat, Tag::NewMessage],
            Self::Roster => &[Tag::UserList],
            Self::NewContact => &[Tag::NewContactResponseText],
            Self::Profile => &[Tag::UserProfile],
            Self::Liveness => &[Tag::Pong],
        }
    }

    /// Kind that owns `tag`, if any.
    pub fn owner_of(tag: Tag) -> Option<Self> {
        [
            Self::ChatList,
            Self::Transcript,
            Self::Roster,
            Self::NewContact,
            Self::Profile,
            Self::Liveness,
        ]
        .into_iter()
        .find(|kind| kind.owned_tags().contains(&tag))
    }
}

/// Tag-keyed subscription registry.
///
/// # Invariants
///
/// - Every id in `routes` is in `kinds`, and every tag it is routed under is
///   owned by that id's kind.
/// - Within a route, ids appear once, in attach order.
#[derive(Debug, Default)]
pub struct Dispatcher {
    routes: HashMap<Tag, Vec<SubscriptionId>>,
    kinds: HashMap<SubscriptionId, ViewKind>,
    next_id: u64,
}

impl Dispatcher {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber of `kind` under its owned tags.
    pub fn attach(&mut self, kind: ViewKind) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);

        for tag in kind.owned_tags() {
            self.routes.entry(*tag).or_default().push(id);
        }
        self.kinds.insert(id, kind);

        debug!(%id, ?kind, "subscriber attached");
        id
    }

    /// Remove a subscriber from every route.
    ///
    /// Returns `false` if `id` was not attached. Detaching twice is harmless.
    pub fn detach(&mut self, id: SubscriptionId) -> bool {
        let Some(kind) = self.kinds.remove(&id) else {
            return false;
        };

        for tag in kind.owned_tags() {
            if let Some(route) = self.routes.get_mut(tag) {
                route.retain(|sub| *sub != id);
                if route.is_empty() {
                    self.routes.remove(tag);
                }
            }
        }

        debug!(%id, ?kind, "subscriber detached");
        true
    }

    /// Subscribers for `tag`, in attach order.
    pub fn route(&self, tag: Tag) -> &[SubscriptionId] {
        self.routes.get(&tag).map_or(&[], Vec::as_slice)
    }

    /// Kind of an attached subscriber.
    pub fn kind_of(&self, id: SubscriptionId) -> Option<ViewKind> {
        self.kinds.get(&id).copied()
    }

    /// True if `id` is attached.
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.kinds.contains_key(&id)
    }

    /// Number of attached subscribers.
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True when nothing is attached.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Decode an inbound frame and resolve its tag.
    ///
    /// Malformed frames are logged and dropped. Frames with unknown tags, or
    /// known tags nobody is subscribed to, are dropped quietly.
    pub fn decode(&self, text: &str) -> Option<(Tag, Envelope)> {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(%err, "dropping malformed frame");
                return None;
            },
        };

        let Some(tag) = envelope.tag() else {
            debug!(tag = envelope.raw_tag(), "ignoring unknown tag");
            return None;
        };

        if !tag.is_inbound() {
            debug!(%tag, "ignoring outbound tag echoed by server");
            return None;
        }

        if self.route(tag).is_empty() {
            debug!(%tag, "no subscribers");
            return None;
        }

        Some((tag, envelope))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn attach_registers_only_owned_tags() {
        let mut dispatcher = Dispatcher::new();
        let id = dispatcher.attach(ViewKind::Transcript);

        assert_eq!(dispatcher.route(Tag::SingleChat), &[id]);
        assert_eq!(dispatcher.route(Tag::NewMessage), &[id]);
        assert!(dispatcher.route(Tag::FriendList).is_empty());
    }

    #[test]
    fn routes_keep_attach_order() {
        let mut dispatcher = Dispatcher::new();
        let a = dispatcher.attach(ViewKind::ChatList);
        let b = dispatcher.attach(ViewKind::ChatList);
        let c = dispatcher.attach(ViewKind::ChatList);

        dispatcher.detach(b);
        assert_eq!(dispatcher.route(Tag::FriendList), &[a, c]);
    }

    #[test]
    fn detach_is_idempotent() {
        let mut dispatcher = Dispatcher::new();
        let id = dispatcher.attach(ViewKind::Roster);

        assert!(dispatcher.detach(id));
        assert!(!dispatcher.detach(id));
        assert!(dispatcher.route(Tag::UserList).is_empty());
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn every_inbound_tag_has_one_owner() {
        for tag in Tag::ALL {
            let owners = [
                ViewKind::ChatList,
                ViewKind::Transcript,
                ViewKind::Roster,
                ViewKind::NewContact,
                ViewKind::Profile,
                ViewKind::Liveness,
            ]
            .into_iter()
            .filter(|kind| kind.owned_tags().contains(&tag))
            .count();

            let expected = usize::from(tag.is_inbound());
            assert_eq!(owners, expected, "{tag}");
        }
    }

    #[test]
    fn decode_drops_malformed_and_unknown() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.attach(ViewKind::ChatList);

        assert!(dispatcher.decode("{").is_none());
        assert!(dispatcher.decode(r#"{"type":"typing","payload":{}}"#).is_none());
        assert!(dispatcher.decode(r#"{"type":"user_list","payload":[]}"#).is_none());

        let (tag, _) = dispatcher.decode(r#"{"type":"friend_list","payload":[]}"#).unwrap();
        assert_eq!(tag, Tag::FriendList);
    }
}
