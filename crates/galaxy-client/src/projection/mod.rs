//! Derived view projections.
//!
//! Each view is a fold `(state, envelope) -> state` over the tags its kind
//! owns, plus an optional refresh request. Views never hold a connection;
//! the [`crate::Client`] routes frames to them and sends their requests.

mod chat_list;
mod new_contact;
mod profile;
mod roster;
mod transcript;

pub use chat_list::{ChatListView, ChatSummary, DEFAULT_GREETING};
use galaxy_proto::{Envelope, ProtocolError, Request, Tag};
pub use new_contact::NewContactView;
pub use profile::ProfileView;
pub use roster::{Contact, RosterView};
pub use transcript::{Message, TranscriptView};

use crate::ViewKind;

/// A fold over one view kind's tags.
pub trait Projection: Sized + Into<View> {
    /// Kind this view registers as.
    const KIND: ViewKind;

    /// Fold one routed frame into the view.
    ///
    /// Returns `true` when the visible state changed.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidPayload` if the payload has the wrong shape;
    ///   the view is left unchanged
    fn fold(&mut self, tag: Tag, envelope: &Envelope) -> Result<bool, ProtocolError>;

    /// Request that reloads this view from the server, if it has one.
    fn refresh_request(&self) -> Option<Request> {
        None
    }

    /// True while a request is awaiting its response tag.
    fn is_loading(&self) -> bool;

    /// Mark a request as in flight, or clear it.
    fn set_loading(&mut self, loading: bool);

    /// Borrow this view out of the type-erased slot.
    fn from_view(view: &View) -> Option<&Self>;
}

/// Type-erased attached view.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    /// Chat summary list
    ChatList(ChatListView),
    /// One conversation
    Transcript(TranscriptView),
    /// Contact roster
    Roster(RosterView),
    /// New-contact submission result
    NewContact(NewContactView),
    /// Own profile
    Profile(ProfileView),
}

impl View {
    /// Kind of the wrapped view.
    pub fn kind(&self) -> ViewKind {
        match self {
            Self::ChatList(_) => ViewKind::ChatList,
            Self::Transcript(_) => ViewKind::Transcript,
            Self::Roster(_) => ViewKind::Roster,
            Self::NewContact(_) => ViewKind::NewContact,
            Self::Profile(_) => ViewKind::Profile,
        }
    }

    pub(crate) fn fold(&mut self, tag: Tag, envelope: &Envelope) -> Result<bool, ProtocolError> {
        match self {
            Self::ChatList(view) => view.fold(tag, envelope),
            Self::Transcript(view) => view.fold(tag, envelope),
            Self::Roster(view) => view.fold(tag, envelope),
            Self::NewContact(view) => view.fold(tag, envelope),
            Self::Profile(view) => view.fold(tag, envelope),
        }
    }

    pub(crate) fn refresh_request(&self) -> Option<Request> {
        match self {
            Self::ChatList(view) => view.refresh_request(),
            Self::Transcript(view) => view.refresh_request(),
            Self::Roster(view) => view.refresh_request(),
            Self::NewContact(view) => view.refresh_request(),
            Self::Profile(view) => view.refresh_request(),
        }
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        match self {
            Self::ChatList(view) => view.set_loading(loading),
            Self::Transcript(view) => view.set_loading(loading),
            Self::Roster(view) => view.set_loading(loading),
            Self::NewContact(view) => view.set_loading(loading),
            Self::Profile(view) => view.set_loading(loading),
        }
    }

    /// True while the wrapped view awaits a response.
    pub fn is_loading(&self) -> bool {
        match self {
            Self::ChatList(view) => view.is_loading(),
            Self::Transcript(view) => view.is_loading(),
            Self::Roster(view) => view.is_loading(),
            Self::NewContact(view) => view.is_loading(),
            Self::Profile(view) => view.is_loading(),
        }
    }
}

macro_rules! impl_into_view {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for View {
                fn from(view: $ty) -> Self {
                    Self::$variant(view)
                }
            }
        )*
    };
}

impl_into_view! {
    ChatList => ChatListView,
    Transcript => TranscriptView,
    Roster => RosterView,
    NewContact => NewContactView,
    Profile => ProfileView,
}
