//! Own profile.

use galaxy_proto::{Envelope, ProtocolError, Request, Tag};

use super::{Contact, Projection, View};
use crate::ViewKind;

/// The signed-in user's own record, replaced wholesale on every
/// `user_profile` frame. A `null` payload answers the request but keeps the
/// last known record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileView {
    profile: Option<Contact>,
    loading: bool,
}

impl ProfileView {
    /// No profile yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest profile, once one arrived.
    pub fn profile(&self) -> Option<&Contact> {
        self.profile.as_ref()
    }
}

impl Projection for ProfileView {
    const KIND: ViewKind = ViewKind::Profile;

    fn fold(&mut self, tag: Tag, envelope: &Envelope) -> Result<bool, ProtocolError> {
        if tag != Tag::UserProfile {
            return Ok(false);
        }

        if envelope.payload().is_null() {
            let was_loading = std::mem::take(&mut self.loading);
            return Ok(was_loading);
        }

        self.profile = Some(envelope.payload_as()?);
        self.loading = false;
        Ok(true)
    }

    fn refresh_request(&self) -> Option<Request> {
        Some(Request::GetUserProfile)
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn from_view(view: &View) -> Option<&Self> {
        match view {
            View::Profile(view) => Some(view),
            _ => None,
        }
    }
}
