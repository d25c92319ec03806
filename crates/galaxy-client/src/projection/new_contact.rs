//! New-contact submission result.

use galaxy_proto::{Envelope, ProtocolError, Tag};
use serde_json::Value;

use super::{Projection, View};
use crate::ViewKind;

/// Latest server response to a contact submission, stored verbatim.
///
/// Never touches the roster; roster changes arrive as `user_list` frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContactView {
    response: Option<String>,
    loading: bool,
}

impl NewContactView {
    /// No response yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest response text.
    pub fn response_text(&self) -> Option<&str> {
        self.response.as_deref()
    }
}

impl Projection for NewContactView {
    const KIND: ViewKind = ViewKind::NewContact;

    fn fold(&mut self, tag: Tag, envelope: &Envelope) -> Result<bool, ProtocolError> {
        if tag != Tag::NewContactResponseText {
            return Ok(false);
        }

        let text = match envelope.payload() {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };

        self.response = Some(text);
        self.loading = false;
        Ok(true)
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn from_view(view: &View) -> Option<&Self> {
        match view {
            View::NewContact(view) => Some(view),
            _ => None,
        }
    }
}
