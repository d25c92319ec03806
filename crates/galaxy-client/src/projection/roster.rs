//! Contact roster.

use galaxy_proto::{
    Envelope, ProtocolError, Request, Tag, UserId,
    payloads::{UserListPayload, UserRecord},
};

use super::{Projection, View};
use crate::ViewKind;

/// A person in the roster. Id 0 marks a submission the server has not
/// acknowledged yet.
pub type Contact = UserRecord;

/// Contact roster.
///
/// An array payload replaces the roster; an object payload upserts one
/// contact by id, keeping its position. A `null` payload is an empty
/// snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterView {
    contacts: Vec<Contact>,
    loading: bool,
}

impl RosterView {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Contacts in server order.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Contact by id.
    pub fn get(&self, id: UserId) -> Option<&Contact> {
        self.contacts.iter().find(|contact| contact.id == id)
    }

    fn upsert(&mut self, contact: Contact) {
        let existing = (contact.id != 0)
            .then(|| self.contacts.iter_mut().find(|c| c.id == contact.id))
            .flatten();

        match existing {
            Some(slot) => *slot = contact,
            None => self.contacts.push(contact),
        }
    }
}

impl Projection for RosterView {
    const KIND: ViewKind = ViewKind::Roster;

    fn fold(&mut self, tag: Tag, envelope: &Envelope) -> Result<bool, ProtocolError> {
        if tag != Tag::UserList {
            return Ok(false);
        }

        let payload = if envelope.payload().is_null() {
            UserListPayload::Snapshot(Vec::new())
        } else {
            envelope.payload_as()?
        };

        match payload {
            UserListPayload::Snapshot(contacts) => {
                self.contacts = contacts;
                self.loading = false;
            },
            UserListPayload::Entry(contact) => self.upsert(contact),
        }
        Ok(true)
    }

    fn refresh_request(&self) -> Option<Request> {
        Some(Request::GetUserList)
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn from_view(view: &View) -> Option<&Self> {
        match view {
            View::Roster(view) => Some(view),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user_list(payload: serde_json::Value) -> Envelope {
        Envelope::new(Tag::UserList, payload)
    }

    fn ids(view: &RosterView) -> Vec<UserId> {
        view.contacts().iter().map(|c| c.id).collect()
    }

    #[test]
    fn array_replaces_roster() {
        let mut view = RosterView::new();
        view.fold(Tag::UserList, &user_list(json!([{"id": 1}, {"id": 2}]))).unwrap();
        view.fold(Tag::UserList, &user_list(json!([{"id": 9}]))).unwrap();
        assert_eq!(ids(&view), vec![9]);
    }

    #[test]
    fn object_upserts_in_place() {
        let mut view = RosterView::new();
        view.fold(Tag::UserList, &user_list(json!([{"id": 1}, {"id": 2}, {"id": 3}]))).unwrap();

        view.fold(Tag::UserList, &user_list(json!({"id": 2, "status": "ONLINE"}))).unwrap();
        assert_eq!(ids(&view), vec![1, 2, 3]);
        assert_eq!(view.get(2).map(|c| c.status.as_str()), Some("ONLINE"));

        view.fold(Tag::UserList, &user_list(json!({"id": 4, "firstName": "Nova"}))).unwrap();
        assert_eq!(ids(&view), vec![1, 2, 3, 4]);
    }

    #[test]
    fn pending_entries_never_merge() {
        let mut view = RosterView::new();
        view.fold(Tag::UserList, &user_list(json!({"id": 0, "firstName": "A"}))).unwrap();
        view.fold(Tag::UserList, &user_list(json!({"id": 0, "firstName": "B"}))).unwrap();
        assert_eq!(view.contacts().len(), 2);
    }

    #[test]
    fn null_payload_is_an_empty_snapshot() {
        let mut view = RosterView::new();
        view.fold(Tag::UserList, &user_list(json!([{"id": 1}]))).unwrap();
        view.set_loading(true);

        assert!(view.fold(Tag::UserList, &user_list(json!(null))).unwrap());
        assert!(view.contacts().is_empty());
        assert!(!view.is_loading());
    }
}
