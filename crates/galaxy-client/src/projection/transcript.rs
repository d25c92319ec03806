//! Single-conversation transcript.

use std::collections::HashSet;

use galaxy_proto::{
    Envelope, MessageBody, ProtocolError, Request, Tag, UserId,
    payloads::{ChatRecord, DeliveryStatus, SingleChatPayload},
};
use tracing::debug;

use super::{Contact, Projection, View};
use crate::ViewKind;

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Server-assigned id, 0 if the server sent none
    pub id: u64,
    /// Sender
    pub sender: UserId,
    /// Recipient
    pub recipient: UserId,
    /// Decoded body
    pub body: MessageBody,
    /// Delivery state
    pub status: DeliveryStatus,
    /// Creation timestamp, advisory
    pub created_at: String,
}

impl From<ChatRecord> for Message {
    fn from(record: ChatRecord) -> Self {
        Self {
            id: record.id,
            sender: record.from.id,
            recipient: record.to.id,
            body: MessageBody::decode(&record.message),
            status: DeliveryStatus::parse(&record.status),
            created_at: record.created_at,
        }
    }
}

/// Messages exchanged with one counterpart, in arrival order.
///
/// # Invariants
///
/// - Append-only: a fold never mutates or removes an existing message.
/// - Arrival order; timestamps are never used for ordering.
/// - A message with a non-zero id appears at most once, so a history batch
///   re-fetched after reconnect does not duplicate what is already shown.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptView {
    counterpart: UserId,
    friend: Option<Contact>,
    messages: Vec<Message>,
    seen: HashSet<u64>,
    loading: bool,
}

impl TranscriptView {
    /// Empty transcript with `counterpart`.
    pub fn new(counterpart: UserId) -> Self {
        Self {
            counterpart,
            friend: None,
            messages: Vec::new(),
            seen: HashSet::new(),
            loading: false,
        }
    }

    /// Counterpart this transcript is scoped to.
    pub fn counterpart(&self) -> UserId {
        self.counterpart
    }

    /// Counterpart's record, once the server sent one.
    pub fn friend(&self) -> Option<&Contact> {
        self.friend.as_ref()
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when no message arrived yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn append(&mut self, record: ChatRecord) -> bool {
        if record.id != 0 && !self.seen.insert(record.id) {
            debug!(id = record.id, counterpart = self.counterpart, "skipping duplicate message");
            return false;
        }
        self.messages.push(Message::from(record));
        true
    }

    fn fold_history(&mut self, envelope: &Envelope) -> Result<bool, ProtocolError> {
        let payload: SingleChatPayload = if envelope.payload().is_null() {
            SingleChatPayload::Messages(Vec::new())
        } else {
            envelope.payload_as()?
        };
        let (friend, records) = payload.into_parts();

        let mut changed = false;
        let mut ours = false;

        if let Some(friend) = friend {
            if friend.id != self.counterpart {
                return Ok(false);
            }
            ours = true;
            if self.friend.as_ref() != Some(&friend) {
                self.friend = Some(friend);
                changed = true;
            }
        }

        for record in records {
            if record.involves(self.counterpart) {
                ours = true;
                changed |= self.append(record);
            }
        }

        if ours && self.loading {
            self.loading = false;
            changed = true;
        }
        Ok(changed)
    }
}

impl Projection for TranscriptView {
    const KIND: ViewKind = ViewKind::Transcript;

    fn fold(&mut self, tag: Tag, envelope: &Envelope) -> Result<bool, ProtocolError> {
        match tag {
            Tag::SingleChat => self.fold_history(envelope),
            Tag::NewMessage => {
                if envelope.payload().is_null() {
                    return Ok(false);
                }
                let record: ChatRecord = envelope.payload_as()?;
                if !record.involves(self.counterpart) {
                    return Ok(false);
                }
                Ok(self.append(record))
            },
            _ => Ok(false),
        }
    }

    fn refresh_request(&self) -> Option<Request> {
        Some(Request::GetSingleChat { friend_id: self.counterpart })
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn from_view(view: &View) -> Option<&Self> {
        match view {
            View::Transcript(view) => Some(view),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn chat(id: u64, from: UserId, to: UserId, message: &str) -> Value {
        json!({"id": id, "from": {"id": from}, "to": {"id": to}, "message": message})
    }

    fn push(view: &mut TranscriptView, record: Value) -> bool {
        view.fold(Tag::NewMessage, &Envelope::new(Tag::NewMessage, record)).unwrap()
    }

    #[test]
    fn keeps_arrival_order_not_timestamp_order() {
        let mut view = TranscriptView::new(2);
        push(&mut view, json!({"id": 1, "from": {"id": 2}, "to": {"id": 1}, "createdAt": "2025-02-01"}));
        push(&mut view, json!({"id": 2, "from": {"id": 1}, "to": {"id": 2}, "createdAt": "2024-01-01"}));

        let ids: Vec<_> = view.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn ignores_other_conversations() {
        let mut view = TranscriptView::new(2);
        assert!(!push(&mut view, chat(1, 3, 1, "not for us")));
        assert!(view.is_empty());
    }

    #[test]
    fn decodes_attachment_bodies() {
        let mut view = TranscriptView::new(2);
        push(&mut view, chat(1, 2, 1, "[IMAGE]:http://x/y.png"));

        assert_eq!(view.messages()[0].body, MessageBody::Image {
            uri: "http://x/y.png".to_string()
        });
    }

    #[test]
    fn missing_status_is_sent() {
        let mut view = TranscriptView::new(2);
        push(&mut view, chat(1, 2, 1, "hi"));
        push(&mut view, json!({"id": 2, "from": {"id": 2}, "to": {"id": 1}, "status": "READ"}));

        assert_eq!(view.messages()[0].status, DeliveryStatus::Sent);
        assert_eq!(view.messages()[1].status, DeliveryStatus::Read);
    }

    #[test]
    fn history_batch_appends_and_records_friend() {
        let mut view = TranscriptView::new(2);
        view.set_loading(true);
        let batch = json!({
            "friend": {"id": 2, "firstName": "Lyra", "status": "ONLINE"},
            "messages": [chat(1, 1, 2, "a"), chat(2, 2, 1, "b")],
        });

        let changed =
            view.fold(Tag::SingleChat, &Envelope::new(Tag::SingleChat, batch)).unwrap();

        assert!(changed);
        assert!(!view.is_loading());
        assert_eq!(view.len(), 2);
        assert_eq!(view.friend().map(|f| f.first_name.as_str()), Some("Lyra"));
    }

    #[test]
    fn history_for_another_friend_is_ignored() {
        let mut view = TranscriptView::new(2);
        view.set_loading(true);
        let batch = json!({"friend": {"id": 5}, "messages": [chat(1, 5, 1, "x")]});

        let changed =
            view.fold(Tag::SingleChat, &Envelope::new(Tag::SingleChat, batch)).unwrap();

        assert!(!changed);
        assert!(view.is_loading());
        assert!(view.is_empty());
    }

    #[test]
    fn refetched_history_does_not_duplicate() {
        let mut view = TranscriptView::new(2);
        let batch = json!([chat(1, 1, 2, "a"), chat(2, 2, 1, "b")]);
        let env = Envelope::new(Tag::SingleChat, batch);

        view.fold(Tag::SingleChat, &env).unwrap();
        push(&mut view, chat(3, 2, 1, "c"));
        view.fold(Tag::SingleChat, &env).unwrap();

        let ids: Vec<_> = view.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn null_push_is_ignored() {
        let mut view = TranscriptView::new(2);
        assert!(!push(&mut view, json!(null)));
        assert!(view.is_empty());
    }

    #[test]
    fn empty_history_without_friend_keeps_loading() {
        let mut view = TranscriptView::new(2);
        view.set_loading(true);

        for payload in [json!([]), json!(null), json!({"messages": []})] {
            let changed =
                view.fold(Tag::SingleChat, &Envelope::new(Tag::SingleChat, payload)).unwrap();
            assert!(!changed);
        }
        assert!(view.is_loading());

        let answered = json!({"friend": {"id": 2}, "messages": []});
        view.fold(Tag::SingleChat, &Envelope::new(Tag::SingleChat, answered)).unwrap();
        assert!(!view.is_loading());
    }

    #[test]
    fn refresh_names_counterpart() {
        assert_eq!(
            TranscriptView::new(9).refresh_request(),
            Some(Request::GetSingleChat { friend_id: 9 })
        );
    }
}
