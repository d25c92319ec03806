use serde::{Deserialize, Serialize};

use super::{UserRecord, lenient_count, null_as_default};
use crate::{MessageBody, UserId};

/// One row of the `friend_list` payload.
///
/// Optional fields stay optional here; the chat list projection decides what
/// an absent preview or unread count means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendEntry {
    /// Counterpart id
    #[serde(default, deserialize_with = "null_as_default")]
    pub friend_id: UserId,
    /// Counterpart display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub friend_name: String,
    /// Preview of the latest message
    #[serde(default)]
    pub last_message: Option<String>,
    /// Timestamp of the latest message, advisory
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_time_stamp: String,
    /// Number of unread messages
    #[serde(default, deserialize_with = "lenient_count")]
    pub unread_count: Option<u32>,
    /// Counterpart avatar location
    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Delivery state of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DeliveryStatus {
    /// Accepted by the server
    #[default]
    Sent,
    /// Delivered to the counterpart's device
    Delivered,
    /// Seen by the counterpart
    Read,
}

impl DeliveryStatus {
    /// Parse the wire spelling. Anything unrecognised, including an empty
    /// string, counts as `Sent`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "DELIVERED" => Self::Delivered,
            "READ" => Self::Read,
            _ => Self::Sent,
        }
    }

    /// Wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Delivered => "DELIVERED",
            Self::Read => "READ",
        }
    }
}

/// A chat message as stored by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    /// Server-assigned message id
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    /// Sender
    #[serde(default, deserialize_with = "null_as_default")]
    pub from: UserRecord,
    /// Recipient
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: UserRecord,
    /// Raw body, possibly carrying an attachment prefix
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Raw delivery status
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Creation timestamp, advisory
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

impl ChatRecord {
    /// True when `counterpart` sent or received this message.
    pub fn involves(&self, counterpart: UserId) -> bool {
        self.from.id == counterpart || self.to.id == counterpart
    }
}

/// `single_chat` payload.
///
/// Accepted as either a bare array of messages or `{friend, messages}`. The
/// array form is tried first so a one-element array is never read as a
/// positional struct.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SingleChatPayload {
    /// History without counterpart details
    Messages(Vec<ChatRecord>),
    /// History with the counterpart's record attached
    Thread {
        /// Counterpart, when the server includes it
        #[serde(default)]
        friend: Option<UserRecord>,
        /// Messages in server order
        #[serde(default)]
        messages: Vec<ChatRecord>,
    },
}

impl SingleChatPayload {
    /// Split into the optional counterpart and the message batch.
    pub fn into_parts(self) -> (Option<UserRecord>, Vec<ChatRecord>) {
        match self {
            Self::Thread { friend, messages } => (friend, messages),
            Self::Messages(messages) => (None, messages),
        }
    }
}

/// Body of a `send_message` request.
///
/// Attachment fields are always present on the wire, empty when unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingMessage {
    /// Recipient
    pub to_user_id: UserId,
    /// Encoded body
    pub message: String,
    /// Uploaded attachment location
    pub file_url: String,
    /// Attachment MIME type
    pub file_type: String,
}

impl OutgoingMessage {
    /// Message to `to` with no separate attachment reference.
    pub fn new(to: UserId, body: &MessageBody) -> Self {
        Self {
            to_user_id: to,
            message: body.encode(),
            file_url: String::new(),
            file_type: String::new(),
        }
    }

    /// Attach an uploaded file reference.
    pub fn with_attachment(mut self, file_url: Option<String>, file_type: Option<String>) -> Self {
        self.file_url = file_url.unwrap_or_default();
        self.file_type = file_type.unwrap_or_default();
        self
    }
}
