//! Chat summary list.

use galaxy_proto::{
    Envelope, MessageBody, ProtocolError, Request, Tag, UserId, payloads::FriendEntry,
};

use super::{Projection, View};
use crate::ViewKind;

/// Preview shown for a conversation with no last message.
pub const DEFAULT_GREETING: &str = "🌌 Hey there! I am using Galaxy Chat";

/// One conversation in the chat list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    /// Counterpart id
    pub friend_id: UserId,
    /// Counterpart display name
    pub friend_name: String,
    /// First word of the display name
    pub friend_first_name: String,
    /// Preview of the latest message; attachments show as a label
    pub last_message: String,
    /// Timestamp of the latest message, advisory
    pub last_time_stamp: String,
    /// Unread messages
    pub unread_count: u32,
    /// Counterpart avatar location
    pub profile_image: Option<String>,
}

impl From<FriendEntry> for ChatSummary {
    fn from(entry: FriendEntry) -> Self {
        let friend_first_name =
            entry.friend_name.split_whitespace().next().unwrap_or_default().to_string();
        let last_message = entry.last_message.filter(|text| !text.is_empty()).map_or_else(
            || DEFAULT_GREETING.to_string(),
            |raw| MessageBody::decode(&raw).preview().to_string(),
        );

        Self {
            friend_id: entry.friend_id,
            friend_name: entry.friend_name,
            friend_first_name,
            last_message,
            last_time_stamp: entry.last_time_stamp,
            unread_count: entry.unread_count.unwrap_or(0),
            profile_image: entry.profile_image,
        }
    }
}

/// Chat summary list, replaced wholesale by every `friend_list` frame.
///
/// Order is the server's; the view never re-sorts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatListView {
    chats: Vec<ChatSummary>,
    loading: bool,
}

impl ChatListView {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Conversations in server order.
    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    /// Summary for one counterpart.
    pub fn get(&self, friend_id: UserId) -> Option<&ChatSummary> {
        self.chats.iter().find(|chat| chat.friend_id == friend_id)
    }

    /// Sum of unread counts.
    pub fn total_unread(&self) -> u64 {
        self.chats.iter().map(|chat| u64::from(chat.unread_count)).sum()
    }
}

impl Projection for ChatListView {
    const KIND: ViewKind = ViewKind::ChatList;

    fn fold(&mut self, tag: Tag, envelope: &Envelope) -> Result<bool, ProtocolError> {
        if tag != Tag::FriendList {
            return Ok(false);
        }

        let entries: Vec<FriendEntry> = if envelope.payload().is_null() {
            Vec::new()
        } else {
            envelope.payload_as()?
        };

        self.chats = entries.into_iter().map(ChatSummary::from).collect();
        self.loading = false;
        Ok(true)
    }

    fn refresh_request(&self) -> Option<Request> {
        Some(Request::GetChatList)
    }

    fn is_loading(&self) -> bool {
        self.loading
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn from_view(view: &View) -> Option<&Self> {
        match view {
            View::ChatList(view) => Some(view),
            _ => None,
        }
    }
}
