//! Frame tag vocabulary.

use std::fmt;

/// Every `type` tag the client sends or understands.
///
/// Tags not listed here parse to `None` and are ignored by every consumer,
/// which keeps older clients working when the server adds new pushes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    // Outbound requests
    /// Ask for the friend/chat summary list
    GetChatList,
    /// Send a chat message to a counterpart
    SendMessage,
    /// Submit a new contact
    SaveNewContact,
    /// Heartbeat
    Ping,
    /// Ask for one conversation's history
    GetSingleChat,
    /// Ask for the contact roster
    GetUserList,
    /// Ask for the signed-in user's profile
    GetUserProfile,

    // Inbound responses and pushes
    /// Chat summary list
    FriendList,
    /// Human-readable result of a contact submission
    NewContactResponseText,
    /// Heartbeat reply
    Pong,
    /// History batch for one conversation
    SingleChat,
    /// A single chat message push
    NewMessage,
    /// Roster snapshot or single roster entry
    UserList,
    /// Own profile record
    UserProfile,
}

impl Tag {
    /// All known tags, outbound first.
    pub const ALL: [Tag; 14] = [
        Tag::GetChatList,
        Tag::SendMessage,
        Tag::SaveNewContact,
        Tag::Ping,
        Tag::GetSingleChat,
        Tag::GetUserList,
        Tag::GetUserProfile,
        Tag::FriendList,
        Tag::NewContactResponseText,
        Tag::Pong,
        Tag::SingleChat,
        Tag::NewMessage,
        Tag::UserList,
        Tag::UserProfile,
    ];

    /// Wire spelling of the tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::GetChatList => "get_chat_list",
            Tag::SendMessage => "send_message",
            Tag::SaveNewContact => "save_new_contact",
            Tag::Ping => "PING",
            Tag::GetSingleChat => "get_single_chat",
            Tag::GetUserList => "get_user_list",
            Tag::GetUserProfile => "get_user_profile",
            Tag::FriendList => "friend_list",
            Tag::NewContactResponseText => "new_contact_response_text",
            Tag::Pong => "PONG",
            Tag::SingleChat => "single_chat",
            Tag::NewMessage => "new_message",
            Tag::UserList => "user_list",
            Tag::UserProfile => "user_profile",
        }
    }

    /// Parse a wire tag. Matching is exact and case-sensitive.
    pub fn parse(raw: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.as_str() == raw)
    }

    /// True for tags the server sends to us.
    pub fn is_inbound(self) -> bool {
        matches!(
            self,
            Tag::FriendList
                | Tag::NewContactResponseText
                | Tag::Pong
                | Tag::SingleChat
                | Tag::NewMessage
                | Tag::UserList
                | Tag::UserProfile
        )
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
