//! Typed wire payloads.
//!
//! Each inbound tag has a payload struct here. Fields the server may omit or
//! send as `null` take their `Default` value instead of failing the whole
//! frame.

mod chat;
mod user;

pub use chat::{ChatRecord, DeliveryStatus, FriendEntry, OutgoingMessage, SingleChatPayload};
use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};
pub use user::{UserListPayload, UserRecord};

use crate::{
    Envelope, Tag, UserId,
    errors::{ProtocolError, Result},
};

/// Deserialize a field that may be absent or `null` into its default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a count that may be absent, `null`, negative, fractional or
/// sent as a string. Anything that is not a usable number reads as `None`;
/// out-of-range values clamp into `u32`.
pub(crate) fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|v| v.max(0).unsigned_abs()))
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.max(0.0) as u64)),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(count.map(|v| u32::try_from(v).unwrap_or(u32::MAX)))
}

/// Every outbound operation the client issues.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Fetch the chat summary list
    GetChatList,
    /// Deliver a message to a counterpart
    SendMessage(OutgoingMessage),
    /// Submit a new contact
    SaveNewContact(UserRecord),
    /// Heartbeat
    Ping,
    /// Fetch one conversation's history
    GetSingleChat {
        /// Counterpart whose history is requested
        friend_id: UserId,
    },
    /// Fetch the contact roster
    GetUserList,
    /// Fetch the signed-in user's profile
    GetUserProfile,
}

impl Request {
    /// Tag this request travels under.
    pub fn tag(&self) -> Tag {
        match self {
            Self::GetChatList => Tag::GetChatList,
            Self::SendMessage(_) => Tag::SendMessage,
            Self::SaveNewContact(_) => Tag::SaveNewContact,
            Self::Ping => Tag::Ping,
            Self::GetSingleChat { .. } => Tag::GetSingleChat,
            Self::GetUserList => Tag::GetUserList,
            Self::GetUserProfile => Tag::GetUserProfile,
        }
    }

    /// Build the outbound envelope.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if a payload fails to serialize
    pub fn into_envelope(self) -> Result<Envelope> {
        let tag = self.tag();
        let payload = match self {
            Self::SendMessage(message) => to_value(&message)?,
            Self::SaveNewContact(user) => json!({ "user": to_value(&user)? }),
            Self::GetSingleChat { friend_id } => json!({ "friendId": friend_id }),
            Self::GetChatList | Self::Ping | Self::GetUserList | Self::GetUserProfile => {
                json!({})
            },
        };
        Ok(Envelope::new(tag, payload))
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| ProtocolError::Encode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::MessageBody;

    fn wire(request: Request, identity: UserId) -> Value {
        let text = request.into_envelope().unwrap().encode(identity).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn empty_requests_carry_only_tag_and_identity() {
        assert_eq!(wire(Request::GetChatList, 3), json!({"type": "get_chat_list", "userId": 3}));
        assert_eq!(wire(Request::Ping, 3), json!({"type": "PING", "userId": 3}));
    }

    #[test]
    fn send_message_fills_missing_attachment_fields() {
        let message = OutgoingMessage::new(42, &MessageBody::Text("hello".to_string()));
        assert_eq!(
            wire(Request::SendMessage(message), 7),
            json!({
                "type": "send_message",
                "toUserId": 42,
                "message": "hello",
                "fileUrl": "",
                "fileType": "",
                "userId": 7,
            })
        );
    }

    #[test]
    fn save_new_contact_nests_user() {
        let user = UserRecord {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            country_code: "+44".to_string(),
            contact_no: "7700900000".to_string(),
            ..UserRecord::default()
        };
        let value = wire(Request::SaveNewContact(user), 9);

        assert_eq!(value["type"], json!("save_new_contact"));
        assert_eq!(value["userId"], json!(9));
        assert_eq!(value["user"]["firstName"], json!("Ada"));
        assert_eq!(value["user"]["id"], json!(0));
    }

    #[test]
    fn get_single_chat_names_friend() {
        assert_eq!(
            wire(Request::GetSingleChat { friend_id: 5 }, 1),
            json!({"type": "get_single_chat", "friendId": 5, "userId": 1})
        );
    }
}
