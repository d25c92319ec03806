//! Envelope: the unit of wire exchange.
//!
//! Inbound and outbound frames use different layouts on the wire because the
//! existing server expects them that way:
//!
//! ```text
//! inbound   {"type": "friend_list", "payload": [...]}
//! outbound  {"type": "send_message", "toUserId": 42, "message": "hi", "userId": 7}
//! ```
//!
//! Outbound payload objects are flattened next to `type` and the sender's
//! identity is merged as `userId` at encode time. Callers never set it.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{
    Tag, UserId,
    errors::{ProtocolError, Result},
};

/// Largest frame accepted from the wire (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Key carrying the tag in both directions.
const TYPE_KEY: &str = "type";

/// Key carrying the inbound payload.
const PAYLOAD_KEY: &str = "payload";

/// Key carrying the sender identity on outbound frames.
const IDENTITY_KEY: &str = "userId";

/// A decoded frame.
///
/// Holds the raw tag rather than [`Tag`] so that frames with tags this build
/// does not know can still be decoded, logged and ignored.
///
/// # Invariants
///
/// - Immutable once constructed; there are no setters.
/// - `payload` is `Value::Null` when the frame carried none.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    tag: String,
    payload: Value,
}

impl Envelope {
    /// Build an envelope for a known tag.
    pub fn new(tag: Tag, payload: Value) -> Self {
        Self { tag: tag.as_str().to_string(), payload }
    }

    /// Tag as it appeared on the wire.
    pub fn raw_tag(&self) -> &str {
        &self.tag
    }

    /// Known tag, or `None` for tags outside the vocabulary.
    pub fn tag(&self) -> Option<Tag> {
        Tag::parse(&self.tag)
    }

    /// Untyped payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Decode the payload into a typed wire struct.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidPayload` if the payload has the wrong shape
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.payload).map_err(|e| ProtocolError::InvalidPayload {
            tag: self.tag.clone(),
            reason: e.to_string(),
        })
    }

    /// Decode an inbound `{type, payload}` frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooLarge` if `text` exceeds [`MAX_FRAME_SIZE`]
    /// - `ProtocolError::Malformed` if `text` is not a JSON object
    /// - `ProtocolError::MissingTag` if `type` is absent or not a string
    pub fn decode(text: &str) -> Result<Self> {
        if text.len() > MAX_FRAME_SIZE {
            return Err(ProtocolError::FrameTooLarge { size: text.len(), max: MAX_FRAME_SIZE });
        }

        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;

        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::Malformed("frame is not a JSON object".to_string()));
        };

        let tag = match fields.remove(TYPE_KEY) {
            Some(Value::String(tag)) if !tag.is_empty() => tag,
            _ => return Err(ProtocolError::MissingTag),
        };

        let payload = fields.remove(PAYLOAD_KEY).unwrap_or(Value::Null);

        Ok(Self { tag, payload })
    }

    /// Encode as an outbound frame sent by `identity`.
    ///
    /// Object payloads are flattened into the frame. Any other non-null
    /// payload is carried under `payload`. `type` and `userId` are written
    /// last so a payload can never override them.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Encode` if serialization fails
    pub fn encode(&self, identity: UserId) -> Result<String> {
        let mut frame = Map::new();

        match &self.payload {
            Value::Object(fields) => {
                for (key, value) in fields {
                    frame.insert(key.clone(), value.clone());
                }
            },
            Value::Null => {},
            other => {
                frame.insert(PAYLOAD_KEY.to_string(), other.clone());
            },
        }

        frame.insert(TYPE_KEY.to_string(), Value::String(self.tag.clone()));
        frame.insert(IDENTITY_KEY.to_string(), Value::from(identity));

        serde_json::to_string(&Value::Object(frame)).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}
