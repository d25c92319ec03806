use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::UserId;

/// A user as the server describes it. Used for contacts, the roster and the
/// signed-in profile.
///
/// `id` is 0 for a contact that has not been saved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Server-assigned id
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: UserId,
    /// Given name
    #[serde(default, deserialize_with = "null_as_default")]
    pub first_name: String,
    /// Family name
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_name: String,
    /// Country calling code, e.g. `+94`
    #[serde(default, deserialize_with = "null_as_default")]
    pub country_code: String,
    /// Phone number without the calling code
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact_no: String,
    /// Avatar location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Free-text presence status such as `ONLINE` or `ACTIVE`
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    /// Creation timestamp, advisory
    #[serde(default, deserialize_with = "null_as_default")]
    pub created_at: String,
    /// Last update timestamp, advisory
    #[serde(default, deserialize_with = "null_as_default")]
    pub updated_at: String,
}

impl UserRecord {
    /// `first last`, trimmed.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// `user_list` payload: a full roster or a single changed entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UserListPayload {
    /// Complete roster
    Snapshot(Vec<UserRecord>),
    /// One added or updated entry
    Entry(UserRecord),
}
