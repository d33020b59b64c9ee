//! Users file DTOs.
//!
//! The users file seeds the in-memory user directory at startup. It is a JSON
//! array of records:
//!
//! ```json
//! [{"id": "5", "name": "Alice", "username": "alice", "avatarUrl": "https://..."}]
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{UserDisplay, UserId, ValueObjectError};

/// One user in the users file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecordDto {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserRecordDto {
    /// Validate the id and split the record into a directory entry.
    pub fn into_entry(self) -> Result<(UserId, UserDisplay), ValueObjectError> {
        let user_id = UserId::new(self.id)?;
        let display = UserDisplay {
            name: self.name,
            username: self.username,
            avatar_url: self.avatar_url,
        };
        Ok((user_id, display))
    }
}
