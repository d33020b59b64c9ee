//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

use super::error::ValueObjectError;

const MAX_ID_LEN: usize = 100;
const MAX_CONTENT_LEN: usize = 10000;

/// Joins the two participants of a [`ConversationId`]; never part of a [`UserId`].
pub const CONVERSATION_SEPARATOR: char = '_';

/// User identifier value object.
///
/// Resolved from a bearer credential; identifies the owner of live connections
/// and the target of notifications. A user id never contains
/// [`CONVERSATION_SEPARATOR`], so every [`ConversationId`] splits back into the
/// two ids it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new UserId.
    ///
    /// # Arguments
    ///
    /// * `id` - The user identifier string
    ///
    /// # Returns
    ///
    /// A Result containing the UserId or an error if validation fails
    pub fn new(id: String) -> Result<Self, ValueObjectError> {
        if id.is_empty() {
            return Err(ValueObjectError::UserIdEmpty);
        }
        let len = id.len();
        if len > MAX_ID_LEN {
            return Err(ValueObjectError::UserIdTooLong {
                max: MAX_ID_LEN,
                actual: len,
            });
        }
        if id.contains(CONVERSATION_SEPARATOR) {
            return Err(ValueObjectError::UserIdContainsSeparator(id));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Defines a UUID-backed identifier value object.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create from an already generated UUID.
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid.to_string())
            }

            /// Get the inner string value.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifier of one live duplex connection (one socket, one device/tab).
    ConnectionId
);

uuid_id!(
    /// Server-assigned identifier of a relayed chat message.
    MessageId
);

uuid_id!(
    /// Identifier of a notification record.
    NotificationId
);

/// Message content value object.
///
/// Represents the text of a chat message. Empty text is only meaningful when the
/// message carries media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageContent(String);

impl MessageContent {
    /// Create a new MessageContent.
    ///
    /// # Arguments
    ///
    /// * `content` - The message text
    /// * `has_media` - Whether the message carries an attachment; empty text is
    ///   accepted only then
    ///
    /// # Returns
    ///
    /// A Result containing the MessageContent or an error if validation fails
    pub fn with_media(content: String, has_media: bool) -> Result<Self, ValueObjectError> {
        if content.is_empty() && !has_media {
            return Err(ValueObjectError::MessageContentEmpty);
        }
        let len = content.len();
        if len > MAX_CONTENT_LEN {
            return Err(ValueObjectError::MessageContentTooLong {
                max: MAX_CONTENT_LEN,
                actual: len,
            });
        }
        Ok(Self(content))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to owned String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversation identifier value object.
///
/// A direct conversation between two users is identified by `"<a>_<b>"`, where the
/// participants are ordered numerically when both ids are integers and
/// lexicographically otherwise. The same pair always yields the same id, and
/// [`ConversationId::parse`] accepts every id that [`ConversationId::between`]
/// renders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId {
    first: UserId,
    second: UserId,
}

impl ConversationId {
    /// Build the conversation id shared by two participants.
    pub fn between(a: &UserId, b: &UserId) -> Self {
        let (first, second) = match compare_participants(a.as_str(), b.as_str()) {
            Ordering::Greater => (b.clone(), a.clone()),
            _ => (a.clone(), b.clone()),
        };
        Self { first, second }
    }

    /// Parse a conversation id into its two participants.
    ///
    /// # Errors
    ///
    /// Returns `ValueObjectError::ConversationIdMalformed` unless the id consists of
    /// exactly two non-empty `_`-separated parts.
    pub fn parse(id: &str) -> Result<Self, ValueObjectError> {
        let malformed = || ValueObjectError::ConversationIdMalformed(id.to_string());
        let mut parts = id.split(CONVERSATION_SEPARATOR);
        let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed());
        };
        let first = UserId::try_from(first).map_err(|_| malformed())?;
        let second = UserId::try_from(second).map_err(|_| malformed())?;
        Ok(Self { first, second })
    }

    /// The participant that is not `user`, or `None` if `user` is not part of
    /// this conversation.
    pub fn counterpart_of(&self, user: &UserId) -> Option<&UserId> {
        if &self.first == user {
            Some(&self.second)
        } else if &self.second == user {
            Some(&self.first)
        } else {
            None
        }
    }
}

fn compare_participants(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{CONVERSATION_SEPARATOR}{}", self.first, self.second)
    }
}

/// Timestamp value object.
///
/// Represents a Unix timestamp in milliseconds (JST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new Timestamp.
    ///
    /// # Arguments
    ///
    /// * `value` - Unix timestamp in milliseconds
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The current time.
    pub fn now() -> Self {
        Self(hiroba_shared::time::get_jst_timestamp())
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// RFC 3339 rendering used on the wire.
    pub fn to_rfc3339(&self) -> String {
        hiroba_shared::time::timestamp_to_jst_rfc3339(self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
