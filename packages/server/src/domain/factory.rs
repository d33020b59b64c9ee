//! Domain factories for generating identifiers.
//!
//! Generation is kept apart from the validation logic in the value objects.

use super::value_object::{ConnectionId, MessageId, NotificationId};

/// Factory for generating ConnectionId instances.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    pub fn generate() -> ConnectionId {
        ConnectionId::from_uuid(uuid::Uuid::new_v4())
    }
}

/// Factory for server-assigned chat message ids.
pub struct MessageIdFactory;

impl MessageIdFactory {
    /// Generate a new MessageId with a random UUID v4.
    pub fn generate() -> MessageId {
        MessageId::from_uuid(uuid::Uuid::new_v4())
    }
}

/// Factory for notification ids.
pub struct NotificationIdFactory;

impl NotificationIdFactory {
    /// Generate a new NotificationId with a random UUID v4.
    pub fn generate() -> NotificationId {
        NotificationId::from_uuid(uuid::Uuid::new_v4())
    }
}
