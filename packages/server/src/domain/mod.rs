//! Domain layer for the realtime core.
//!
//! This module contains business rules that are independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod connection;
pub mod entity;
pub mod error;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use connection::{
    CLOSE_AUTH_TIMEOUT, CLOSE_SUPERSEDED, ConnectionHandle, OUTBOUND_QUEUE_CAPACITY, Outbound,
    SessionPolicy, SessionState,
};
pub use entity::{Actor, EntityRef, EntityType, Notification, NotificationKind, UserDisplay};
pub use error::{AuthError, ConnectionError, DirectoryError, RegistryError, ValueObjectError};
pub use factory::{ConnectionIdFactory, MessageIdFactory, NotificationIdFactory};
pub use repository::{ConnectionRegistry, CredentialVerifier, NotificationInbox, UserDirectory};
pub use value_object::{
    ConnectionId, ConversationId, MessageContent, MessageId, NotificationId, Timestamp, UserId,
};
