//! Ports the domain depends on.
//!
//! The usecase layer only talks to these traits; concrete implementations live in
//! the infrastructure layer and are wired together in the ui layer (dependency
//! inversion).

use async_trait::async_trait;

use super::{
    connection::ConnectionHandle,
    entity::{Notification, UserDisplay},
    error::{AuthError, DirectoryError, RegistryError},
    value_object::{ConnectionId, UserId},
};

/// Directory of live connections per user.
///
/// Implementations must be safe under concurrent use from every connection task
/// and every task that triggers notifications. Callers never see the underlying
/// collection.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register `handle` under `user_id`.
    async fn add(&self, user_id: UserId, handle: ConnectionHandle);

    /// Deregister a connection. Removing an unknown connection is a no-op; the
    /// user entry disappears together with its last connection.
    async fn remove(&self, user_id: &UserId, connection_id: &ConnectionId);

    /// Write `payload` to every live connection of `user_id`.
    ///
    /// Returns the number of connections written to, or
    /// `RegistryError::NoActiveConnection` if nothing could be delivered.
    async fn send_to_user(&self, user_id: &UserId, payload: &str) -> Result<usize, RegistryError>;

    /// Number of live connections of `user_id`.
    async fn connection_count(&self, user_id: &UserId) -> usize;

    /// Every online user with its number of live connections.
    async fn online_users(&self) -> Vec<(UserId, usize)>;
}

/// Validates an opaque bearer credential.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}

/// Resolves display metadata for a user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup_display(&self, user_id: &UserId) -> Result<UserDisplay, DirectoryError>;
}

/// Holds notifications that could not be delivered in real time.
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    async fn store(&self, notification: Notification);

    /// Remove and return every pending notification of `user_id`, oldest first.
    async fn take_pending(&self, user_id: &UserId) -> Vec<Notification>;
}
