//! InMemory 実装

pub mod connection_registry;
pub mod notification_inbox;
pub mod user_directory;

pub use connection_registry::InMemoryConnectionRegistry;
pub use notification_inbox::{DEFAULT_INBOX_CAPACITY, InMemoryNotificationInbox};
pub use user_directory::{InMemoryUserDirectory, UserSeedError};
