//! Domain layer error definitions.

use thiserror::Error;

use super::value_object::UserId;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId validation error
    #[error("UserId cannot be empty")]
    UserIdEmpty,

    /// UserId too long error
    #[error("UserId cannot exceed {max} characters (got {actual})")]
    UserIdTooLong { max: usize, actual: usize },

    /// UserId contains the conversation id separator
    #[error("UserId cannot contain '_' (got: {0})")]
    UserIdContainsSeparator(String),

    /// MessageContent validation error
    #[error("MessageContent cannot be empty")]
    MessageContentEmpty,

    /// MessageContent too long error
    #[error("MessageContent cannot exceed {max} characters (got {actual})")]
    MessageContentTooLong { max: usize, actual: usize },

    /// Conversation id is not exactly two `_`-separated user ids
    #[error("ConversationId must have the form <id>_<id> (got: {0})")]
    ConversationIdMalformed(String),
}

/// Errors reported by the connection registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The user has no live connection; callers fall back to persistent storage.
    #[error("No active connection for user '{0}'")]
    NoActiveConnection(UserId),
}

/// Errors returned by a credential verifier
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication token is missing")]
    MissingToken,

    #[error("Authentication token has expired")]
    Expired,

    #[error("Invalid authentication token: {0}")]
    Invalid(String),
}

/// Errors returned by the user directory
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("Unknown user '{0}'")]
    UnknownUser(UserId),
}

/// Errors related to a single connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The connection's outbound queue is gone (writer task finished)
    #[error("Connection '{0}' is closed")]
    Closed(String),

    /// The peer is not draining its outbound queue
    #[error("Outbound queue of connection '{0}' is full")]
    QueueFull(String),

    /// Authentication was attempted on a connection that already completed it
    #[error("Connection is already authenticated")]
    AlreadyAuthenticated,

    /// A transition was attempted after the connection closed
    #[error("Connection has been closed")]
    SessionClosed,
}
