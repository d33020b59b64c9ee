//! Process-level errors.

use thiserror::Error;

use crate::infrastructure::repository::UserSeedError;

/// Errors that stop the server
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Failed to load user directory: {0}")]
    UserDirectory(#[from] UserSeedError),
}
