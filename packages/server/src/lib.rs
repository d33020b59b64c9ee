//! Realtime core of the Hiroba social network backend.
//!
//! Keeps a registry of live WebSocket connections per user, authenticates each
//! connection in-band, relays direct messages between users, and pushes
//! notifications to every device of the target user.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::run as run_server;
