//! Command-line and environment configuration.

use std::{path::PathBuf, time::Duration};

use clap::{Parser, ValueEnum};

use crate::{domain::SessionPolicy, infrastructure::repository::DEFAULT_INBOX_CAPACITY};

/// Default handshake deadline in seconds
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Realtime messaging and notification server
#[derive(Debug, Clone, Parser)]
#[command(name = "hiroba-server", version, about)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HIROBA_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "HIROBA_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Shared secret used to verify HS256 access tokens
    #[arg(long, env = "HIROBA_JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Seconds a new connection has to authenticate before it is closed
    #[arg(long, env = "HIROBA_HANDSHAKE_TIMEOUT_SECS", default_value_t = DEFAULT_HANDSHAKE_TIMEOUT_SECS)]
    pub handshake_timeout_secs: u64,

    /// Whether a user may keep several connections open at once
    #[arg(long, env = "HIROBA_SESSION_POLICY", value_enum, default_value_t = SessionPolicyArg::MultiDevice)]
    pub session_policy: SessionPolicyArg,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "HIROBA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Undelivered notifications kept per user
    #[arg(long, env = "HIROBA_INBOX_CAPACITY", default_value_t = DEFAULT_INBOX_CAPACITY)]
    pub inbox_capacity: usize,

    /// JSON file with the display name, handle and avatar of each user
    #[arg(long, env = "HIROBA_USERS_FILE")]
    pub users_file: Option<PathBuf>,
}

/// `--session-policy` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SessionPolicyArg {
    MultiDevice,
    SingleSession,
}

impl From<SessionPolicyArg> for SessionPolicy {
    fn from(arg: SessionPolicyArg) -> Self {
        match arg {
            SessionPolicyArg::MultiDevice => SessionPolicy::MultiDevice,
            SessionPolicyArg::SingleSession => SessionPolicy::SingleSession,
        }
    }
}

impl ServerConfig {
    /// Configuration for tests and embedding: loopback, ephemeral port, defaults
    /// for everything else.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt_secret: jwt_secret.into(),
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT_SECS,
            session_policy: SessionPolicyArg::MultiDevice,
            log_level: "info".to_string(),
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            users_file: None,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }

    pub fn session_policy(&self) -> SessionPolicy {
        self.session_policy.into()
    }
}
