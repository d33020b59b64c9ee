//! Shared application state.

use std::{sync::Arc, time::Duration};

use crate::{
    ServerError,
    config::ServerConfig,
    domain::{ConnectionRegistry, CredentialVerifier, NotificationInbox, UserDirectory},
    infrastructure::{
        auth::JwtCredentialVerifier,
        repository::{InMemoryConnectionRegistry, InMemoryNotificationInbox, InMemoryUserDirectory},
    },
    usecase::NotificationDispatcher,
};

/// Shared application state
pub struct AppState {
    /// 接続 Registry（全接続タスクと通知配信で共有）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// WebSocket の認証と HTTP の Bearer 認証に使う検証器
    pub verifier: Arc<dyn CredentialVerifier>,
    /// 配信できなかった通知
    pub inbox: Arc<dyn NotificationInbox>,
    /// 通知配信のユースケース（他のサービスから呼ばれる入口）
    pub dispatcher: Arc<NotificationDispatcher>,
    /// 認証の締め切り
    pub handshake_timeout: Duration,
}

impl AppState {
    /// Wire the in-memory adapters and the JWT verifier from `config`.
    ///
    /// The user directory is seeded from `config.users_file` when one is set.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let directory = match &config.users_file {
            Some(path) => InMemoryUserDirectory::load(path).await?,
            None => {
                tracing::warn!("No users file configured; notifications will show bare user ids");
                InMemoryUserDirectory::new()
            }
        };
        Ok(Self::new(
            config,
            Arc::new(JwtCredentialVerifier::new(config.jwt_secret.as_bytes())),
            Arc::new(directory),
        ))
    }

    /// Wire the in-memory registry and inbox around the given collaborators.
    pub fn new(
        config: &ServerConfig,
        verifier: Arc<dyn CredentialVerifier>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let registry: Arc<dyn ConnectionRegistry> =
            Arc::new(InMemoryConnectionRegistry::new(config.session_policy()));
        let inbox: Arc<dyn NotificationInbox> =
            Arc::new(InMemoryNotificationInbox::new(config.inbox_capacity));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            registry.clone(),
            directory,
            inbox.clone(),
        ));

        Self {
            registry,
            verifier,
            inbox,
            dispatcher,
            handshake_timeout: config.handshake_timeout(),
        }
    }
}
