//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する ConnectionRegistry trait の具体的な実装。
//! ユーザー ID ごとに接続ハンドルの集合を HashMap で保持します。
//!
//! ## 並行性
//!
//! 全ての操作は単一の `RwLock` の下で行われます。
//! `send_to_user` などの読み取りは並行に実行でき、`add` / `remove` は排他的に実行されます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    CLOSE_SUPERSEDED, ConnectionHandle, ConnectionId, ConnectionRegistry, RegistryError,
    SessionPolicy, UserId,
};

/// インメモリ Connection Registry 実装
///
/// ユーザーがキーとして存在するのは、生きている接続が 1 つ以上ある間だけです。
pub struct InMemoryConnectionRegistry {
    /// ユーザー ID → (接続 ID → 接続ハンドル)
    connections: RwLock<HashMap<UserId, HashMap<ConnectionId, ConnectionHandle>>>,
    /// 同一ユーザーの同時接続ポリシー
    policy: SessionPolicy,
}

impl InMemoryConnectionRegistry {
    /// 新しい InMemoryConnectionRegistry を作成
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            policy,
        }
    }
}

impl Default for InMemoryConnectionRegistry {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn add(&self, user_id: UserId, handle: ConnectionHandle) {
        let mut connections = self.connections.write().await;
        let user_connections = connections.entry(user_id.clone()).or_default();

        if self.policy == SessionPolicy::SingleSession {
            for (superseded_id, superseded) in user_connections.drain() {
                if let Err(e) =
                    superseded.close(CLOSE_SUPERSEDED, "superseded by a newer connection")
                {
                    tracing::warn!(
                        user_id = %user_id,
                        connection_id = %superseded_id,
                        error = %e,
                        "Failed to queue close frame"
                    );
                }
                tracing::info!(
                    user_id = %user_id,
                    connection_id = %superseded_id,
                    "Closed superseded connection"
                );
            }
        }

        let connection_id = handle.id().clone();
        user_connections.insert(connection_id.clone(), handle);
        tracing::debug!(
            user_id = %user_id,
            connection_id = %connection_id,
            connections = user_connections.len(),
            "Connection registered"
        );
    }

    async fn remove(&self, user_id: &UserId, connection_id: &ConnectionId) {
        let mut connections = self.connections.write().await;
        let Some(user_connections) = connections.get_mut(user_id) else {
            return;
        };

        if user_connections.remove(connection_id).is_some() {
            tracing::debug!(
                user_id = %user_id,
                connection_id = %connection_id,
                remaining = user_connections.len(),
                "Connection unregistered"
            );
        }
        if user_connections.is_empty() {
            connections.remove(user_id);
        }
    }

    async fn send_to_user(&self, user_id: &UserId, payload: &str) -> Result<usize, RegistryError> {
        let connections = self.connections.read().await;
        let user_connections = connections
            .get(user_id)
            .ok_or_else(|| RegistryError::NoActiveConnection(user_id.clone()))?;

        let mut delivered = 0;
        for (connection_id, handle) in user_connections {
            match handle.send_text(payload.to_string()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        user_id = %user_id,
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to write to connection"
                    );
                }
            }
        }

        if delivered == 0 {
            return Err(RegistryError::NoActiveConnection(user_id.clone()));
        }
        Ok(delivered)
    }

    async fn connection_count(&self, user_id: &UserId) -> usize {
        let connections = self.connections.read().await;
        connections.get(user_id).map_or(0, HashMap::len)
    }

    async fn online_users(&self) -> Vec<(UserId, usize)> {
        let connections = self.connections.read().await;
        let mut users: Vec<(UserId, usize)> = connections
            .iter()
            .map(|(user_id, user_connections)| (user_id.clone(), user_connections.len()))
            .collect();
        users.sort_by(|a, b| a.0.cmp(&b.0));
        users
    }
}
