//! UseCase: 接続の切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectConnectionUseCase::execute() メソッド
//! - Registry からの接続削除と、残り接続数の報告
//!
//! ### どのような状況を想定しているか
//! - 正常系：複数デバイスのうち 1 台の切断
//! - エッジケース：最後の接続の切断（ユーザーのエントリが消える）
//! - エッジケース：登録されていない接続の切断（何もしない）

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, UserId};

/// 接続切断のユースケース
pub struct DisconnectConnectionUseCase {
    /// 接続 Registry
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectConnectionUseCase {
    /// 新しい DisconnectConnectionUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続切断を実行
    ///
    /// # Returns
    ///
    /// 同じユーザーに残っている接続数
    pub async fn execute(&self, user_id: &UserId, connection_id: &ConnectionId) -> usize {
        self.registry.remove(user_id, connection_id).await;
        let remaining = self.registry.connection_count(user_id).await;

        if remaining == 0 {
            tracing::info!(user_id = %user_id, "User went offline");
        }
        remaining
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionHandle, ConnectionIdFactory, Timestamp},
        infrastructure::repository::InMemoryConnectionRegistry,
    };
    use tokio::sync::mpsc;

    fn bob() -> UserId {
        UserId::new("bob".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_disconnect_one_of_two_devices() {
        // テスト項目: 2 台のうち 1 台が切断しても、もう 1 台は残る
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::default());
        let usecase = DisconnectConnectionUseCase::new(registry.clone());
        let (tx1, _rx1) = mpsc::channel(16);
        let (tx2, _rx2) = mpsc::channel(16);
        let phone = ConnectionHandle::new(ConnectionIdFactory::generate(), tx1, Timestamp::now());
        let laptop = ConnectionHandle::new(ConnectionIdFactory::generate(), tx2, Timestamp::now());
        let phone_id = phone.id().clone();
        registry.add(bob(), phone).await;
        registry.add(bob(), laptop).await;

        // when (操作):
        let remaining = usecase.execute(&bob(), &phone_id).await;

        // then (期待する結果):
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_disconnect_last_connection() {
        // テスト項目: 最後の接続が切断されるとユーザーはオフラインになる
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::default());
        let usecase = DisconnectConnectionUseCase::new(registry.clone());
        let (tx, _rx) = mpsc::channel(16);
        let handle = ConnectionHandle::new(ConnectionIdFactory::generate(), tx, Timestamp::now());
        let connection_id = handle.id().clone();
        registry.add(bob(), handle).await;

        // when (操作):
        let remaining = usecase.execute(&bob(), &connection_id).await;

        // then (期待する結果):
        assert_eq!(remaining, 0);
        assert!(registry.online_users().await.is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_unknown_connection() {
        // テスト項目: 登録されていない接続の切断は何もしない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::default());
        let usecase = DisconnectConnectionUseCase::new(registry.clone());

        // when (操作):
        let remaining = usecase
            .execute(&bob(), &ConnectionIdFactory::generate())
            .await;

        // then (期待する結果):
        assert_eq!(remaining, 0);
    }
}
