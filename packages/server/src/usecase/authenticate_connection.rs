//! UseCase: 接続の認証処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - AuthenticateConnectionUseCase::execute() メソッド
//! - 資格情報の検証、接続状態の遷移、Registry への登録
//!
//! ### なぜこのテストが必要か
//! - 認証が成功した接続だけが Registry に登録されることを保証
//! - 認証済みの状態遷移は一度だけであることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：有効なトークンでの認証
//! - 異常系：無効なトークン、認証済み接続での再認証、期限切れ後の認証

use std::sync::Arc;

use crate::domain::{ConnectionHandle, ConnectionRegistry, CredentialVerifier, SessionState, UserId};

use super::error::AuthenticateError;

/// 接続認証のユースケース
pub struct AuthenticateConnectionUseCase {
    /// 資格情報の検証器
    verifier: Arc<dyn CredentialVerifier>,
    /// 接続 Registry
    registry: Arc<dyn ConnectionRegistry>,
}

impl AuthenticateConnectionUseCase {
    /// 新しい AuthenticateConnectionUseCase を作成
    pub fn new(verifier: Arc<dyn CredentialVerifier>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { verifier, registry }
    }

    /// 接続認証を実行
    ///
    /// # Arguments
    ///
    /// * `state` - 接続の認証状態（成功時に `Authenticated` へ遷移）
    /// * `token` - クライアントが送ってきた bearer トークン
    /// * `handle` - Registry に登録する接続ハンドル
    ///
    /// # Returns
    ///
    /// * `Ok(UserId)` - 認証成功（Registry 登録済み）
    /// * `Err(AuthenticateError)` - 認証失敗（状態は変化しない）
    pub async fn execute(
        &self,
        state: &mut SessionState,
        token: &str,
        handle: &ConnectionHandle,
    ) -> Result<UserId, AuthenticateError> {
        // 1. トークンを検証
        let user_id = self.verifier.verify(token).await?;

        // 2. 状態遷移（Connected → Authenticated は一度だけ）
        state.authenticate(user_id.clone())?;

        // 3. 遷移に成功した場合のみ Registry に登録
        self.registry.add(user_id.clone(), handle.clone()).await;

        Ok(user_id)
    }
}
