//! UseCase: 接続ごとのハンドシェイク状態機械
//!
//! 1 本の WebSocket 接続が受け取ったテキストフレームを、接続の認証状態に応じて
//! 処理します。未認証の間は `authentication` フレームだけを受け付け、認証後は
//! `message` / `typing` / `mark_read` を中継ユースケースへ振り分けます。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectionSession::handle_text() / expire() / close() メソッド
//!
//! ### なぜこのテストが必要か
//! - 認証前のフレームが中継されないことを保証
//! - 認証の締め切りと認証フレームの競合で、後から来た方が無効になることを保証
//! - 後始末（Registry からの削除）が 1 回だけ実行されることを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：認証後のメッセージ中継
//! - 異常系：認証前のメッセージ、不正な JSON、無効なトークン
//! - エッジケース：締め切り後の認証、認証後の締め切り、二重の close

use std::sync::Arc;

use crate::{
    domain::{
        AuthError, CLOSE_AUTH_TIMEOUT, ConnectionError, ConnectionHandle, ConnectionId,
        ConnectionRegistry, CredentialVerifier, SessionState, Timestamp, UserId,
    },
    infrastructure::dto::websocket::{ClientFrame, ServerFrame},
};

use super::{
    authenticate_connection::AuthenticateConnectionUseCase,
    disconnect_connection::DisconnectConnectionUseCase, error::AuthenticateError,
    relay_message::RelayMessageUseCase,
};

/// `auth_error` text for frames other than `authentication` before the handshake
pub const AUTH_REQUIRED: &str = "authentication required";

/// `auth_error` text sent right before a handshake timeout closes the connection
pub const AUTH_TIMEOUT: &str = "authentication timeout";

/// One connection's protocol state and the usecases it drives
pub struct ConnectionSession {
    handle: ConnectionHandle,
    state: SessionState,
    authenticate: AuthenticateConnectionUseCase,
    disconnect: DisconnectConnectionUseCase,
    relay: RelayMessageUseCase,
}

impl ConnectionSession {
    /// 新しい接続セッションを作成（状態は `Connected`）
    pub fn new(
        handle: ConnectionHandle,
        verifier: Arc<dyn CredentialVerifier>,
        registry: Arc<dyn ConnectionRegistry>,
    ) -> Self {
        Self {
            handle,
            state: SessionState::Connected,
            authenticate: AuthenticateConnectionUseCase::new(verifier, registry.clone()),
            disconnect: DisconnectConnectionUseCase::new(registry.clone()),
            relay: RelayMessageUseCase::new(registry),
        }
    }

    pub fn id(&self) -> &ConnectionId {
        self.handle.id()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// 受信したテキストフレームを 1 件処理
    pub async fn handle_text(&mut self, text: &str) {
        if self.state.is_closed() {
            tracing::debug!(connection_id = %self.id(), "Frame after close ignored");
            return;
        }

        let frame = ClientFrame::parse(text);

        let Some(user_id) = self.state.user_id().cloned() else {
            match frame {
                Ok(ClientFrame::Authentication { token }) => self.on_authentication(&token).await,
                Ok(frame) => {
                    tracing::debug!(
                        connection_id = %self.id(),
                        frame_type = frame.type_name(),
                        "Frame before authentication rejected"
                    );
                    self.reply(&ServerFrame::auth_error(AUTH_REQUIRED));
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %self.id(),
                        "Malformed frame before authentication: {}",
                        e
                    );
                    self.reply(&ServerFrame::auth_error(AUTH_REQUIRED));
                }
            }
            return;
        };

        match frame {
            Ok(frame) => self.dispatch(&user_id, frame).await,
            Err(e) => tracing::warn!(
                connection_id = %self.id(),
                user_id = %user_id,
                "Malformed frame ignored: {}",
                e
            ),
        }
    }

    /// 認証の締め切りが来た
    ///
    /// まだ未認証なら `auth_error` を送って接続を閉じ、`true` を返します。
    /// 認証済み・切断済みの場合は何もしません。
    pub fn expire(&mut self) -> bool {
        if !self.state.expire() {
            return false;
        }
        tracing::info!(connection_id = %self.id(), "Authentication handshake timed out");
        self.reply(&ServerFrame::auth_error(AUTH_TIMEOUT));
        if let Err(e) = self.handle.close(CLOSE_AUTH_TIMEOUT, AUTH_TIMEOUT) {
            tracing::debug!(connection_id = %self.id(), "Close frame dropped: {}", e);
        }
        true
    }

    /// 接続の後始末（何度呼んでも 1 回だけ実行される）
    pub async fn close(&mut self) {
        let Some(previous) = self.state.close() else {
            return;
        };
        let connected_ms = self.handle.connected_for_ms(Timestamp::now());
        if let SessionState::Authenticated(user_id) = previous {
            let remaining = self.disconnect.execute(&user_id, self.handle.id()).await;
            tracing::info!(
                connection_id = %self.id(),
                user_id = %user_id,
                remaining,
                connected_ms,
                "Connection closed"
            );
        } else {
            tracing::debug!(
                connection_id = %self.id(),
                connected_ms,
                "Unauthenticated connection closed"
            );
        }
    }

    async fn on_authentication(&mut self, token: &str) {
        match self
            .authenticate
            .execute(&mut self.state, token, &self.handle)
            .await
        {
            Ok(user_id) => {
                tracing::info!(connection_id = %self.id(), user_id = %user_id, "Authenticated");
                self.reply(&ServerFrame::AuthSuccess {
                    user_id: user_id.into_string(),
                    timestamp: Timestamp::now().to_rfc3339(),
                });
            }
            Err(e) => {
                tracing::info!(connection_id = %self.id(), "Authentication failed: {}", e);
                self.reply(&ServerFrame::auth_error(auth_error_message(&e)));
            }
        }
    }

    async fn dispatch(&self, user_id: &UserId, frame: ClientFrame) {
        let frame_type = frame.type_name();
        let result = match frame {
            ClientFrame::Message {
                receiver_id,
                content,
                media_url,
                media_type,
            } => self
                .relay
                .send_chat(user_id, receiver_id, content, media_url, media_type)
                .await
                .map(|_| ()),
            ClientFrame::Typing {
                receiver_id,
                is_typing,
            } => self
                .relay
                .send_typing(user_id, receiver_id, is_typing)
                .await,
            ClientFrame::MarkRead { conversation_id } => self
                .relay
                .mark_read(user_id, &conversation_id)
                .await
                .map(|_| ()),
            ClientFrame::Authentication { .. } => {
                tracing::debug!(
                    connection_id = %self.id(),
                    user_id = %user_id,
                    "Already authenticated, frame ignored"
                );
                Ok(())
            }
            ClientFrame::Unknown => {
                tracing::debug!(
                    connection_id = %self.id(),
                    user_id = %user_id,
                    "Unknown frame type ignored"
                );
                Ok(())
            }
        };

        if let Err(e) = result {
            tracing::debug!(
                connection_id = %self.id(),
                user_id = %user_id,
                frame_type,
                "Frame not relayed: {}",
                e
            );
        }
    }

    /// 自分の接続へフレームを返信
    fn reply(&self, frame: &ServerFrame) {
        let payload = match serde_json::to_string(frame) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(connection_id = %self.id(), "Failed to serialize reply: {}", e);
                return;
            }
        };
        if let Err(e) = self.handle.send_text(payload) {
            tracing::debug!("Reply dropped: {}", e);
        }
    }
}

fn auth_error_message(error: &AuthenticateError) -> &'static str {
    match error {
        AuthenticateError::Credential(AuthError::MissingToken) => "missing token",
        AuthenticateError::Credential(AuthError::Expired) => "token expired",
        AuthenticateError::Credential(AuthError::Invalid(_)) => "invalid token",
        AuthenticateError::Session(ConnectionError::AlreadyAuthenticated) => {
            "already authenticated"
        }
        AuthenticateError::Session(_) => "connection closed",
    }
}
