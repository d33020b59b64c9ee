//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{AuthError, ConnectionError, RegistryError, UserId, ValueObjectError};

/// フレーム配信時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// 宛先ユーザーに生きている接続が無い
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Failed to serialize frame: {0}")]
    Serialization(String),
}

/// 接続認証時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticateError {
    /// 資格情報の検証に失敗
    #[error(transparent)]
    Credential(#[from] AuthError),

    /// 接続の状態遷移に失敗（認証済み、または切断済み）
    #[error(transparent)]
    Session(#[from] ConnectionError),
}

/// メッセージ中継時のエラー
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// 受信者が接続していない（永続ストア経由で後から届ける）
    #[error("No active connection for user '{0}'")]
    NoActiveConnection(UserId),

    #[error("Invalid receiver: {0}")]
    InvalidReceiver(ValueObjectError),

    #[error("Invalid message content: {0}")]
    InvalidContent(ValueObjectError),

    #[error("Invalid conversation: {0}")]
    InvalidConversation(ValueObjectError),

    /// 送信者が会話の参加者ではない
    #[error("User '{user_id}' is not a participant of conversation '{conversation_id}'")]
    NotParticipant {
        user_id: UserId,
        conversation_id: String,
    },

    #[error("Failed to serialize frame: {0}")]
    Serialization(String),
}

impl From<DeliveryError> for RelayError {
    fn from(error: DeliveryError) -> Self {
        match error {
            DeliveryError::Registry(RegistryError::NoActiveConnection(user_id)) => {
                Self::NoActiveConnection(user_id)
            }
            DeliveryError::Serialization(e) => Self::Serialization(e),
        }
    }
}
