//! UseCase: メッセージ中継処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - RelayMessageUseCase の send_chat() / send_typing() / mark_read() メソッド
//! - 認証済みの送信者から受信者の全接続へのフレーム中継
//!
//! ### なぜこのテストが必要か
//! - 受信者の全デバイスに同じメッセージ（同じ ID）が届くことを保証
//! - 既読通知が会話の相手側にだけ届くことを保証
//! - 不正な入力が中継されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：チャット、入力中表示、既読通知の中継
//! - 異常系：受信者がオフライン、不正な会話 ID、会話に参加していない送信者
//! - エッジケース：メディア付きの空メッセージ

use std::sync::Arc;

use crate::{
    domain::{
        ConnectionRegistry, ConversationId, MessageContent, MessageId, MessageIdFactory,
        Timestamp, UserId,
    },
    infrastructure::dto::websocket::ServerFrame,
};

use super::{deliver::send_json, error::RelayError};

/// メッセージ中継のユースケース
pub struct RelayMessageUseCase {
    /// 接続 Registry
    registry: Arc<dyn ConnectionRegistry>,
}

impl RelayMessageUseCase {
    /// 新しい RelayMessageUseCase を作成
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// チャットメッセージを受信者の全接続に中継
    ///
    /// # Returns
    ///
    /// * `Ok(MessageId)` - 中継したメッセージの ID
    /// * `Err(RelayError)` - 入力が不正、または受信者がオフライン
    pub async fn send_chat(
        &self,
        sender: &UserId,
        receiver_id: String,
        content: String,
        media_url: Option<String>,
        media_type: Option<String>,
    ) -> Result<MessageId, RelayError> {
        let receiver = UserId::new(receiver_id).map_err(RelayError::InvalidReceiver)?;
        let content = MessageContent::with_media(content, media_url.is_some())
            .map_err(RelayError::InvalidContent)?;

        let id = MessageIdFactory::generate();
        let frame = ServerFrame::Message {
            id: id.as_str().to_string(),
            sender_id: sender.as_str().to_string(),
            receiver_id: receiver.as_str().to_string(),
            content: content.into_string(),
            timestamp: Timestamp::now().to_rfc3339(),
            media_url,
            media_type,
        };
        send_json(self.registry.as_ref(), &receiver, &frame).await?;

        Ok(id)
    }

    /// 入力中表示を受信者の全接続に中継
    pub async fn send_typing(
        &self,
        sender: &UserId,
        receiver_id: String,
        is_typing: bool,
    ) -> Result<(), RelayError> {
        let receiver = UserId::new(receiver_id).map_err(RelayError::InvalidReceiver)?;

        let frame = ServerFrame::Typing {
            sender_id: sender.as_str().to_string(),
            receiver_id: receiver.as_str().to_string(),
            is_typing,
            timestamp: Timestamp::now().to_rfc3339(),
        };
        send_json(self.registry.as_ref(), &receiver, &frame).await?;

        Ok(())
    }

    /// 既読通知を会話の相手に中継
    ///
    /// # Returns
    ///
    /// * `Ok(UserId)` - 既読通知を受け取った相手
    /// * `Err(RelayError)` - 会話 ID が不正、送信者が参加者でない、または相手がオフライン
    pub async fn mark_read(
        &self,
        sender: &UserId,
        conversation_id: &str,
    ) -> Result<UserId, RelayError> {
        let conversation =
            ConversationId::parse(conversation_id).map_err(RelayError::InvalidConversation)?;
        let counterpart = conversation
            .counterpart_of(sender)
            .cloned()
            .ok_or_else(|| RelayError::NotParticipant {
                user_id: sender.clone(),
                conversation_id: conversation_id.to_string(),
            })?;

        let frame = ServerFrame::ReadReceipt {
            sender_id: sender.as_str().to_string(),
            conversation_id: conversation.to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        };
        send_json(self.registry.as_ref(), &counterpart, &frame).await?;

        Ok(counterpart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionHandle, ConnectionIdFactory, Outbound, ValueObjectError},
        infrastructure::repository::InMemoryConnectionRegistry,
    };
    use tokio::sync::mpsc;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    async fn connect(
        registry: &InMemoryConnectionRegistry,
        user_id: &str,
    ) -> mpsc::Receiver<Outbound> {
        let (tx, rx) = mpsc::channel(16);
        let handle = ConnectionHandle::new(ConnectionIdFactory::generate(), tx, Timestamp::now());
        registry.add(user(user_id), handle).await;
        rx
    }

    fn next_json(rx: &mut mpsc::Receiver<Outbound>) -> serde_json::Value {
        match rx.try_recv().unwrap() {
            Outbound::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    fn create_usecase() -> (RelayMessageUseCase, Arc<InMemoryConnectionRegistry>) {
        let registry = Arc::new(InMemoryConnectionRegistry::default());
        (RelayMessageUseCase::new(registry.clone()), registry)
    }

    #[tokio::test]
    async fn test_send_chat_reaches_every_device_with_same_id() {
        // テスト項目: 受信者の 2 台のデバイスに同じ ID のメッセージが届く
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let mut phone = connect(&registry, "9").await;
        let mut laptop = connect(&registry, "9").await;

        // when (操作):
        let id = usecase
            .send_chat(&user("5"), "9".to_string(), "hi".to_string(), None, None)
            .await
            .unwrap();

        // then (期待する結果):
        let on_phone = next_json(&mut phone);
        let on_laptop = next_json(&mut laptop);
        assert_eq!(on_phone, on_laptop);
        assert_eq!(on_phone["type"], "message");
        assert_eq!(on_phone["id"], id.as_str());
        assert_eq!(on_phone["senderId"], "5");
        assert_eq!(on_phone["receiverId"], "9");
        assert_eq!(on_phone["content"], "hi");
        assert!(on_phone.get("mediaUrl").is_none());
    }

    #[tokio::test]
    async fn test_send_chat_to_offline_receiver() {
        // テスト項目: 受信者がオフラインの場合 NoActiveConnection になる
        // given (前提条件):
        let (usecase, _registry) = create_usecase();

        // when (操作):
        let result = usecase
            .send_chat(&user("5"), "9".to_string(), "hi".to_string(), None, None)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::NoActiveConnection(user("9"))));
    }

    #[tokio::test]
    async fn test_send_chat_without_receiver() {
        // テスト項目: receiverId が空の場合 InvalidReceiver になる
        // given (前提条件):
        let (usecase, _registry) = create_usecase();

        // when (操作):
        let result = usecase
            .send_chat(&user("5"), String::new(), "hi".to_string(), None, None)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::InvalidReceiver(ValueObjectError::UserIdEmpty))
        );
    }

    #[tokio::test]
    async fn test_send_chat_empty_content_with_media() {
        // テスト項目: メディア付きであれば本文が空でも中継される
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let mut rx = connect(&registry, "9").await;

        // when (操作):
        let result = usecase
            .send_chat(
                &user("5"),
                "9".to_string(),
                String::new(),
                Some("https://cdn.example.com/a.jpg".to_string()),
                Some("image".to_string()),
            )
            .await;

        // then (期待する結果):
        assert!(result.is_ok());
        let frame = next_json(&mut rx);
        assert_eq!(frame["content"], "");
        assert_eq!(frame["mediaUrl"], "https://cdn.example.com/a.jpg");
        assert_eq!(frame["mediaType"], "image");
    }

    #[tokio::test]
    async fn test_send_chat_empty_content_without_media() {
        // テスト項目: メディア無しの空メッセージは中継されない
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let mut rx = connect(&registry, "9").await;

        // when (操作):
        let result = usecase
            .send_chat(&user("5"), "9".to_string(), String::new(), None, None)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::InvalidContent(
                ValueObjectError::MessageContentEmpty
            ))
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_typing() {
        // テスト項目: 入力中表示が受信者に届く
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let mut rx = connect(&registry, "9").await;

        // when (操作):
        usecase
            .send_typing(&user("5"), "9".to_string(), true)
            .await
            .unwrap();

        // then (期待する結果):
        let frame = next_json(&mut rx);
        assert_eq!(frame["type"], "typing");
        assert_eq!(frame["senderId"], "5");
        assert_eq!(frame["isTyping"], true);
    }

    #[tokio::test]
    async fn test_mark_read_routes_to_counterpart() {
        // テスト項目: 既読通知は会話の相手にだけ届く
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let mut sender_rx = connect(&registry, "5").await;
        let mut counterpart_rx = connect(&registry, "9").await;

        // when (操作):
        let result = usecase.mark_read(&user("9"), "5_9").await;

        // then (期待する結果):
        assert_eq!(result, Ok(user("5")));
        let frame = next_json(&mut sender_rx);
        assert_eq!(frame["type"], "read_receipt");
        assert_eq!(frame["senderId"], "9");
        assert_eq!(frame["conversationId"], "5_9");
        assert!(counterpart_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mark_read_malformed_conversation() {
        // テスト項目: 不正な会話 ID では何も中継されない
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let mut rx = connect(&registry, "5").await;

        // when (操作):
        let result = usecase.mark_read(&user("9"), "garbage").await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::InvalidConversation(_))));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mark_read_by_non_participant() {
        // テスト項目: 会話に参加していない送信者の既読通知は中継されない
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let mut rx = connect(&registry, "5").await;

        // when (操作):
        let result = usecase.mark_read(&user("7"), "5_9").await;

        // then (期待する結果):
        assert!(matches!(result, Err(RelayError::NotParticipant { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_mark_read_accepts_id_from_message_notification() {
        // テスト項目: 通知に載る会話 ID (between で生成) をそのまま既読に使える
        // given (前提条件):
        let (usecase, registry) = create_usecase();
        let mut rx = connect(&registry, "user-a").await;
        let conversation = ConversationId::between(&user("user-b"), &user("user-a")).to_string();

        // when (操作):
        let result = usecase.mark_read(&user("user-b"), &conversation).await;

        // then (期待する結果):
        assert_eq!(result, Ok(user("user-a")));
        let frame = next_json(&mut rx);
        assert_eq!(frame["conversationId"], conversation);
    }

    #[tokio::test]
    async fn test_send_chat_to_receiver_with_separator() {
        // テスト項目: '_' を含む receiverId は InvalidReceiver になる
        // given (前提条件):
        let (usecase, _registry) = create_usecase();

        // when (操作):
        let result = usecase
            .send_chat(&user("5"), "user_2".to_string(), "hi".to_string(), None, None)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::InvalidReceiver(
                ValueObjectError::UserIdContainsSeparator("user_2".to_string())
            ))
        );
    }
}
