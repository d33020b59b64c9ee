//! WebSocket frame DTOs.
//!
//! Every frame is a JSON object discriminated by its `type` field. Inbound frames
//! decode into the closed [`ClientFrame`] enum; unrecognised types land in
//! [`ClientFrame::Unknown`] instead of failing.

use serde::{Deserialize, Serialize};

use crate::domain::{EntityType, Notification, NotificationKind};

/// Frames sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// In-band authentication with a bearer credential
    Authentication {
        #[serde(default)]
        token: String,
    },
    /// Direct chat message
    #[serde(rename_all = "camelCase")]
    Message {
        #[serde(default)]
        receiver_id: String,
        #[serde(default)]
        content: String,
        #[serde(default)]
        media_url: Option<String>,
        #[serde(default)]
        media_type: Option<String>,
    },
    /// Typing indicator
    #[serde(rename_all = "camelCase")]
    Typing {
        #[serde(default)]
        receiver_id: String,
        #[serde(default)]
        is_typing: bool,
    },
    /// Mark a conversation as read
    #[serde(rename_all = "camelCase")]
    MarkRead {
        #[serde(default)]
        conversation_id: String,
    },
    #[serde(other)]
    Unknown,
}

impl ClientFrame {
    /// Decode a text frame.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The wire name of this frame's type, for logging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::Message { .. } => "message",
            Self::Typing { .. } => "typing",
            Self::MarkRead { .. } => "mark_read",
            Self::Unknown => "unknown",
        }
    }
}

/// Frames sent by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Handshake rejected (invalid frame, invalid credential, or timeout)
    AuthError { error: String },
    /// Handshake completed
    #[serde(rename_all = "camelCase")]
    AuthSuccess { user_id: String, timestamp: String },
    /// Relayed chat message
    #[serde(rename_all = "camelCase")]
    Message {
        id: String,
        sender_id: String,
        receiver_id: String,
        content: String,
        timestamp: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },
    /// Relayed typing indicator
    #[serde(rename_all = "camelCase")]
    Typing {
        sender_id: String,
        receiver_id: String,
        is_typing: bool,
        timestamp: String,
    },
    /// Relayed read receipt
    #[serde(rename_all = "camelCase")]
    ReadReceipt {
        sender_id: String,
        conversation_id: String,
        timestamp: String,
    },
    /// Pushed notification
    Notification { notification: NotificationDto },
}

impl ServerFrame {
    pub fn auth_error(error: impl Into<String>) -> Self {
        Self::AuthError {
            error: error.into(),
        }
    }
}

/// Notification record as it appears on the wire and in the HTTP inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_avatar: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub read: bool,
    pub created_at: String,
}

impl From<&Notification> for NotificationDto {
    fn from(notification: &Notification) -> Self {
        let actor = notification.actor.as_ref();
        let entity = notification.entity.as_ref();
        Self {
            id: notification
                .id
                .as_ref()
                .map(|id| id.as_str().to_string())
                .unwrap_or_default(),
            user_id: notification.user_id.as_str().to_string(),
            actor_id: actor.map(|a| a.id.as_str().to_string()),
            actor_name: actor.map(|a| a.display.name.clone()),
            actor_username: actor.map(|a| a.display.username.clone()),
            actor_avatar: actor.and_then(|a| a.display.avatar_url.clone()),
            kind: notification.kind,
            entity_id: entity.map(|e| e.id.clone()),
            entity_type: entity.map(|e| e.entity_type),
            entity_url: entity.and_then(|e| e.url.clone()),
            content: notification.content.clone(),
            read: notification.read,
            created_at: notification
                .created_at
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Actor, UserDisplay, UserId};

    #[test]
    fn test_parse_authentication_frame() {
        // テスト項目: 認証フレームをデコードできる
        // when (操作):
        let frame = ClientFrame::parse(r#"{"type":"authentication","token":"abc"}"#).unwrap();

        // then (期待する結果):
        assert_eq!(
            frame,
            ClientFrame::Authentication {
                token: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_parse_message_frame_with_camel_case_fields() {
        // テスト項目: camelCase のフィールドを持つメッセージフレームをデコードできる
        // when (操作):
        let frame = ClientFrame::parse(
            r#"{"type":"message","receiverId":"9","content":"hi","mediaUrl":"https://cdn/x.png","mediaType":"image"}"#,
        )
        .unwrap();

        // then (期待する結果):
        assert_eq!(
            frame,
            ClientFrame::Message {
                receiver_id: "9".to_string(),
                content: "hi".to_string(),
                media_url: Some("https://cdn/x.png".to_string()),
                media_type: Some("image".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_message_frame_without_receiver() {
        // テスト項目: receiverId が無いメッセージもフレームとしてはデコードできる
        // when (操作):
        let frame = ClientFrame::parse(r#"{"type":"message","content":"hi"}"#).unwrap();

        // then (期待する結果):
        assert_eq!(frame.type_name(), "message");
    }

    #[test]
    fn test_parse_unknown_type_falls_back() {
        // テスト項目: 未知の type は Unknown になりエラーにならない
        // when (操作):
        let frame = ClientFrame::parse(r#"{"type":"presence","status":"away"}"#).unwrap();

        // then (期待する結果):
        assert_eq!(frame, ClientFrame::Unknown);
    }

    #[test]
    fn test_parse_malformed_json_fails() {
        // テスト項目: JSON でないテキストはデコードエラーになる
        assert!(ClientFrame::parse("hello").is_err());
        assert!(ClientFrame::parse(r#"{"token":"abc"}"#).is_err());
    }

    #[test]
    fn test_serialize_auth_success() {
        // テスト項目: auth_success フレームが仕様どおりの JSON になる
        // given (前提条件):
        let frame = ServerFrame::AuthSuccess {
            user_id: "5".to_string(),
            timestamp: "2023-01-01T00:00:00.000+09:00".to_string(),
        };

        // when (操作):
        let json = serde_json::to_value(&frame).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            serde_json::json!({
                "type": "auth_success",
                "userId": "5",
                "timestamp": "2023-01-01T00:00:00.000+09:00"
            })
        );
    }

    #[test]
    fn test_serialize_read_receipt() {
        // テスト項目: read_receipt フレームのフィールド名が camelCase になる
        // given (前提条件):
        let frame = ServerFrame::ReadReceipt {
            sender_id: "5".to_string(),
            conversation_id: "5_9".to_string(),
            timestamp: "t".to_string(),
        };

        // when (操作):
        let json = serde_json::to_value(&frame).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "read_receipt");
        assert_eq!(json["senderId"], "5");
        assert_eq!(json["conversationId"], "5_9");
    }

    #[test]
    fn test_notification_envelope_shape() {
        // テスト項目: 通知は notification フィールドに包まれて送られる
        // given (前提条件):
        let actor_id = UserId::new("alice".to_string()).unwrap();
        let notification = Notification::new(
            UserId::new("bob".to_string()).unwrap(),
            NotificationKind::Like,
        )
        .with_actor(Actor {
            display: UserDisplay {
                name: "Alice".to_string(),
                username: "alice".to_string(),
                avatar_url: Some("https://cdn/alice.png".to_string()),
            },
            id: actor_id,
        })
        .with_entity("42", EntityType::Post, None)
        .stamped();

        // when (操作):
        let frame = ServerFrame::Notification {
            notification: NotificationDto::from(&notification),
        };
        let json = serde_json::to_value(&frame).unwrap();

        // then (期待する結果):
        assert_eq!(json["type"], "notification");
        let body = &json["notification"];
        assert_eq!(body["userId"], "bob");
        assert_eq!(body["actorId"], "alice");
        assert_eq!(body["actorName"], "Alice");
        assert_eq!(body["actorAvatar"], "https://cdn/alice.png");
        assert_eq!(body["type"], "like");
        assert_eq!(body["entityId"], "42");
        assert_eq!(body["entityType"], "post");
        assert_eq!(body["read"], false);
        assert!(body["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(body["createdAt"].is_string());
        assert!(body.get("content").is_none());
    }
}
