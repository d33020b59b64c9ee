//! UseCase: 通知の配信処理
//!
//! 業務イベント（フォロー、いいね、コメントなど）ごとに通知レコードを組み立て、
//! 宛先ユーザーの全接続へ `{"type":"notification","notification":{...}}` として
//! 送ります。配信は呼び出し元から見て fire-and-forget で、エラーは返しません。
//! 宛先がオフラインの場合は NotificationInbox に保存します。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - NotificationDispatcher::send() / send_group() と各 notify_* メソッド
//!
//! ### なぜこのテストが必要か
//! - 宛先の全デバイスに同じ ID の通知が届くことを保証
//! - オフラインの宛先への通知が失われず Inbox に残ることを保証
//! - 自分自身へのイベント（自分の投稿へのいいね等）が通知されないことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：オンラインの宛先への配信、グループ配信
//! - 異常系：宛先がオフライン、ユーザーディレクトリの検索失敗
//! - エッジケース：actor と宛先が同じユーザー

use std::sync::Arc;

use crate::{
    domain::{
        Actor, ConnectionRegistry, ConversationId, DirectoryError, EntityType, Notification,
        NotificationInbox, NotificationKind, RegistryError, UserDirectory, UserDisplay, UserId,
    },
    infrastructure::dto::websocket::{NotificationDto, ServerFrame},
};

use super::{deliver::send_json, error::DeliveryError};

/// Result of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Written to this many live connections
    Delivered(usize),
    /// Recipient offline; kept in the inbox
    Stored,
    /// Nothing to deliver (actor and recipient are the same user)
    Skipped,
}

/// The entity a like points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeTarget {
    Post(String),
    Comment(String),
}

/// 通知配信のユースケース
pub struct NotificationDispatcher {
    /// 接続 Registry
    registry: Arc<dyn ConnectionRegistry>,
    /// actor の表示情報の取得元
    directory: Arc<dyn UserDirectory>,
    /// 配信できなかった通知の保存先
    inbox: Arc<dyn NotificationInbox>,
}

impl NotificationDispatcher {
    /// 新しい NotificationDispatcher を作成
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        directory: Arc<dyn UserDirectory>,
        inbox: Arc<dyn NotificationInbox>,
    ) -> Self {
        Self {
            registry,
            directory,
            inbox,
        }
    }

    /// 通知を 1 件配信
    ///
    /// `id` / `created_at` が未設定なら埋めてから送ります。
    pub async fn send(&self, notification: Notification) -> DeliveryOutcome {
        if notification.is_self_addressed() {
            tracing::debug!(user_id = %notification.user_id, "Self-addressed notification skipped");
            return DeliveryOutcome::Skipped;
        }

        let notification = notification.stamped();
        let frame = ServerFrame::Notification {
            notification: NotificationDto::from(&notification),
        };

        match send_json(self.registry.as_ref(), &notification.user_id, &frame).await {
            Ok(count) => {
                tracing::debug!(
                    user_id = %notification.user_id,
                    kind = ?notification.kind,
                    connections = count,
                    "Notification delivered"
                );
                DeliveryOutcome::Delivered(count)
            }
            Err(DeliveryError::Registry(RegistryError::NoActiveConnection(user_id))) => {
                tracing::debug!(user_id = %user_id, "Recipient offline, notification stored");
                self.inbox.store(notification).await;
                DeliveryOutcome::Stored
            }
            Err(e) => {
                tracing::error!(
                    user_id = %notification.user_id,
                    "Failed to deliver notification: {}",
                    e
                );
                self.inbox.store(notification).await;
                DeliveryOutcome::Stored
            }
        }
    }

    /// 同じ内容の通知を複数の宛先へ配信
    ///
    /// 宛先ごとに新しい ID を振り、1 件ずつ独立に配信します。
    pub async fn send_group(
        &self,
        user_ids: &[UserId],
        template: &Notification,
    ) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            outcomes.push(self.send(template.for_recipient(user_id.clone())).await);
        }
        outcomes
    }

    /// `follower` が `followed` をフォローした
    pub async fn notify_follow(&self, follower: &UserId, followed: &UserId) -> DeliveryOutcome {
        let notification = Notification::new(followed.clone(), NotificationKind::Follow)
            .with_entity(follower.as_str(), EntityType::User, Some(user_url(follower)));
        self.send_from(follower, notification).await
    }

    /// `actor` が `owner` の投稿またはコメントにいいねした
    pub async fn notify_like(
        &self,
        actor: &UserId,
        owner: &UserId,
        target: LikeTarget,
    ) -> DeliveryOutcome {
        let notification = Notification::new(owner.clone(), NotificationKind::Like);
        let notification = match target {
            LikeTarget::Post(post_id) => {
                let url = post_url(&post_id);
                notification.with_entity(post_id, EntityType::Post, Some(url))
            }
            LikeTarget::Comment(comment_id) => {
                let url = comment_url(&comment_id);
                notification.with_entity(comment_id, EntityType::Comment, Some(url))
            }
        };
        self.send_from(actor, notification).await
    }

    /// `actor` が `post_owner` の投稿にコメントした
    pub async fn notify_comment(
        &self,
        actor: &UserId,
        post_owner: &UserId,
        post_id: &str,
        comment: &str,
    ) -> DeliveryOutcome {
        let notification = Notification::new(post_owner.clone(), NotificationKind::Comment)
            .with_entity(post_id, EntityType::Post, Some(post_url(post_id)))
            .with_content(comment);
        self.send_from(actor, notification).await
    }

    /// `actor` が投稿の中で `mentioned` に言及した
    pub async fn notify_mention(
        &self,
        actor: &UserId,
        mentioned: &UserId,
        post_id: &str,
        content: &str,
    ) -> DeliveryOutcome {
        let notification = Notification::new(mentioned.clone(), NotificationKind::Mention)
            .with_entity(post_id, EntityType::Post, Some(post_url(post_id)))
            .with_content(content);
        self.send_from(actor, notification).await
    }

    /// `actor` が `comment_owner` のコメントに返信した
    pub async fn notify_reply(
        &self,
        actor: &UserId,
        comment_owner: &UserId,
        comment_id: &str,
        reply: &str,
    ) -> DeliveryOutcome {
        let notification = Notification::new(comment_owner.clone(), NotificationKind::Reply)
            .with_entity(comment_id, EntityType::Comment, Some(comment_url(comment_id)))
            .with_content(reply);
        self.send_from(actor, notification).await
    }

    /// `requester` が非公開アカウントの `target` にフォローリクエストを送った
    pub async fn notify_follow_request(
        &self,
        requester: &UserId,
        target: &UserId,
    ) -> DeliveryOutcome {
        let notification = Notification::new(target.clone(), NotificationKind::FollowRequest)
            .with_entity(requester.as_str(), EntityType::User, Some(user_url(requester)));
        self.send_from(requester, notification).await
    }

    /// `accepter` が `requester` のフォローリクエストを承認した
    pub async fn notify_follow_accept(
        &self,
        accepter: &UserId,
        requester: &UserId,
    ) -> DeliveryOutcome {
        let notification = Notification::new(requester.clone(), NotificationKind::FollowAccept)
            .with_entity(accepter.as_str(), EntityType::User, Some(user_url(accepter)));
        self.send_from(accepter, notification).await
    }

    /// `sender` から `receiver` へのダイレクトメッセージ
    pub async fn notify_message(
        &self,
        sender: &UserId,
        receiver: &UserId,
        preview: &str,
    ) -> DeliveryOutcome {
        let conversation = ConversationId::between(sender, receiver).to_string();
        let url = format!("/messages/{conversation}");
        let notification = Notification::new(receiver.clone(), NotificationKind::Message)
            .with_entity(conversation, EntityType::Conversation, Some(url))
            .with_content(preview);
        self.send_from(sender, notification).await
    }

    /// actor を持たないシステム通知
    pub async fn notify_system(&self, user_id: &UserId, content: &str) -> DeliveryOutcome {
        let notification =
            Notification::new(user_id.clone(), NotificationKind::System).with_content(content);
        self.send(notification).await
    }

    /// actor の表示情報を付けて配信（actor と宛先が同じなら何もしない）
    async fn send_from(&self, actor: &UserId, notification: Notification) -> DeliveryOutcome {
        if actor == &notification.user_id {
            tracing::debug!(
                user_id = %actor,
                kind = ?notification.kind,
                "Actor is the recipient, notification skipped"
            );
            return DeliveryOutcome::Skipped;
        }

        let display = self.lookup_display(actor).await;
        let notification = notification.with_actor(Actor {
            id: actor.clone(),
            display,
        });
        self.send(notification).await
    }

    async fn lookup_display(&self, user_id: &UserId) -> UserDisplay {
        match self.directory.lookup_display(user_id).await {
            Ok(display) => display,
            Err(DirectoryError::UnknownUser(_)) => {
                tracing::warn!(user_id = %user_id, "Actor not found in directory, using bare id");
                UserDisplay::fallback(user_id)
            }
        }
    }
}

fn user_url(user_id: &UserId) -> String {
    format!("/users/{user_id}")
}

fn post_url(post_id: &str) -> String {
    format!("/posts/{post_id}")
}

fn comment_url(comment_id: &str) -> String {
    format!("/comments/{comment_id}")
}
