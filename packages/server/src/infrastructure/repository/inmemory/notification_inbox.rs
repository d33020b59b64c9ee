//! InMemory Notification Inbox 実装
//!
//! リアルタイム配信できなかった通知をユーザーごとに保持します。
//! 保持件数には上限があり、超えた場合は古いものから破棄します。

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Notification, NotificationInbox, UserId};

/// Default number of pending notifications kept per user
pub const DEFAULT_INBOX_CAPACITY: usize = 100;

/// インメモリ Notification Inbox 実装
pub struct InMemoryNotificationInbox {
    pending: Mutex<HashMap<UserId, VecDeque<Notification>>>,
    /// ユーザーごとの保持上限
    capacity: usize,
}

impl InMemoryNotificationInbox {
    /// 新しい InMemoryNotificationInbox を作成
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }
}

impl Default for InMemoryNotificationInbox {
    fn default() -> Self {
        Self::new(DEFAULT_INBOX_CAPACITY)
    }
}

#[async_trait]
impl NotificationInbox for InMemoryNotificationInbox {
    async fn store(&self, notification: Notification) {
        let mut pending = self.pending.lock().await;
        let queue = pending.entry(notification.user_id.clone()).or_default();
        if queue.len() >= self.capacity
            && let Some(dropped) = queue.pop_front()
        {
            tracing::debug!(
                user_id = %dropped.user_id,
                "Inbox full, dropped oldest pending notification"
            );
        }
        queue.push_back(notification);
    }

    async fn take_pending(&self, user_id: &UserId) -> Vec<Notification> {
        let mut pending = self.pending.lock().await;
        pending
            .remove(user_id)
            .map(Vec::from)
            .unwrap_or_default()
    }
}
