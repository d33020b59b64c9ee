//! Core domain models for the realtime layer.

use serde::{Deserialize, Serialize};

use super::{
    factory::NotificationIdFactory,
    value_object::{NotificationId, Timestamp, UserId},
};

/// What happened to trigger a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Follow,
    Like,
    Comment,
    Mention,
    Reply,
    FollowRequest,
    FollowAccept,
    Message,
    System,
}

/// Kind of entity a notification points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Post,
    Comment,
    User,
    Conversation,
}

/// Display metadata of a user, as supplied by the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDisplay {
    /// Display name
    pub name: String,
    /// Handle (`@username` without the `@`)
    pub username: String,
    /// Avatar image URL, if the user set one
    pub avatar_url: Option<String>,
}

impl UserDisplay {
    /// Placeholder used when the directory cannot resolve a user.
    pub fn fallback(user_id: &UserId) -> Self {
        Self {
            name: user_id.as_str().to_string(),
            username: user_id.as_str().to_string(),
            avatar_url: None,
        }
    }
}

/// The user who initiated the event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub display: UserDisplay,
}

/// Reference to the entity a notification is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: String,
    pub entity_type: EntityType,
    pub url: Option<String>,
}

/// A notification record addressed to one user.
///
/// `id` and `created_at` may be left unset by the code that builds the record;
/// they are filled in by [`Notification::stamped`] right before delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Option<NotificationId>,
    /// Target user
    pub user_id: UserId,
    /// Initiator; `None` for system notifications
    pub actor: Option<Actor>,
    pub kind: NotificationKind,
    pub entity: Option<EntityRef>,
    pub content: Option<String>,
    pub read: bool,
    pub created_at: Option<Timestamp>,
}

impl Notification {
    /// Create an unread notification of `kind` for `user_id`.
    pub fn new(user_id: UserId, kind: NotificationKind) -> Self {
        Self {
            id: None,
            user_id,
            actor: None,
            kind,
            entity: None,
            content: None,
            read: false,
            created_at: None,
        }
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn with_entity(
        mut self,
        id: impl Into<String>,
        entity_type: EntityType,
        url: Option<String>,
    ) -> Self {
        self.entity = Some(EntityRef {
            id: id.into(),
            entity_type,
            url,
        });
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Fill `id` and `created_at` if they are absent.
    pub fn stamped(mut self) -> Self {
        if self.id.is_none() {
            self.id = Some(NotificationIdFactory::generate());
        }
        if self.created_at.is_none() {
            self.created_at = Some(Timestamp::now());
        }
        self
    }

    /// Copy of this record addressed to `user_id`, with a fresh id.
    pub fn for_recipient(&self, user_id: UserId) -> Self {
        Self {
            id: Some(NotificationIdFactory::generate()),
            user_id,
            ..self.clone()
        }
    }

    /// Whether the actor and the target are the same user.
    pub fn is_self_addressed(&self) -> bool {
        self.actor
            .as_ref()
            .is_some_and(|actor| actor.id == self.user_id)
    }
}
