//! InMemory User Directory 実装
//!
//! ユーザーの表示情報（名前・ハンドル・アバター）を保持します。
//! 起動時にユーザー一覧ファイル（`--users-file`）から読み込むか、テストから登録します。
//! 本番ではユーザーテーブルを持つ永続化層がこの役割を担います。

use std::{collections::HashMap, path::Path};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::{
    domain::{DirectoryError, UserDirectory, UserDisplay, UserId, ValueObjectError},
    infrastructure::dto::directory::UserRecordDto,
};

/// ユーザー一覧ファイルの読み込みエラー
#[derive(Debug, Error)]
pub enum UserSeedError {
    #[error("Failed to read users file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse users file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid user in users file: {0}")]
    InvalidUser(#[from] ValueObjectError),
}

/// インメモリ User Directory 実装
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserDisplay>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 表示情報を登録済みの状態で作成
    pub fn with_users(users: impl IntoIterator<Item = (UserId, UserDisplay)>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().collect()),
        }
    }

    /// JSON 配列（[`UserRecordDto`] の並び）から作成
    ///
    /// 同じ ID が複数回現れた場合は後のものが優先されます。
    pub fn from_json(json: &str) -> Result<Self, UserSeedError> {
        let records: Vec<UserRecordDto> = serde_json::from_str(json)?;
        let users = records
            .into_iter()
            .map(UserRecordDto::into_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_users(users))
    }

    /// ユーザー一覧ファイルを読み込んで作成
    pub async fn load(path: &Path) -> Result<Self, UserSeedError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| UserSeedError::Read {
                path: path.display().to_string(),
                source,
            })?;
        let directory = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            users = directory.users.read().await.len(),
            "User directory loaded"
        );
        Ok(directory)
    }

    /// ユーザーの表示情報を登録（既存の場合は上書き）
    pub async fn upsert(&self, user_id: UserId, display: UserDisplay) {
        let mut users = self.users.write().await;
        users.insert(user_id, display);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup_display(&self, user_id: &UserId) -> Result<UserDisplay, DirectoryError> {
        let users = self.users.read().await;
        users
            .get(user_id)
            .cloned()
            .ok_or_else(|| DirectoryError::UnknownUser(user_id.clone()))
    }
}
