use async_trait::async_trait;
use thiserror::Error;

use super::object_id::ObjectId;
use super::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

/// Persistence for user records, keyed by [`ObjectId`].
///
/// `update_by_id` and `delete_by_id` return `None` when no record has the id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;
    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn update_by_id(&self, id: ObjectId, user: NewUser) -> Result<Option<User>, StoreError>;
    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError>;
}
