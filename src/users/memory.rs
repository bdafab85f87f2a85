use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::object_id::ObjectId;
use super::repo_types::{NewUser, User};
use super::store::{StoreError, UserStore};

/// In-process [`UserStore`] for local runs and tests.
///
/// All writes go through one lock, so the email check and the write are a
/// single step and duplicates cannot slip in between.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let created = User {
            id: ObjectId::new(),
            name: user.name,
            email: user.email,
            age: user.age,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update_by_id(&self, id: ObjectId, user: NewUser) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        let Some(idx) = users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        if users.iter().any(|u| u.id != id && u.email == user.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let existing = &mut users[idx];
        existing.name = user.name;
        existing.email = user.email;
        existing.age = user.age;
        existing.updated_at = OffsetDateTime::now_utc();
        Ok(Some(existing.clone()))
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        let mut users = self.users.write().await;
        Ok(users
            .iter()
            .position(|u| u.id == id)
            .map(|idx| users.remove(idx)))
    }
}
