use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::debug;

use super::object_id::ObjectId;
use super::repo_types::{NewUser, User, UserRow};
use super::store::{StoreError, UserStore};

/// PostgreSQL-backed [`UserStore`]. Email uniqueness is a table constraint.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self::new(db))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

fn map_write_err(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateEmail,
        _ => StoreError::Database(e),
    }
}

fn into_user(row: Option<UserRow>) -> Result<Option<User>, StoreError> {
    row.map(User::try_from).transpose()
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, age, created_at, updated_at
            FROM users
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        debug!(count = rows.len(), "users fetched");
        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, age, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, age, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, age)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, age, created_at, updated_at
            "#,
        )
        .bind(ObjectId::new().to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_err)?;
        User::try_from(row)
    }

    async fn update_by_id(&self, id: ObjectId, user: NewUser) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
               SET name = $2, email = $3, age = $4, updated_at = now()
             WHERE id = $1
            RETURNING id, name, email, age, created_at, updated_at
            "#,
        )
        .bind(id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.age)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_err)?;
        into_user(row)
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            DELETE FROM users
            WHERE id = $1
            RETURNING id, name, email, age, created_at, updated_at
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.db)
        .await?;
        into_user(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a disposable Postgres: TEST_DATABASE_URL=postgres://... cargo test -- --ignored
    async fn test_store() -> Option<PgUserStore> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let store = PgUserStore::connect(&url, 2).await.expect("connect to test database");
        store.migrate().await.expect("migrations apply");
        Some(store)
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".into(),
            email: email.into(),
            age: 36.0,
        }
    }

    fn unique_email(tag: &str) -> String {
        format!("{tag}-{}@example.com", ObjectId::new())
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn pg_create_find_and_duplicate() {
        let Some(store) = test_store().await else { return };
        let email = unique_email("ada");

        let created = store.create(new_user(&email)).await.expect("create");
        assert_eq!(created.email, email);
        assert_eq!(store.find_by_id(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(store.find_by_email(&email).await.unwrap().map(|u| u.id), Some(created.id));

        let err = store.create(new_user(&email)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail), "{err}");

        store.delete_by_id(created.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn pg_update_replaces_and_maps_conflicts() {
        let Some(store) = test_store().await else { return };
        let a = store.create(new_user(&unique_email("a"))).await.unwrap();
        let b = store.create(new_user(&unique_email("b"))).await.unwrap();

        let renamed = NewUser {
            name: "Ada L".into(),
            email: unique_email("lovelace"),
            age: 37.0,
        };
        let updated = store.update_by_id(a.id, renamed.clone()).await.unwrap().unwrap();
        assert_eq!(updated.id, a.id);
        assert_eq!(updated.email, renamed.email);
        assert_eq!(updated.age, 37.0);
        assert_eq!(updated.created_at, a.created_at);

        let err = store.update_by_id(a.id, new_user(&b.email)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail), "{err}");

        // A missing row never reaches the unique constraint.
        let missing = store.update_by_id(ObjectId::new(), new_user(&b.email)).await.unwrap();
        assert!(missing.is_none());

        store.delete_by_id(a.id).await.unwrap();
        store.delete_by_id(b.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn pg_delete_and_list_order() {
        let Some(store) = test_store().await else { return };
        let first = store.create(new_user(&unique_email("first"))).await.unwrap();
        let second = store.create(new_user(&unique_email("second"))).await.unwrap();

        let ids: Vec<ObjectId> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.id)
            .filter(|id| *id == first.id || *id == second.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);

        let deleted = store.delete_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, first.id);
        assert!(store.find_by_id(first.id).await.unwrap().is_none());
        assert!(store.delete_by_id(first.id).await.unwrap().is_none());

        store.delete_by_id(second.id).await.unwrap();
    }
}
