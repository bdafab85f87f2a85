use serde::{Serialize, Serializer};
use sqlx::FromRow;
use time::OffsetDateTime;

use super::object_id::ObjectId;
use super::store::StoreError;

/// User record as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "serialize_age")]
    pub age: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Whole ages go out as JSON integers (`36`, not `36.0`).
fn serialize_age<S: Serializer>(age: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if age.fract() == 0.0 && age.abs() <= MAX_EXACT {
        serializer.serialize_i64(*age as i64)
    } else {
        serializer.serialize_f64(*age)
    }
}

/// A validated record, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: f64,
}

/// Row shape of the `users` table.
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let id = r
            .id
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("bad id in users row: {:?}", r.id)))?;
        Ok(Self {
            id,
            name: r.name,
            email: r.email,
            age: r.age,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}
