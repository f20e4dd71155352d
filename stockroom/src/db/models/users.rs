use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::db::record::{Record, SqlValue};

/// A registered account.
///
/// The session token and its expiry live on the row itself; a user has at
/// most one active session at a time.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub token: Option<String>,
    pub token_expired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &["name", "email", "password_hash", "token", "token_expired_at"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.name.as_str().into(),
            self.email.as_str().into(),
            self.password_hash.as_str().into(),
            self.token.clone().into(),
            self.token_expired_at.into(),
        ]
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = Some(at);
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }
}
