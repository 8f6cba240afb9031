use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Plaintext credential. Lives only in memory and is never written to storage.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct PlainPassword(String);

impl PlainPassword {
    pub fn new(plain: impl Into<String>) -> Self {
        Self(plain.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword(***)")
    }
}

/// PHC-format argon2 hash, as stored in `users.password`.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Wraps a value read back from storage. No validation happens here;
    /// a malformed value is reported when it is verified.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashedPassword(..)")
    }
}

/// A user that has not been saved yet. `id` is 0 until `save` assigns it.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: PlainPassword,
}

impl NewUser {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: PlainPassword,
    ) -> Self {
        Self {
            id: 0,
            username: username.into(),
            email: email.into(),
            password,
        }
    }
}

/// A login attempt.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: PlainPassword,
}

/// User record loaded from storage.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<HashedPassword>, // None in bulk listings
}

/// Full `users` row.
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            password: Some(HashedPassword::from_stored(r.password)),
        }
    }
}

/// `users` row without the hash column.
#[derive(Debug, FromRow)]
pub(crate) struct UserListRow {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<UserListRow> for User {
    fn from(r: UserListRow) -> Self {
        Self {
            id: r.id,
            username: r.username,
            email: r.email,
            password: None,
        }
    }
}
