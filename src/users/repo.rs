use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::users::{
    error::UserError,
    repo_types::{HashedPassword, User, UserListRow, UserRow},
};

/// Row-level access to the `users` table. Hashing is not done here; callers
/// hand in an already hashed password.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a row and return the generated id.
    async fn insert(
        &self,
        username: &str,
        email: &str,
        password: &HashedPassword,
    ) -> Result<i64, UserError>;

    /// Exact-match lookup, including the stored hash. The lowest id wins if
    /// the email is duplicated.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;

    /// Every row in storage order, without hashes.
    async fn list_all(&self) -> Result<Vec<User>, UserError>;
}

#[derive(Clone)]
pub struct SqliteUserRepository {
    db: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(
        &self,
        username: &str,
        email: &str,
        password: &HashedPassword,
    ) -> Result<i64, UserError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password.as_str())
        .execute(&self.db)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password
            FROM users
            WHERE email = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(User::from))
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query_as::<_, UserListRow>(
            r#"
            SELECT id, username, email
            FROM users
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}
