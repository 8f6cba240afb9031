use thiserror::Error;

/// Failures surfaced by the hasher and the user store.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("user not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,
}

impl UserError {
    /// True when the underlying database rejected a write on a UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            UserError::Storage(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
