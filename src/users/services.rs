use std::sync::Arc;

use tracing::{debug, error, info, instrument, warn};

use crate::users::{
    error::UserError,
    password::CredentialHasher,
    repo::UserRepository,
    repo_types::{Credentials, NewUser, User},
};

/// Persistence and login checks for `User` records.
///
/// Every call is a single storage round-trip; nothing is cached between
/// calls, and no transactions are opened. Email uniqueness is left to the
/// database constraint.
#[derive(Clone)]
pub struct UserStore {
    repo: Arc<dyn UserRepository>,
    hasher: CredentialHasher,
}

impl UserStore {
    pub fn new(repo: Arc<dyn UserRepository>, hasher: CredentialHasher) -> Self {
        Self { repo, hasher }
    }

    /// Hash the password, insert the row and back-fill `user.id`.
    /// On any failure `user.id` is left as it was.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn save(&self, user: &mut NewUser) -> Result<(), UserError> {
        let hash = self.hasher.hash(&user.password)?;
        let id = self
            .repo
            .insert(&user.username, &user.email, &hash)
            .await
            .map_err(|e| {
                error!(error = %e, "insert user failed");
                e
            })?;
        user.id = id;
        info!(user_id = id, "user saved");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<User, UserError> {
        self.repo
            .find_by_email(email)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// All users, without password hashes. Order is whatever storage yields.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let users = self.repo.list_all().await?;
        debug!(count = users.len(), "listed users");
        Ok(users)
    }

    /// Returns the stored user's id when the password matches.
    ///
    /// `NotFound` and `InvalidCredentials` are distinct here; anything shown
    /// to end users should merge them.
    #[instrument(skip(self, candidate), fields(email = %candidate.email))]
    pub async fn validate_credentials(&self, candidate: &Credentials) -> Result<i64, UserError> {
        let stored = self.get_by_email(&candidate.email).await?;
        // A row without a hash cannot come from get_by_email.
        let hash = stored
            .password
            .as_ref()
            .ok_or_else(|| UserError::MalformedHash("missing password hash".into()))?;

        if !self.hasher.verify(&candidate.password, hash)? {
            warn!(user_id = stored.id, "password mismatch");
            return Err(UserError::InvalidCredentials);
        }
        Ok(stored.id)
    }
}
