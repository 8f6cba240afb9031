use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::HasherConfig;
use crate::users::{
    error::UserError,
    repo_types::{HashedPassword, PlainPassword},
};

/// Argon2id hasher. Holds only immutable cost parameters, so clones can be
/// shared freely across tasks.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    max_password_bytes: usize,
}

impl CredentialHasher {
    pub fn new(cfg: &HasherConfig) -> Result<Self, UserError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| {
                error!(error = %e, "invalid argon2 params");
                UserError::Hashing(e.to_string())
            })?;
        Ok(Self {
            params,
            max_password_bytes: cfg.max_password_bytes,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &PlainPassword) -> Result<HashedPassword, UserError> {
        let bytes = plain.expose().as_bytes();
        if bytes.len() > self.max_password_bytes {
            return Err(UserError::Hashing(format!(
                "password exceeds {} bytes",
                self.max_password_bytes
            )));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(bytes, &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                UserError::Hashing(e.to_string())
            })?
            .to_string();
        Ok(HashedPassword::from_stored(hash))
    }

    /// `Ok(false)` on mismatch. Cost parameters come from the stored hash.
    /// Anything this hasher could not have produced is `MalformedHash`.
    pub fn verify(
        &self,
        plain: &PlainPassword,
        hash: &HashedPassword,
    ) -> Result<bool, UserError> {
        let parsed = PasswordHash::new(hash.as_str()).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            UserError::MalformedHash(e.to_string())
        })?;
        if parsed.algorithm != Algorithm::Argon2id.ident() {
            error!(algorithm = %parsed.algorithm, "unexpected hash algorithm");
            return Err(UserError::MalformedHash(format!(
                "unsupported algorithm {}",
                parsed.algorithm
            )));
        }
        if parsed.salt.is_none() || parsed.hash.is_none() {
            error!("stored hash lacks salt or output");
            return Err(UserError::MalformedHash("missing salt or hash output".into()));
        }

        match self.argon2().verify_password(plain.expose().as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => {
                error!(error = %e, "argon2 verify_password error");
                Err(UserError::MalformedHash(e.to_string()))
            }
        }
    }
}
