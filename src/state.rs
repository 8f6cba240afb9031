use std::sync::Arc;

use anyhow::Context;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::users::{password::CredentialHasher, repo::SqliteUserRepository, services::UserStore};

#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;

        Self::from_parts(db, config)
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>) -> anyhow::Result<Self> {
        let hasher = CredentialHasher::new(&config.hasher).context("build password hasher")?;
        let users = UserStore::new(Arc::new(SqliteUserRepository::new(db)), hasher);
        Ok(Self { users, config })
    }
}

#[cfg(test)]
impl AppState {
    /// State over a migrated in-memory database with cheap hashing params.
    pub async fn fake() -> Self {
        let db = crate::users::repo::tests::memory_pool().await;
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            db_max_connections: 1,
            hasher: crate::config::HasherConfig {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
                max_password_bytes: 128,
            },
        });
        Self::from_parts(db, config).expect("fake state")
    }
}
