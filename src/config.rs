use serde::Deserialize;

/// Argon2 cost parameters and the plaintext size limit.
#[derive(Debug, Clone, Deserialize)]
pub struct HasherConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub max_password_bytes: usize,
}

impl Default for HasherConfig {
    fn default() -> Self {
        // OWASP minimum for argon2id
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
            max_password_bytes: 4096,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub hasher: HasherConfig,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let defaults = HasherConfig::default();
        let hasher = HasherConfig {
            memory_kib: env_or("ARGON2_MEMORY_KIB", defaults.memory_kib),
            iterations: env_or("ARGON2_ITERATIONS", defaults.iterations),
            parallelism: env_or("ARGON2_PARALLELISM", defaults.parallelism),
            max_password_bytes: env_or("PASSWORD_MAX_BYTES", defaults.max_password_bytes),
        };
        Ok(Self {
            database_url,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            hasher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_on_garbage() {
        std::env::set_var("USERSTORE_TEST_GARBAGE", "not-a-number");
        assert_eq!(env_or("USERSTORE_TEST_GARBAGE", 7u32), 7);
        std::env::set_var("USERSTORE_TEST_NUMBER", "42");
        assert_eq!(env_or("USERSTORE_TEST_NUMBER", 7u32), 42);
        assert_eq!(env_or("USERSTORE_TEST_MISSING_KEY", 3usize), 3);
    }
}
