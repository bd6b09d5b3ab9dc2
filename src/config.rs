//! # config — read configuration from environment variables
//!
//! Everything the dashboard needs at runtime lives in one [`AppConfig`] that
//! is built once in `main` and handed to each component at construction.
//! Nothing here is a compile-time literal: database URI, model paths and the
//! session secret all come from the environment (or `.env` via `dotenvy`).

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{bail, Context};

/// Minimum HMAC key length accepted for `SESSION_SECRET`.
const MIN_SECRET_LEN: usize = 16;

/// Full runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr:          SocketAddr,
    pub database:           DatabaseConfig,
    pub models:             ModelPaths,
    pub session:            SessionConfig,
    pub cache:              CacheConfig,
    /// Raw `CREDENTIALS` value: `user:Display Name:<argon2 hash>;...`
    pub credentials:        String,
    /// Rows shown in the data preview table.
    pub preview_rows:       usize,
    /// Deadline for a whole HTTP request (one render pass).
    pub request_timeout:    Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url:             String,
    pub connect_timeout: Duration,
    pub query_timeout:   Duration,
}

/// Locations of the two pre-trained model artifacts.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub yield_model: PathBuf,
    pub price_model: PathBuf,
}

#[derive(Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub secret:      String,
    pub expiry:      chrono::Duration,
}

// Keep the secret out of logs and panics.
impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("cookie_name", &self.cookie_name)
            .field("secret", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl:         Duration,
    pub max_entries: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:3000")
            .parse()
            .context("BIND_ADDR must be a socket address, e.g. 0.0.0.0:3000")?;

        let secret = std::env::var("SESSION_SECRET")
            .context("SESSION_SECRET environment variable is required")?;
        if secret.len() < MIN_SECRET_LEN {
            bail!("SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes long");
        }

        let credentials = std::env::var("CREDENTIALS")
            .context("CREDENTIALS environment variable is required")?;

        let expiry_days: i64 = env_parse("SESSION_EXPIRY_DAYS", 1)?;
        if expiry_days <= 0 {
            bail!("SESSION_EXPIRY_DAYS must be positive");
        }

        Ok(Self {
            bind_addr,
            database: DatabaseConfig::from_env()?,
            models: ModelPaths {
                yield_model: env_or("YIELD_MODEL_PATH", "artifacts/yield_model.json").into(),
                price_model: env_or("PRICE_MODEL_PATH", "artifacts/price_model.json").into(),
            },
            session: SessionConfig {
                cookie_name: env_or("SESSION_COOKIE_NAME", "aqua_cookie"),
                secret,
                expiry:      chrono::Duration::days(expiry_days),
            },
            cache: CacheConfig {
                ttl:         Duration::from_secs(env_parse("CACHE_TTL_SECS", 600)?),
                max_entries: env_parse("CACHE_MAX_ENTRIES", 256)?,
            },
            credentials,
            preview_rows:    env_parse("PREVIEW_ROWS", 5)?,
            request_timeout: Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", 30)?),
        })
    }
}

impl DatabaseConfig {
    /// Only the database settings; `init-db` needs nothing else.
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            url:             env_or("DATABASE_URL", "sqlite://aquadb.sqlite"),
            connect_timeout: Duration::from_secs(env_parse("DB_CONNECT_TIMEOUT_SECS", 5)?),
            query_timeout:   Duration::from_secs(env_parse("DB_QUERY_TIMEOUT_SECS", 10)?),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl AppConfig {
    /// Config used by unit tests; never touches the process environment.
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".parse().expect("valid addr"),
            database: DatabaseConfig {
                url:             "sqlite::memory:".into(),
                connect_timeout: Duration::from_secs(1),
                query_timeout:   Duration::from_secs(1),
            },
            models: ModelPaths {
                yield_model: "artifacts/yield_model.json".into(),
                price_model: "artifacts/price_model.json".into(),
            },
            session: SessionConfig {
                cookie_name: "aqua_cookie".into(),
                secret:      "test-secret-at-least-16-bytes".into(),
                expiry:      chrono::Duration::days(1),
            },
            cache: CacheConfig {
                ttl:         Duration::from_secs(60),
                max_entries: 16,
            },
            credentials:     String::new(),
            preview_rows:    5,
            request_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_to_default_when_unset() {
        let v: u64 = env_parse("AQUACAST_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn session_config_debug_hides_secret() {
        let cfg = AppConfig::for_tests();
        let printed = format!("{:?}", cfg.session);
        assert!(!printed.contains("test-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
