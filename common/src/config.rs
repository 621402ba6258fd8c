//! Environment-driven application configuration.
//!
//! All values are read once at startup. Database credentials are required,
//! everything else has a default.

use std::time::Duration;

use crate::errors::{AppError, AppResult};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 5;

/// Credentials used to build the database connection pool.
#[derive(Clone)]
pub struct DatabaseCredentials {
    pub user: String,
    pub password: String,
    /// PostgreSQL connection string.
    pub dsn: String,
}

impl std::fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("user", &self.user)
            .field("password", &"***")
            .field("dsn", &self.dsn)
            .finish()
    }
}

/// Application configuration shared by the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    /// Prefix applied to every route, e.g. `/api/v1`. Empty means no prefix.
    pub root_path: String,
    pub database: DatabaseCredentials,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
    /// When set, a query returning no rows yields an empty listing instead
    /// of a failed request.
    pub allow_empty_results: bool,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    /// Returns `AppError::Config` when a database credential is missing.
    pub fn load_with_service(service_name: &str) -> AppResult<Self> {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |primary: &str, fallback: &str| -> AppResult<String> {
            lookup(primary)
                .or_else(|| lookup(fallback))
                .filter(|v| !v.is_empty())
                .ok_or_else(|| {
                    AppError::Config(format!("missing environment variable {primary} (or {fallback})"))
                })
        };

        let database = DatabaseCredentials {
            user: required("DB_USER", "USER")?,
            password: required("DB_PASSWORD", "PASSWORD")?,
            dsn: required("DB_DSN", "DSN")?,
        };

        Ok(Self {
            service_name: service_name.to_string(),
            host: lookup("SERVER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "SERVER_PORT", DEFAULT_PORT),
            root_path: normalize_root_path(&lookup("ROOT_PATH").unwrap_or_default()),
            database,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            connect_timeout_secs: parse_or(
                &lookup,
                "DB_CONNECT_TIMEOUT_SECS",
                DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
            shutdown_grace_secs: parse_or(
                &lookup,
                "DB_SHUTDOWN_GRACE_SECS",
                DEFAULT_SHUTDOWN_GRACE_SECS,
            ),
            allow_empty_results: parse_or(&lookup, "ALLOW_EMPTY_RESULTS", false),
        })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }

    /// Address the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key).and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Normalises a route prefix to `""` or `/segment[/segment...]`.
pub fn normalize_root_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
