//! Database connection pool manager.
//!
//! Owns the single PostgreSQL pool of the process. The pool moves through
//! uninitialized, initializing, ready and closed. It is created once at
//! startup and closed once at shutdown; callers outside the ready window get
//! `AppError::PoolNotReady`.

use std::str::FromStr;

use common::config::{AppConfig, DatabaseCredentials};
use common::errors::{AppError, AppResult};
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use tokio::sync::RwLock;
use utoipa::ToSchema;

enum PoolState {
    Uninitialized,
    /// A connect is in flight. The lock is not held while it runs.
    Initializing,
    Ready(PgPool),
    Closed,
}

/// Snapshot of the pool for health reporting.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolStats {
    /// Whether requests can currently acquire connections.
    pub ready: bool,
    /// Open connections, idle or in use.
    pub size: u32,
    pub idle: u32,
    pub max_size: u32,
}

/// Manages the lifetime of the connection pool.
pub struct PoolManager {
    config: AppConfig,
    state: RwLock<PoolState>,
}

impl PoolManager {
    /// Creates a manager with no pool yet.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: RwLock::new(PoolState::Uninitialized),
        }
    }

    /// Connects the pool using the configured credentials.
    ///
    /// The state lock is only held to check and record the transition, so
    /// `pool()` and `stats()` keep answering while the connect is pending.
    /// A failed connect returns the manager to uninitialized.
    ///
    /// # Errors
    /// Returns `AppError::PoolInit` if the credentials are invalid, the
    /// database cannot be reached, another initialize is in flight or has
    /// already succeeded, or shutdown ran before the connect finished.
    pub async fn initialize(&self) -> AppResult<()> {
        {
            let mut state = self.state.write().await;
            if !matches!(*state, PoolState::Uninitialized) {
                return Err(AppError::PoolInit(
                    "connection pool can only be initialized once".into(),
                ));
            }
            *state = PoolState::Initializing;
        }

        let connected = match connect_options(&self.config.database) {
            Ok(options) => self
                .pool_options()
                .connect_with(options)
                .await
                .map_err(|e| AppError::PoolInit(e.to_string())),
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        let still_initializing = matches!(*state, PoolState::Initializing);
        match (connected, still_initializing) {
            (Ok(pool), true) => {
                tracing::info!(
                    user = %self.config.database.user,
                    max_connections = self.config.max_connections,
                    "Connection pool initialized"
                );
                *state = PoolState::Ready(pool);
                Ok(())
            }
            (Ok(pool), false) => {
                // shutdown ran while connecting
                drop(state);
                pool.close().await;
                Err(AppError::PoolInit(
                    "connection pool was shut down during initialization".into(),
                ))
            }
            (Err(e), true) => {
                *state = PoolState::Uninitialized;
                Err(e)
            }
            (Err(e), false) => Err(e),
        }
    }

    /// Installs a pool whose connections are opened on first use.
    #[cfg(test)]
    pub async fn initialize_lazy(&self) -> AppResult<()> {
        let options = connect_options(&self.config.database)?;
        let pool = self.pool_options().connect_lazy_with(options);
        *self.state.write().await = PoolState::Ready(pool);
        Ok(())
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.config.connect_timeout())
    }

    /// Returns a handle to the pool.
    ///
    /// # Errors
    /// Returns `AppError::PoolNotReady` before `initialize` or after `shutdown`.
    pub async fn pool(&self) -> AppResult<PgPool> {
        match &*self.state.read().await {
            PoolState::Ready(pool) => Ok(pool.clone()),
            PoolState::Uninitialized | PoolState::Initializing | PoolState::Closed => {
                Err(AppError::PoolNotReady)
            }
        }
    }

    /// Closes the pool. Connections still checked out when the grace period
    /// ends are abandoned. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let pool = {
            let mut state = self.state.write().await;
            match std::mem::replace(&mut *state, PoolState::Closed) {
                PoolState::Ready(pool) => pool,
                PoolState::Uninitialized | PoolState::Initializing | PoolState::Closed => {
                    tracing::debug!("Connection pool shutdown skipped, no open pool");
                    return;
                }
            }
        };

        let grace = self.config.shutdown_grace();
        match tokio::time::timeout(grace, pool.close()).await {
            Ok(()) => tracing::info!("Connection pool closed"),
            Err(_) => tracing::warn!(
                grace_secs = grace.as_secs(),
                in_use = pool.size().saturating_sub(pool.num_idle() as u32),
                "Connection pool close timed out, abandoning in-flight connections"
            ),
        }
    }

    pub async fn stats(&self) -> PoolStats {
        match &*self.state.read().await {
            PoolState::Ready(pool) => PoolStats {
                ready: true,
                size: pool.size(),
                idle: pool.num_idle() as u32,
                max_size: self.config.max_connections,
            },
            PoolState::Uninitialized | PoolState::Initializing | PoolState::Closed => PoolStats {
                ready: false,
                size: 0,
                idle: 0,
                max_size: self.config.max_connections,
            },
        }
    }
}

/// Builds connect options from the DSN, with user and password taking
/// precedence over anything embedded in it.
fn connect_options(credentials: &DatabaseCredentials) -> AppResult<PgConnectOptions> {
    let options = PgConnectOptions::from_str(&credentials.dsn)
        .map_err(|e| AppError::PoolInit(format!("invalid DSN: {e}")))?;
    Ok(options
        .username(&credentials.user)
        .password(&credentials.password))
}
