//! Application state for project service.

use std::sync::Arc;

use common::config::AppConfig;

use crate::executor::{EmptyPolicy, QueryExecutor, SqlxExecutor};
use crate::pool_manager::PoolManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool_manager: Arc<PoolManager>,
    pub executor: Arc<dyn QueryExecutor>,
    pub empty_policy: EmptyPolicy,
}

impl AppState {
    /// Creates a new application state. The pool still has to be initialized.
    pub fn new(config: AppConfig) -> Self {
        let pool_manager = Arc::new(PoolManager::new(config.clone()));
        let executor = Arc::new(SqlxExecutor::new(pool_manager.clone()));
        Self::with_executor(config, pool_manager, executor)
    }

    pub fn with_executor(
        config: AppConfig,
        pool_manager: Arc<PoolManager>,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        let empty_policy = if config.allow_empty_results {
            EmptyPolicy::Allow
        } else {
            EmptyPolicy::Fail
        };
        Self {
            empty_policy,
            config: Arc::new(config),
            pool_manager,
            executor,
        }
    }
}

#[cfg(test)]
pub fn test_config() -> AppConfig {
    AppConfig::from_lookup("project-service", |key| match key {
        "DB_USER" => Some("web".to_string()),
        "DB_PASSWORD" => Some("secret".to_string()),
        "DB_DSN" => Some("postgres://localhost:5432/tip".to_string()),
        _ => None,
    })
    .expect("test config")
}
