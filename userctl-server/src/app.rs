//! Application wiring
//!
//! Builds every component from `Settings` once, at startup, and hands the
//! result to the HTTP layer. Nothing here is looked up globally.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Settings;
use crate::db::{self, PgUserRepository, PgUserSearch};
use crate::health::{HealthChecker, SqlHealthChecker};
use crate::http::{AppState, ServerConfig};
use crate::models::UserValidator;
use crate::usecase::UserService;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database setup failed: {0}")]
    Database(#[from] sqlx::Error),
}

/// Everything a running server needs
pub struct ApplicationContext {
    pub pool: PgPool,
    pub state: AppState,
}

impl ApplicationContext {
    /// Connect to the database, optionally migrate, and assemble the
    /// repository, usecase, search, validator and health checker.
    pub async fn new(settings: &Settings) -> Result<Self, AppError> {
        let pool = db::create_pool_with_options(
            &settings.database.url,
            settings.database.max_connections,
        )
        .await?;
        tracing::info!(
            max_connections = settings.database.max_connections,
            "database pool ready"
        );

        if settings.database.migrate {
            db::migrations::run(&pool).await?;
            tracing::info!("schema migrated");
        }

        let repository = Arc::new(PgUserRepository::new());
        let users = Arc::new(UserService::new(pool.clone(), repository));
        let search = Arc::new(PgUserSearch::new(pool.clone()));
        let sql: Arc<dyn HealthChecker> = Arc::new(SqlHealthChecker::with_timeout(
            pool.clone(),
            settings.health.timeout(),
        ));

        let state = AppState {
            users,
            search,
            health: vec![sql],
            validator: UserValidator::new(),
            status: settings.status.clone(),
            action: settings.action.clone(),
            search_config: settings.search.clone(),
        };

        Ok(Self { pool, state })
    }
}

pub fn server_config(settings: &Settings) -> ServerConfig {
    ServerConfig {
        bind_addr: settings.server.bind,
        cors_permissive: settings.server.cors_permissive,
    }
}
