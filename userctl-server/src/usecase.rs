//! User usecase - the transaction boundary
//!
//! Reads go straight to a pooled connection. Every write opens its own
//! transaction, hands it to the repository, and commits on success or
//! rolls back on failure. Repository errors are returned unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use crate::db::{DbError, UserRepository};
use crate::models::{User, UserPatch};

/// Operations the HTTP layer drives
#[async_trait]
pub trait UserUsecase: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<User>, DbError>;
    async fn create(&self, user: &User) -> Result<u64, DbError>;
    async fn update(&self, user: &User) -> Result<u64, DbError>;
    async fn patch(&self, id: &str, patch: &UserPatch) -> Result<u64, DbError>;
    async fn delete(&self, id: &str) -> Result<u64, DbError>;
}

/// Transactional user service over a repository
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(pool: PgPool, repository: Arc<dyn UserRepository>) -> Self {
        Self { pool, repository }
    }

    async fn begin(&self, op: &'static str) -> Result<Transaction<'static, Postgres>, DbError> {
        let tx = self.pool.begin().await?;
        debug!(op, "transaction started");
        Ok(tx)
    }
}

/// Commit when the write succeeded, otherwise roll back and return the
/// original error.
async fn end(
    tx: Transaction<'static, Postgres>,
    op: &'static str,
    result: Result<u64, DbError>,
) -> Result<u64, DbError> {
    match result {
        Ok(rows) => {
            tx.commit().await?;
            debug!(op, rows, "transaction committed");
            Ok(rows)
        }
        Err(err) => {
            match tx.rollback().await {
                Ok(()) => debug!(op, error = %err, "transaction rolled back"),
                Err(rollback) => warn!(op, error = %err, rollback_error = %rollback, "rollback failed"),
            }
            Err(err)
        }
    }
}

#[async_trait]
impl UserUsecase for UserService {
    async fn load(&self, id: &str) -> Result<Option<User>, DbError> {
        let mut conn = self.pool.acquire().await?;
        self.repository.load(&mut conn, id).await
    }

    async fn create(&self, user: &User) -> Result<u64, DbError> {
        let mut tx = self.begin("create").await?;
        let result = self.repository.create(&mut tx, user).await;
        end(tx, "create", result).await
    }

    async fn update(&self, user: &User) -> Result<u64, DbError> {
        let mut tx = self.begin("update").await?;
        let result = self.repository.update(&mut tx, user).await;
        end(tx, "update", result).await
    }

    async fn patch(&self, id: &str, patch: &UserPatch) -> Result<u64, DbError> {
        let mut tx = self.begin("patch").await?;
        let result = self.repository.patch(&mut tx, id, patch).await;
        end(tx, "patch", result).await
    }

    async fn delete(&self, id: &str) -> Result<u64, DbError> {
        let mut tx = self.begin("delete").await?;
        let result = self.repository.delete(&mut tx, id).await;
        end(tx, "delete", result).await
    }
}
