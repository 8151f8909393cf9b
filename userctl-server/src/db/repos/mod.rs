//! Repository implementations for database access
//!
//! Repositories never open transactions: the caller passes the
//! connection (pooled or transactional) into every call.

pub mod users;

pub use users::{PgUserRepository, UserRepository};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("duplicate key: {resource} '{id}'")]
    Duplicate { resource: &'static str, id: String },
}

impl DbError {
    /// Reclassify unique violations as duplicates of `resource`/`id`.
    pub(crate) fn on_duplicate(err: sqlx::Error, resource: &'static str, id: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::Duplicate {
                resource,
                id: id.to_owned(),
            },
            _ => Self::Sqlx(err),
        }
    }
}
