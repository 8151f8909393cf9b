//! User repository
//!
//! Translates entity operations into parameterised SQL:
//! - load: single-row select by primary key
//! - create/update: all columns
//! - patch: supplied columns only
//! - delete: by primary key
//!
//! Writes report rows affected; 0 means no row matched.

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::DbError;
use crate::models::{User, UserPatch};

const LOAD_SQL: &str =
    "SELECT id, username, email, phone, date_of_birth FROM users WHERE id = $1 LIMIT 1";

const DELETE_SQL: &str = "DELETE FROM users WHERE id = $1";

/// Persistence operations for users.
///
/// Object-safe; every call receives the connection to run on.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Load a user by id. `None` when no row matches.
    async fn load(&self, conn: &mut PgConnection, id: &str) -> Result<Option<User>, DbError>;

    /// Insert all columns of `user`.
    async fn create(&self, conn: &mut PgConnection, user: &User) -> Result<u64, DbError>;

    /// Replace every column of the row keyed by `user.id`.
    async fn update(&self, conn: &mut PgConnection, user: &User) -> Result<u64, DbError>;

    /// Write only the columns `patch` supplies.
    async fn patch(
        &self,
        conn: &mut PgConnection,
        id: &str,
        patch: &UserPatch,
    ) -> Result<u64, DbError>;

    /// Delete by id.
    async fn delete(&self, conn: &mut PgConnection, id: &str) -> Result<u64, DbError>;
}

/// PostgreSQL user repository
#[derive(Debug, Clone, Copy, Default)]
pub struct PgUserRepository;

impl PgUserRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn load(&self, conn: &mut PgConnection, id: &str) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>(LOAD_SQL)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(user)
    }

    async fn create(&self, conn: &mut PgConnection, user: &User) -> Result<u64, DbError> {
        let result = insert_query(user)
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::on_duplicate(e, "user", &user.id))?;
        Ok(result.rows_affected())
    }

    async fn update(&self, conn: &mut PgConnection, user: &User) -> Result<u64, DbError> {
        let result = update_query(user).build().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn patch(
        &self,
        conn: &mut PgConnection,
        id: &str,
        patch: &UserPatch,
    ) -> Result<u64, DbError> {
        let Some(mut query) = patch_query(id, patch) else {
            return Ok(0);
        };
        let result = query.build().execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, conn: &mut PgConnection, id: &str) -> Result<u64, DbError> {
        let result = sqlx::query(DELETE_SQL).bind(id).execute(&mut *conn).await?;
        Ok(result.rows_affected())
    }
}

/// INSERT of every column.
pub fn insert_query(user: &User) -> QueryBuilder<'_, Postgres> {
    let mut query =
        QueryBuilder::new("INSERT INTO users (id, username, email, phone, date_of_birth) ");
    query.push_values(std::iter::once(user), |mut row, u| {
        row.push_bind(u.id.as_str())
            .push_bind(u.username.as_str())
            .push_bind(u.email.as_str())
            .push_bind(u.phone.as_str())
            .push_bind(u.date_of_birth);
    });
    query
}

/// Full-column UPDATE keyed by id.
pub fn update_query(user: &User) -> QueryBuilder<'_, Postgres> {
    let mut query = QueryBuilder::new("UPDATE users SET ");
    {
        let mut set = query.separated(", ");
        set.push("username = ").push_bind_unseparated(user.username.as_str());
        set.push("email = ").push_bind_unseparated(user.email.as_str());
        set.push("phone = ").push_bind_unseparated(user.phone.as_str());
        set.push("date_of_birth = ").push_bind_unseparated(user.date_of_birth);
    }
    query.push(" WHERE id = ").push_bind(user.id.as_str());
    query
}

/// UPDATE of the supplied columns keyed by id; `None` for an empty patch.
pub fn patch_query<'a>(id: &'a str, patch: &'a UserPatch) -> Option<QueryBuilder<'a, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut query = QueryBuilder::new("UPDATE users SET ");
    {
        let mut set = query.separated(", ");
        if let Some(username) = &patch.username {
            set.push("username = ").push_bind_unseparated(username.as_str());
        }
        if let Some(email) = &patch.email {
            set.push("email = ").push_bind_unseparated(email.as_str());
        }
        if let Some(phone) = &patch.phone {
            set.push("phone = ").push_bind_unseparated(phone.as_str());
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            set.push("date_of_birth = ").push_bind_unseparated(date_of_birth);
        }
    }
    query.push(" WHERE id = ").push_bind(id);
    Some(query)
}
