//! Paginated user search
//!
//! One query per page: the filter becomes a parameterised WHERE clause,
//! ordering is whitelisted through `SortField`, and the total comes from
//! a `COUNT(*) OVER()` window so no second round trip is needed.

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Row};

use super::DbError;
use crate::models::{Page, SearchCriteria, User};

/// Search port used by the HTTP layer
#[async_trait]
pub trait UserSearch: Send + Sync {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Page<User>, DbError>;
}

/// PostgreSQL-backed search
#[derive(Clone)]
pub struct PgUserSearch {
    pool: PgPool,
}

impl PgUserSearch {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserSearch for PgUserSearch {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Page<User>, DbError> {
        let rows = search_query(criteria).build().fetch_all(&self.pool).await?;

        let total = match rows.first() {
            Some(row) => Some(row.try_get::<i64, _>("total")?),
            // an empty first page means nothing matched; past the end we can't tell
            None if criteria.pagination.offset == 0 => Some(0),
            None => None,
        };
        let items = rows
            .iter()
            .map(User::from_row)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            items = items.len(),
            offset = criteria.pagination.offset,
            "user search page"
        );
        Ok(Page::new(items, total, criteria.pagination))
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn prefix_pattern(value: &str) -> String {
    format!("{}%", escape_like(value))
}

fn contains_pattern(value: &str) -> String {
    format!("%{}%", escape_like(value))
}

/// Build the page query for `criteria`.
pub fn search_query(criteria: &SearchCriteria) -> QueryBuilder<'_, Postgres> {
    let mut query = QueryBuilder::new(
        "SELECT id, username, email, phone, date_of_birth, COUNT(*) OVER() AS total \
         FROM users WHERE 1=1",
    );

    if let Some(id) = &criteria.id {
        query.push(" AND id = ").push_bind(id.as_str());
    }
    if let Some(username) = &criteria.username {
        query
            .push(" AND username ILIKE ")
            .push_bind(prefix_pattern(username));
    }
    if let Some(email) = &criteria.email {
        query.push(" AND email ILIKE ").push_bind(prefix_pattern(email));
    }
    if let Some(phone) = &criteria.phone {
        query.push(" AND phone ILIKE ").push_bind(contains_pattern(phone));
    }
    if let Some(min) = criteria.date_of_birth_min {
        query.push(" AND date_of_birth >= ").push_bind(min);
    }
    if let Some(max) = criteria.date_of_birth_max {
        query.push(" AND date_of_birth <= ").push_bind(max);
    }
    if let Some(q) = &criteria.q {
        query
            .push(" AND (username ILIKE ")
            .push_bind(prefix_pattern(q))
            .push(" OR email ILIKE ")
            .push_bind(prefix_pattern(q))
            .push(" OR phone ILIKE ")
            .push_bind(contains_pattern(q))
            .push(")");
    }

    query.push(" ORDER BY ");
    {
        let mut order = query.separated(", ");
        for field in &criteria.sort {
            order.push(field.column);
            order.push_unseparated(if field.descending { " DESC" } else { " ASC" });
        }
        // id breaks ties so pages never overlap
        if !criteria.sort.iter().any(|f| f.column == "id") {
            order.push("id ASC");
        }
    }

    query
        .push(" LIMIT ")
        .push_bind(i64::from(criteria.pagination.limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(criteria.pagination.offset).unwrap_or(i64::MAX));
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pagination, SortField, UserFilter};
    use chrono::NaiveDate;

    fn criteria(filter: UserFilter) -> SearchCriteria {
        SearchCriteria::from_filter(filter, 20, 100).unwrap()
    }

    #[test]
    fn unfiltered_query_orders_by_id() {
        let c = criteria(UserFilter::default());
        assert_eq!(
            search_query(&c).sql(),
            "SELECT id, username, email, phone, date_of_birth, COUNT(*) OVER() AS total \
             FROM users WHERE 1=1 ORDER BY id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn every_filter_is_parameterised() {
        let c = criteria(UserFilter {
            id: Some("u1".into()),
            username: Some("bo".into()),
            email: Some("bob@".into()),
            phone: Some("345".into()),
            date_of_birth_min: NaiveDate::from_ymd_opt(1990, 1, 1),
            date_of_birth_max: NaiveDate::from_ymd_opt(2000, 1, 1),
            ..Default::default()
        });
        let sql = search_query(&c).sql().to_owned();
        assert!(sql.contains(" AND id = $1"));
        assert!(sql.contains(" AND username ILIKE $2"));
        assert!(sql.contains(" AND email ILIKE $3"));
        assert!(sql.contains(" AND phone ILIKE $4"));
        assert!(sql.contains(" AND date_of_birth >= $5"));
        assert!(sql.contains(" AND date_of_birth <= $6"));
        assert!(sql.ends_with("LIMIT $7 OFFSET $8"));
    }

    #[test]
    fn keyword_spans_three_columns() {
        let c = criteria(UserFilter {
            q: Some("bob".into()),
            ..Default::default()
        });
        assert!(search_query(&c)
            .sql()
            .contains(" AND (username ILIKE $1 OR email ILIKE $2 OR phone ILIKE $3)"));
    }

    #[test]
    fn sort_appends_id_tiebreaker() {
        let mut c = criteria(UserFilter::default());
        c.sort = vec![SortField {
            column: "date_of_birth",
            descending: true,
        }];
        assert!(search_query(&c)
            .sql()
            .contains(" ORDER BY date_of_birth DESC, id ASC LIMIT"));

        c.sort = vec![SortField {
            column: "id",
            descending: true,
        }];
        assert!(search_query(&c).sql().contains(" ORDER BY id DESC LIMIT"));
    }

    #[test]
    fn like_input_is_escaped() {
        assert_eq!(prefix_pattern("50%_off"), r"50\%\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pages_through_matches() {
        use crate::db::{create_pool, migrations};

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool(&url).await.expect("pool creation failed");
        migrations::run(&pool).await.unwrap();
        sqlx::query("DELETE FROM users WHERE id LIKE 'search-%'")
            .execute(&pool)
            .await
            .unwrap();
        for i in 0..3 {
            sqlx::query(
                "INSERT INTO users (id, username, email, phone) VALUES ($1, $2, $3, '123456789')",
            )
            .bind(format!("search-{i}"))
            .bind(format!("searcher{i}"))
            .bind(format!("searcher{i}@x.com"))
            .execute(&pool)
            .await
            .unwrap();
        }

        let search = PgUserSearch::new(pool.clone());
        let mut c = criteria(UserFilter {
            username: Some("searcher".into()),
            limit: Some(2),
            ..Default::default()
        });
        let first = search.search(&c).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total, Some(3));
        let token = first.next_token.expect("second page");

        c.pagination = Pagination::new(2, crate::models::PageToken::decode(&token).unwrap().offset);
        let second = search.search(&c).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.next_token, None);
    }
}
