//! Search filter for users
//!
//! `UserFilter` is what clients send (query string or JSON body);
//! `SearchCriteria` is the resolved form the search layer executes.

use chrono::NaiveDate;
use serde::Deserialize;

use super::pagination::{PageToken, Pagination, TokenError};
use super::user::column_for_field;

/// Invalid search input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("unknown sort field '{0}'")]
    UnknownSortField(String),

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Search criteria as supplied by a client
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserFilter {
    /// Exact id
    pub id: Option<String>,
    /// Username prefix
    pub username: Option<String>,
    /// Email prefix
    pub email: Option<String>,
    /// Phone substring
    pub phone: Option<String>,
    #[serde(rename = "dateOfBirth.min")]
    pub date_of_birth_min: Option<NaiveDate>,
    #[serde(rename = "dateOfBirth.max")]
    pub date_of_birth_max: Option<NaiveDate>,
    /// Keyword matched against username, email and phone
    pub q: Option<String>,
    /// e.g. `username,-dateOfBirth`
    pub sort: Option<String>,
    pub limit: Option<u32>,
    /// 1-indexed page, ignored when `next` is present
    pub page: Option<u32>,
    /// Continuation token from a previous page
    pub next: Option<String>,
}

/// One ORDER BY term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortField {
    pub column: &'static str,
    pub descending: bool,
}

/// Filter with sorting and paging resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth_min: Option<NaiveDate>,
    pub date_of_birth_max: Option<NaiveDate>,
    pub q: Option<String>,
    pub sort: Vec<SortField>,
    pub pagination: Pagination,
}

impl SearchCriteria {
    /// Resolve a client filter against the configured page size limits.
    pub fn from_filter(
        filter: UserFilter,
        default_limit: u32,
        max_limit: u32,
    ) -> Result<Self, FilterError> {
        let sort = parse_sort(filter.sort.as_deref().unwrap_or_default())?;

        let limit = filter
            .limit
            .unwrap_or(default_limit)
            .clamp(1, max_limit.max(1));
        let pagination = match non_empty(filter.next) {
            Some(token) => Pagination::new(limit, PageToken::decode(&token)?.offset),
            None => Pagination::from_page(filter.page.unwrap_or(1), limit),
        };

        Ok(Self {
            id: non_empty(filter.id),
            username: non_empty(filter.username),
            email: non_empty(filter.email),
            phone: non_empty(filter.phone),
            date_of_birth_min: filter.date_of_birth_min,
            date_of_birth_max: filter.date_of_birth_max,
            q: non_empty(filter.q),
            sort,
            pagination,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn parse_sort(sort: &str) -> Result<Vec<SortField>, FilterError> {
    sort.split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| {
            let (name, descending) = match term.strip_prefix('-') {
                Some(name) => (name, true),
                None => (term.strip_prefix('+').unwrap_or(term), false),
            };
            column_for_field(name)
                .map(|column| SortField { column, descending })
                .ok_or_else(|| FilterError::UnknownSortField(name.to_owned()))
        })
        .collect()
}
