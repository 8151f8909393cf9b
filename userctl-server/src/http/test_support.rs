//! In-memory collaborators and request helpers for router tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use super::server::{build_router, AppState, ServerConfig};
use crate::config::{ActionConfig, SearchConfig, StatusConfig};
use crate::db::{DbError, UserSearch};
use crate::health::{HealthChecker, HealthError};
use crate::models::{Page, SearchCriteria, User, UserPatch, UserValidator};
use crate::usecase::UserUsecase;

pub fn bob() -> User {
    User {
        id: "u1".into(),
        username: "bob".into(),
        email: "bob@x.com".into(),
        phone: "123456789012".into(),
        date_of_birth: None,
    }
}

fn alice() -> User {
    User {
        id: "u2".into(),
        username: "alice".into(),
        email: "alice@x.com".into(),
        phone: "5550001111".into(),
        date_of_birth: None,
    }
}

/// Usecase over a map, counting every write that reaches it.
#[derive(Default)]
pub struct InMemoryUsers {
    rows: Mutex<BTreeMap<String, User>>,
    writes: AtomicUsize,
    failing: bool,
}

impl InMemoryUsers {
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub async fn get(&self, id: &str) -> Option<User> {
        self.rows.lock().ok()?.get(id).cloned()
    }

    fn write<F>(&self, f: F) -> Result<u64, DbError>
    where
        F: FnOnce(&mut BTreeMap<String, User>) -> Result<u64, DbError>,
    {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let mut rows = self.rows.lock().unwrap();
        f(&mut rows)
    }
}

#[async_trait]
impl UserUsecase for InMemoryUsers {
    async fn load(&self, id: &str) -> Result<Option<User>, DbError> {
        Ok(self.get(id).await)
    }

    async fn create(&self, user: &User) -> Result<u64, DbError> {
        self.write(|rows| {
            if rows.contains_key(&user.id) {
                return Err(DbError::Duplicate {
                    resource: "user",
                    id: user.id.clone(),
                });
            }
            rows.insert(user.id.clone(), user.clone());
            Ok(1)
        })
    }

    async fn update(&self, user: &User) -> Result<u64, DbError> {
        self.write(|rows| match rows.get_mut(&user.id) {
            Some(row) => {
                *row = user.clone();
                Ok(1)
            }
            None => Ok(0),
        })
    }

    async fn patch(&self, id: &str, patch: &UserPatch) -> Result<u64, DbError> {
        self.write(|rows| match rows.get_mut(id) {
            Some(row) => {
                row.apply_patch(patch);
                Ok(1)
            }
            None => Ok(0),
        })
    }

    async fn delete(&self, id: &str) -> Result<u64, DbError> {
        self.write(|rows| Ok(rows.remove(id).map_or(0, |_| 1)))
    }
}

/// Search over a fixed two-user table that records what it was asked.
#[derive(Default)]
pub struct StaticSearch {
    last: Mutex<Option<SearchCriteria>>,
}

impl StaticSearch {
    pub async fn last(&self) -> Option<SearchCriteria> {
        self.last.lock().ok()?.clone()
    }
}

#[async_trait]
impl UserSearch for StaticSearch {
    async fn search(&self, criteria: &SearchCriteria) -> Result<Page<User>, DbError> {
        *self.last.lock().unwrap() = Some(criteria.clone());

        let all = [bob(), alice()];
        let window = criteria.pagination;
        let items = all
            .iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, Some(all.len() as i64), window))
    }
}

struct FixedHealth(Option<String>);

#[async_trait]
impl HealthChecker for FixedHealth {
    fn name(&self) -> &str {
        "sql"
    }

    async fn check(&self) -> Result<(), HealthError> {
        match &self.0 {
            Some(message) => Err(HealthError(message.clone())),
            None => Ok(()),
        }
    }
}

pub struct TestApp {
    pub users: Arc<InMemoryUsers>,
    pub search: Arc<StaticSearch>,
    health_error: Option<String>,
    status: StatusConfig,
}

impl TestApp {
    pub fn new() -> Self {
        Self {
            users: Arc::new(InMemoryUsers::default()),
            search: Arc::new(StaticSearch::default()),
            health_error: None,
            status: StatusConfig::default(),
        }
    }

    pub fn with_user(self, user: User) -> Self {
        self.users
            .rows
            .lock()
            .unwrap()
            .insert(user.id.clone(), user);
        self
    }

    pub fn with_failing_writes(mut self) -> Self {
        self.users = Arc::new(InMemoryUsers {
            failing: true,
            ..InMemoryUsers::default()
        });
        self
    }

    pub fn with_failing_health(mut self, message: &str) -> Self {
        self.health_error = Some(message.to_string());
        self
    }

    pub fn with_validation_status(mut self, status: u16) -> Self {
        self.status.validation_error = status;
        self
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            users: self.users.clone(),
            search: self.search.clone(),
            health: vec![Arc::new(FixedHealth(self.health_error.clone()))],
            validator: UserValidator::new(),
            status: self.status.clone(),
            action: ActionConfig::default(),
            search_config: SearchConfig::default(),
        };
        build_router(state, &ServerConfig::default())
    }
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    respond(router, request).await
}

/// Send `body` as JSON; `null` sends no body.
pub async fn send(router: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = if body.is_null() {
        builder.body(Body::empty()).unwrap()
    } else {
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };
    respond(router, request).await
}

async fn respond(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}
