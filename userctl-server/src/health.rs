//! Dependency health checks
//!
//! Each checker probes one dependency; `check_all` aggregates them into
//! a single report. A failing check is reported, never fatal.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::PgPool;

/// Default time allowed for a single probe
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct HealthError(pub String);

#[async_trait]
pub trait HealthChecker: Send + Sync {
    /// Key in the aggregated report
    fn name(&self) -> &str;

    async fn check(&self) -> Result<(), HealthError>;
}

/// Probes the database with `SELECT 1`
#[derive(Clone)]
pub struct SqlHealthChecker {
    pool: PgPool,
    timeout: Duration,
}

impl SqlHealthChecker {
    pub fn new(pool: PgPool) -> Self {
        Self::with_timeout(pool, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl HealthChecker for SqlHealthChecker {
    fn name(&self) -> &str {
        "sql"
    }

    async fn check(&self) -> Result<(), HealthError> {
        match tokio::time::timeout(self.timeout, sqlx::query("SELECT 1").execute(&self.pool)).await
        {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(HealthError(e.to_string())),
            Err(_) => Err(HealthError(format!(
                "timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub details: BTreeMap<String, CheckReport>,
}

/// Run every checker; the report is down if any check is.
pub async fn check_all(checkers: &[Arc<dyn HealthChecker>]) -> HealthReport {
    let mut status = HealthStatus::Up;
    let mut details = BTreeMap::new();

    for checker in checkers {
        let report = match checker.check().await {
            Ok(()) => CheckReport {
                status: HealthStatus::Up,
                error: None,
            },
            Err(e) => {
                tracing::warn!(check = checker.name(), error = %e, "health check failed");
                status = HealthStatus::Down;
                CheckReport {
                    status: HealthStatus::Down,
                    error: Some(e.to_string()),
                }
            }
        };
        details.insert(checker.name().to_owned(), report);
    }

    HealthReport { status, details }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, Option<&'static str>);

    #[async_trait]
    impl HealthChecker for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        async fn check(&self) -> Result<(), HealthError> {
            match self.1 {
                None => Ok(()),
                Some(msg) => Err(HealthError(msg.into())),
            }
        }
    }

    #[tokio::test]
    async fn all_up() {
        let checkers: Vec<Arc<dyn HealthChecker>> = vec![Arc::new(Fixed("sql", None))];
        let report = check_all(&checkers).await;
        assert_eq!(report.status, HealthStatus::Up);
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({"status": "UP", "details": {"sql": {"status": "UP"}}})
        );
    }

    #[tokio::test]
    async fn one_down_is_down() {
        let checkers: Vec<Arc<dyn HealthChecker>> = vec![
            Arc::new(Fixed("cache", None)),
            Arc::new(Fixed("sql", Some("connection refused"))),
        ];
        let report = check_all(&checkers).await;
        assert_eq!(report.status, HealthStatus::Down);
        assert_eq!(report.details["cache"].status, HealthStatus::Up);
        assert_eq!(
            report.details["sql"].error.as_deref(),
            Some("connection refused")
        );
    }

    #[tokio::test]
    async fn no_checkers_is_up() {
        assert_eq!(check_all(&[]).await.status, HealthStatus::Up);
    }
}
