//! Service configuration
//!
//! Loaded in layers: built-in defaults, then an optional TOML file, then
//! environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string
//! - `USERCTL_BIND`: listen address, e.g. `0.0.0.0:8080`
//!
//! Command line flags are applied last by the CLI.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::models::pagination::{DEFAULT_LIMIT, MAX_LIMIT};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: '{value}'")]
    InvalidEnv { var: &'static str, value: String },
}

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub status: StatusConfig,
    pub action: ActionConfig,
    pub search: SearchConfig,
    pub health: HealthSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to bind to (default: 127.0.0.1:8080)
    pub bind: SocketAddr,
    /// Allow any CORS origin (default: localhost only)
    pub cors_permissive: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    /// Create the schema on startup
    pub migrate: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/userctl".to_string(),
            max_connections: crate::db::pool::DEFAULT_MAX_CONNECTIONS,
            migrate: false,
        }
    }
}

/// HTTP statuses that deployments may override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub validation_error: u16,
}

impl StatusConfig {
    /// Status for a failed validation; falls back to 400 if misconfigured.
    pub fn validation_status(&self) -> StatusCode {
        StatusCode::from_u16(self.validation_error).unwrap_or(StatusCode::BAD_REQUEST)
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            validation_error: StatusCode::BAD_REQUEST.as_u16(),
        }
    }
}

/// Resource and action names used in structured logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    pub resource: String,
    pub create: String,
    pub update: String,
    pub patch: String,
    pub delete: String,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            resource: "user".to_string(),
            create: "create".to_string(),
            update: "update".to_string(),
            patch: "patch".to_string(),
            delete: "delete".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: MAX_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    pub timeout_secs: u64,
}

impl HealthSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            timeout_secs: crate::health::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid with `path` if given, overlaid with the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        settings.apply_env(|var| std::env::var(var).ok())?;
        Ok(settings)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.database.url = url;
        }
        if let Some(bind) = lookup("USERCTL_BIND").filter(|v| !v.is_empty()) {
            self.server.bind = bind.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "USERCTL_BIND",
                value: bind,
            })?;
        }
        Ok(())
    }
}
