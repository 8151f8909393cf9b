//! userctl-server: CRUD and search service for user records
//!
//! Layers, outermost first:
//! - `http`: axum routes, request decoding, error responses
//! - `usecase`: one transaction per write
//! - `db`: PostgreSQL repository, search and schema
//! - `models`: user record, patch, validation, filters and paging
//!
//! `app` wires them together from `config::Settings`; `health` reports
//! whether the database answers.

pub mod app;
pub mod config;
pub mod db;
pub mod health;
pub mod http;
pub mod models;
pub mod usecase;

pub use app::{server_config, AppError, ApplicationContext};
pub use config::{ConfigError, Settings};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
