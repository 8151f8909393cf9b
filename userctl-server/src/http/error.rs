//! API error types with IntoResponse
//!
//! This is the only place an error becomes an HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::DbError;
use crate::models::{FieldError, FilterError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (400)
    BadRequest { message: String },

    /// Body id disagrees with the path id (400)
    IdMismatch { path: String, body: String },

    /// Field validation failed (configured status, default 400)
    Validation {
        status: StatusCode,
        errors: Vec<FieldError>,
    },

    /// No matching row (404)
    NotFound { resource: String, id: String },

    /// Duplicate key or nothing inserted (409)
    Conflict { message: String },

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "bad_request",
                    "message": message
                }),
            ),
            Self::IdMismatch { path, body } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "id_mismatch",
                    "message": format!("body id '{}' does not match path id '{}'", body, path)
                }),
            ),
            Self::Validation { status, errors } => (
                status,
                json!({
                    "error": "validation_error",
                    "errors": errors
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Duplicate { resource, id } => Self::Conflict {
                message: format!("{} '{}' already exists", resource, id),
            },
            _ => Self::Database(e),
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(e: FilterError) -> Self {
        Self::BadRequest {
            message: e.to_string(),
        }
    }
}
