//! User endpoints
//!
//! Decode, validate, call the usecase, and map rows affected to a status:
//! - create: > 0 is 201, 0 or duplicate is 409
//! - update/patch/delete: > 0 is 200, 0 is 404
//!
//! The path id is authoritative for PUT and PATCH. An absent or empty
//! body id takes the path id; a different body id is rejected.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{debug, error, info, warn};

use crate::db::DbError;
use crate::http::error::ApiError;
use crate::http::extractors::{JsonBody, QueryParams, UserId};
use crate::http::server::AppState;
use crate::models::{FieldError, Page, SearchCriteria, User, UserFilter, UserPatch};

/// GET /users/{id}
async fn load_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<Json<User>, ApiError> {
    match state.users.load(&id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(not_found(&state, id)),
    }
}

/// POST /users
async fn create_user(
    State(state): State<Arc<AppState>>,
    JsonBody(user): JsonBody<User>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let action = state.action.create.as_str();
    reject_invalid(&state, action, &user.id, state.validator.validate(&user))?;

    let result = state.users.create(&user).await;
    log_outcome(&state, action, &user.id, &result);

    match result? {
        0 => Err(ApiError::Conflict {
            message: format!("{} '{}' was not created", state.action.resource, user.id),
        }),
        _ => Ok((StatusCode::CREATED, Json(user))),
    }
}

/// PUT /users/{id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
    JsonBody(mut user): JsonBody<User>,
) -> Result<Json<User>, ApiError> {
    let action = state.action.update.as_str();
    check_id(&id, &mut user.id)?;
    reject_invalid(&state, action, &id, state.validator.validate(&user))?;

    let result = state.users.update(&user).await;
    log_outcome(&state, action, &id, &result);

    match result? {
        0 => Err(not_found(&state, id)),
        _ => Ok(Json(user)),
    }
}

/// PATCH /users/{id}
async fn patch_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
    JsonBody(mut patch): JsonBody<UserPatch>,
) -> Result<Json<UserPatch>, ApiError> {
    let action = state.action.patch.as_str();
    check_id(&id, patch.id.get_or_insert_with(String::new))?;
    reject_invalid(&state, action, &id, state.validator.validate_patch(&patch))?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest {
            message: "patch contains no updatable fields".into(),
        });
    }

    debug!(id = %id, columns = ?patch.columns(), "patching");
    let result = state.users.patch(&id, &patch).await;
    log_outcome(&state, action, &id, &result);

    match result? {
        0 => Err(not_found(&state, id)),
        _ => Ok(Json(patch)),
    }
}

/// DELETE /users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    UserId(id): UserId,
) -> Result<Json<u64>, ApiError> {
    let action = state.action.delete.as_str();
    let result = state.users.delete(&id).await;
    log_outcome(&state, action, &id, &result);

    match result? {
        0 => Err(not_found(&state, id)),
        rows => Ok(Json(rows)),
    }
}

/// GET /users?{filter}
async fn search_users(
    State(state): State<Arc<AppState>>,
    QueryParams(filter): QueryParams<UserFilter>,
) -> Result<Json<Page<User>>, ApiError> {
    search(&state, filter).await
}

/// POST /users/search
async fn search_users_by_body(
    State(state): State<Arc<AppState>>,
    JsonBody(filter): JsonBody<UserFilter>,
) -> Result<Json<Page<User>>, ApiError> {
    search(&state, filter).await
}

async fn search(state: &AppState, filter: UserFilter) -> Result<Json<Page<User>>, ApiError> {
    let criteria = SearchCriteria::from_filter(
        filter,
        state.search_config.default_limit,
        state.search_config.max_limit,
    )?;
    let page = state.search.search(&criteria).await?;
    Ok(Json(page))
}

/// Reconcile a body id with the path id.
fn check_id(path_id: &str, body_id: &mut String) -> Result<(), ApiError> {
    if body_id.trim().is_empty() {
        *body_id = path_id.to_owned();
        return Ok(());
    }
    if body_id != path_id {
        return Err(ApiError::IdMismatch {
            path: path_id.to_owned(),
            body: body_id.clone(),
        });
    }
    Ok(())
}

fn reject_invalid(
    state: &AppState,
    action: &str,
    id: &str,
    errors: Vec<FieldError>,
) -> Result<(), ApiError> {
    if errors.is_empty() {
        return Ok(());
    }
    info!(
        resource = %state.action.resource,
        action,
        id,
        errors = errors.len(),
        "rejected: validation failed"
    );
    Err(ApiError::Validation {
        status: state.status.validation_status(),
        errors,
    })
}

fn log_outcome(state: &AppState, action: &str, id: &str, result: &Result<u64, DbError>) {
    let resource = state.action.resource.as_str();
    match result {
        Ok(0) => warn!(resource, action, id, rows = 0u64, "no matching row"),
        Ok(rows) => info!(resource, action, id, rows = *rows, "succeeded"),
        Err(e @ DbError::Duplicate { .. }) => warn!(resource, action, id, error = %e, "conflict"),
        Err(e) => error!(resource, action, id, error = %e, "failed"),
    }
}

fn not_found(state: &AppState, id: String) -> ApiError {
    ApiError::NotFound {
        resource: state.action.resource.clone(),
        id,
    }
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(search_users).post(create_user))
        .route("/users/search", post(search_users_by_body))
        .route(
            "/users/{id}",
            get(load_user)
                .put(update_user)
                .patch(patch_user)
                .delete(delete_user),
        )
}
