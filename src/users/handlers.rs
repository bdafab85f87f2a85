use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::UserPayload,
    repo_types::User,
    validation::{
        check_required_fields, validate_age_type, validate_email_format,
        validate_identifier_format, ValidationError,
    },
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn rejected(e: ValidationError) -> ApiError {
    warn!(reason = %e, "request rejected");
    e.into()
}

fn bad_body(e: JsonRejection) -> ApiError {
    warn!(reason = %e.body_text(), "unreadable request body");
    ApiError::InvalidBody(e.body_text())
}

/// POST /users
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(payload) = payload.map_err(bad_body)?;
    let fields = check_required_fields(&payload).map_err(rejected)?;
    validate_email_format(fields.email).map_err(rejected)?;

    // Best-effort; the store rejects duplicates on insert as well.
    let existing = state
        .users
        .find_by_email(fields.email)
        .await
        .map_err(ApiError::store("creating"))?;
    if existing.is_some() {
        warn!(email = %fields.email, "email already in use");
        return Err(ApiError::DuplicateEmail);
    }

    let age = validate_age_type(fields.age).map_err(rejected)?;

    let user = state
        .users
        .create(fields.into_new_user(age))
        .await
        .map_err(ApiError::store("creating"))?;

    info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .users
        .find_all()
        .await
        .map_err(ApiError::store("retrieving"))?;
    Ok(Json(users))
}

/// GET /users/:id
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let id = validate_identifier_format(&id).map_err(rejected)?;
    let user = state
        .users
        .find_by_id(id)
        .await
        .map_err(ApiError::store("retrieving"))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user))
}

/// PUT /users/:id
///
/// Full replace of name, email and age. Email uniqueness is left to the store.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let id = validate_identifier_format(&id).map_err(rejected)?;
    let Json(payload) = payload.map_err(bad_body)?;
    let fields = check_required_fields(&payload).map_err(rejected)?;
    validate_email_format(fields.email).map_err(rejected)?;
    let age = validate_age_type(fields.age).map_err(rejected)?;

    let user = state
        .users
        .update_by_id(id, fields.into_new_user(age))
        .await
        .map_err(ApiError::store("updating"))?
        .ok_or(ApiError::NotFound)?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(user))
}

/// DELETE /users/:id
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = validate_identifier_format(&id).map_err(rejected)?;
    let user = state
        .users
        .delete_by_id(id)
        .await
        .map_err(ApiError::store("deleting"))?
        .ok_or(ApiError::NotFound)?;

    info!(user_id = %user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
