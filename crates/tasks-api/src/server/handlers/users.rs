//! User profile endpoints. Mutations are restricted to the caller's own record.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use common::{
    protocol::{MessageResponse, UpdateUserRequest, UserResponse, UsersResponse},
    ServiceError,
};
use tracing::info;

use crate::server::{
    error::ApiError,
    extract::{ApiJson, ApiPath, AuthUser},
    state::AppState,
};
use crate::store::UserChanges;

use super::require_filled;

/// `GET /`
pub async fn list_users(
    _caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.store.list_users().await?;
    if users.is_empty() {
        return Err(ServiceError::NotFound("no users found".into()).into());
    }
    Ok(Json(UsersResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

/// `GET /:user_id`
pub async fn get_user(
    _caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))?;
    Ok(Json(UserResponse::from(&user)))
}

/// `PUT /:user_id`: replace profile fields. Audited as `UPDATE` when a
/// column actually changes.
pub async fn update_user(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    require_filled("username", &req.username)?;
    require_filled("email", &req.email)?;
    ensure_owner(&state, &caller, user_id).await?;

    let changes = UserChanges {
        username: req.username,
        email: req.email,
        full_name: req.full_name,
        phone_number: req.phone_number,
    };
    state.store.update_user(user_id, &changes).await?;

    info!(user_id, caller = %caller.username, "user updated");
    Ok(Json(MessageResponse::new("user updated")))
}

/// `DELETE /:user_id`: removes the user and their tasks. Audited as `DELETE`.
pub async fn delete_user(
    caller: AuthUser,
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    ensure_owner(&state, &caller, user_id).await?;
    state.store.delete_user(user_id).await?;

    info!(user_id, caller = %caller.username, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// 404 when the target is missing, then 403 when it is someone else.
async fn ensure_owner(state: &AppState, caller: &AuthUser, user_id: i64) -> Result<(), ApiError> {
    if state.store.find_user(user_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!("user {user_id}")).into());
    }
    if caller.id != user_id {
        return Err(ServiceError::Forbidden("you may only modify your own account".into()).into());
    }
    Ok(())
}
