//! `POST /auth` (registration) and `POST /auth/token` (login).

use axum::{extract::State, http::StatusCode, Json};
use common::{
    protocol::{RegisterRequest, TokenRequest, TokenResponse, UserResponse},
    ServiceError,
};
use tracing::info;

use crate::auth::{hash_password, verify_password};
use crate::server::{error::ApiError, extract::ApiJson, state::AppState};
use crate::store::NewUser;

use super::require_filled;

/// `POST /auth`: create an account. Audited as `CREATE`.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_filled("username", &req.username)?;
    require_filled("email", &req.email)?;
    require_filled("password", &req.password)?;

    let password = req.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("hashing task failed: {e}")))??;

    let user = state
        .store
        .create_user(&NewUser {
            username: req.username,
            email: req.email,
            full_name: req.full_name,
            password: Some(hash),
            phone_number: req.phone_number,
        })
        .await?;

    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

/// `POST /auth/token`: exchange username + password for a bearer token.
pub async fn token(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let rejected = || ApiError(ServiceError::Unauthorized("incorrect username or password".into()));

    let user = state
        .store
        .find_user_by_username(&req.username)
        .await?
        .ok_or_else(rejected)?;
    let hash = user.password.clone().ok_or_else(rejected)?;

    let password = req.password;
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(format!("verification task failed: {e}")))?;
    if !ok {
        return Err(rejected());
    }

    let access_token = state.tokens.issue(user.id, &user.username)?;
    info!(user_id = user.id, "token issued");
    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}
