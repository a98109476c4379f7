//! Request extractors: the authenticated caller, plus JSON body and path
//! wrappers whose rejections render as [`ApiError`] JSON.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use common::ServiceError;

use super::{error::ApiError, state::AppState};

/// The caller identity carried by a verified bearer token.
///
/// The token must belong to an account that still exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServiceError::Unauthorized("missing Authorization header".into()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ServiceError::Unauthorized("expected a Bearer token".into()))?;

        let claims = state.tokens.verify(token)?;
        let user = state
            .store
            .find_user(claims.id)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized("account no longer exists".into()))?;

        Ok(Self {
            id: user.id,
            username: user.username,
        })
    }
}

/// `axum::Json` with JSON error bodies on rejection.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with JSON error bodies on rejection.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);
