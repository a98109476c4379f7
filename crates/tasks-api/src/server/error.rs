//! Conversion of layer errors into JSON error responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{protocol::ErrorResponse, ServiceError};
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::crypto::CipherError;
use crate::store::StoreError;

/// Handler error: a [`ServiceError`] rendered as [`ErrorResponse`] JSON.
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // Internal details stay in the logs.
        let message = match &self.0 {
            ServiceError::Internal(_) => "an internal error occurred".to_owned(),
            other => other.to_string(),
        };
        let body = ErrorResponse::new(self.0.code(), message);
        (status, Json(body)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self(ServiceError::NotFound(what)),
            StoreError::Conflict(_) => Self(ServiceError::Conflict(
                "username or email already in use".into(),
            )),
            other => {
                error!(error = %other, "store operation failed");
                Self(ServiceError::Internal(other.to_string()))
            }
        }
    }
}

impl From<CipherError> for ApiError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::MalformedCiphertext | CipherError::WrongKeyOrCorrupt => {
                warn!(error = %e, "stored ciphertext could not be decrypted");
                Self(ServiceError::DecryptionFailure(e.to_string()))
            }
            other => {
                error!(error = %other, "field encryption failed");
                Self(ServiceError::Internal(other.to_string()))
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Expired | AuthError::InvalidToken => {
                Self(ServiceError::Unauthorized(e.to_string()))
            }
            other => {
                error!(error = %other, "credential handling failed");
                Self(ServiceError::Internal(other.to_string()))
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::BadRequest(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(ServiceError::BadRequest(rejection.body_text()))
    }
}
