//! Password hashing and bearer-token issuance/verification.
//!
//! The rest of the service only consumes the authenticated identity
//! (`id`, `username`) that a verified token yields.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::TokenKeys;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    Expired,

    #[error("invalid token")]
    InvalidToken,

    #[error("token signing failed: {0}")]
    Token(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),
}
