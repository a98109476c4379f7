use thiserror::Error;

use crate::crypto::CipherError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("audit payload encryption failed: {0}")]
    Cipher(#[from] CipherError),

    #[error("audit payload serialisation failed: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("record not found: {0}")]
    NotFound(String),

    /// A UNIQUE constraint rejected the write.
    #[error("conflicting record: {0}")]
    Conflict(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_owned());
            }
        }
        StoreError::Database(e)
    }
}
