//! Shared application state injected into every Axum handler.

use crate::auth::TokenKeys;
use crate::crypto::FieldCipher;
use crate::store::Store;

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-backed) so that Axum can clone the
/// state for each request without copying expensive data.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database handle; user mutations through it are audited.
    pub store: Store,
    /// Encrypts task descriptions on the way in and decrypts them on the way out.
    pub cipher: FieldCipher,
    /// Bearer-token signer/verifier.
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(store: Store, cipher: FieldCipher, tokens: TokenKeys) -> Self {
        Self {
            store,
            cipher,
            tokens,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State over a fresh in-memory database, encryption secret
    /// `"correct-horse"`, token secret `"jwt-secret"`.
    pub async fn for_tests() -> Self {
        let cipher = FieldCipher::new("correct-horse").unwrap();
        let store = Store::in_memory(cipher.clone()).await.unwrap();
        Self::new(store, cipher, TokenKeys::new("jwt-secret", 600))
    }
}
