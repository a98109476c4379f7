//! AES-256-CFB encryption and decryption of individual text fields.
//!
//! **Compatibility contract:** the key is a single unsalted SHA-256 pass over
//! the configured secret and the IV is sixteen zero bytes. Rows written by
//! earlier deployments depend on both, so neither may change without a
//! versioned re-encryption of every stored envelope.
//!
//! **Known weakness:** the fixed IV makes the scheme deterministic. Equal
//! plaintexts under the same key produce equal envelopes, and CFB without a
//! tag gives no integrity. This protects descriptions against casual
//! inspection of the database only.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of the AES block, and therefore of the CFB IV.
pub const IV_LEN: usize = 16;

const ZERO_IV: [u8; IV_LEN] = [0u8; IV_LEN];

type Aes256CfbEnc = cfb_mode::Encryptor<aes::Aes256>;
type Aes256CfbDec = cfb_mode::Decryptor<aes::Aes256>;

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key is the wrong length (must be [`KEY_LEN`] bytes).
    #[error("invalid key length: expected {KEY_LEN} bytes")]
    InvalidKeyLength,

    /// The configured secret is empty or whitespace.
    #[error("encryption secret must not be empty")]
    EmptySecret,

    /// The envelope is not valid base64.
    #[error("corrupt ciphertext: not valid base64")]
    MalformedCiphertext,

    /// Decryption produced bytes that are not UTF-8 text.
    #[error("decryption failed: wrong key or corrupted data")]
    WrongKeyOrCorrupt,
}

/// Fixed-size key buffer holding exactly [`KEY_LEN`] bytes.
///
/// Overwritten with zeroes on drop.
#[derive(Clone)]
pub struct DerivedKey(Box<[u8; KEY_LEN]>);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey([REDACTED])")
    }
}

/// Derive the field key from `secret`: `SHA-256(secret as UTF-8)`.
///
/// Deterministic and unsalted. Callers are expected to reject empty secrets
/// before getting here; [`FieldCipher::new`] does.
pub fn derive_key(secret: &str) -> DerivedKey {
    let digest = Sha256::digest(secret.as_bytes());
    let mut buf = Box::new([0u8; KEY_LEN]);
    buf.copy_from_slice(&digest);
    DerivedKey(buf)
}

/// Encrypt `plaintext` and return the base64 envelope.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
pub fn encrypt_data(plaintext: &str, key: &[u8]) -> Result<String, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength);
    }
    let mut buf = plaintext.as_bytes().to_vec();
    Aes256CfbEnc::new_from_slices(key, &ZERO_IV)
        .map_err(|_| CipherError::InvalidKeyLength)?
        .encrypt(&mut buf);
    Ok(STANDARD.encode(buf))
}

/// Decrypt a base64 envelope produced by [`encrypt_data`] under the same key.
///
/// # Errors
///
/// - [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes.
/// - [`CipherError::MalformedCiphertext`] if `envelope` is not base64.
/// - [`CipherError::WrongKeyOrCorrupt`] if the decrypted bytes are not UTF-8,
///   which is how a key mismatch normally shows up.
pub fn decrypt_data(envelope: &str, key: &[u8]) -> Result<String, CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength);
    }
    let mut buf = STANDARD
        .decode(envelope.as_bytes())
        .map_err(|_| CipherError::MalformedCiphertext)?;
    Aes256CfbDec::new_from_slices(key, &ZERO_IV)
        .map_err(|_| CipherError::InvalidKeyLength)?
        .decrypt(&mut buf);
    String::from_utf8(buf).map_err(|_| CipherError::WrongKeyOrCorrupt)
}

/// Field cipher bound to one deployment secret.
///
/// The key is derived once at construction and shared between clones.
#[derive(Clone)]
pub struct FieldCipher {
    key: Arc<DerivedKey>,
}

impl FieldCipher {
    /// Build a cipher from the configured secret.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::EmptySecret`] if `secret` is empty or whitespace.
    pub fn new(secret: &str) -> Result<Self, CipherError> {
        if secret.trim().is_empty() {
            return Err(CipherError::EmptySecret);
        }
        Ok(Self {
            key: Arc::new(derive_key(secret)),
        })
    }

    /// Encrypt a text field into its stored envelope.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        encrypt_data(plaintext, self.key.as_bytes())
    }

    /// Decrypt a stored envelope back to text.
    pub fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        decrypt_data(envelope, self.key.as_bytes())
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldCipher([REDACTED])")
    }
}
