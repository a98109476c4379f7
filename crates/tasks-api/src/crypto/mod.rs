//! AES-256-CFB field encryption for text stored at rest.
//!
//! This module is intentionally free of storage and HTTP dependencies.
//!
//! # Ciphertext format
//!
//! ```text
//! base64(AES-256-CFB128(key = SHA-256(secret), iv = 0^16, utf8(plaintext)))
//! ```
//!
//! There is no version prefix; envelopes are bare standard base64.

pub mod cipher;

pub use cipher::{CipherError, FieldCipher};
