//! Structured logging and optional OpenTelemetry span export.
//!
//! # Telemetry invariants
//!
//! - The encryption secret, derived key bytes, token secret, passwords and
//!   plaintext task descriptions must never appear in any span or log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), and
//!   `RUST_LOG` wins when set.

pub mod init;

pub use init::init_telemetry;
