//! Common types, protocol definitions, and errors shared across `secure-tasks` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
