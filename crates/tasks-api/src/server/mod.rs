//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Authenticate callers from their bearer token.
//! - Inject shared application state (`AppState`) into handlers.
//! - Render every failure as an `ErrorResponse` JSON body.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;
