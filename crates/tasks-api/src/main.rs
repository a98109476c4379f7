//! `tasks-api` binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline (OTEL + tracing).
//! 3. Derive the field-encryption key.
//! 4. Open the database and run migrations.
//! 5. Build the Axum router and start the HTTP server.

mod auth;
mod config;
mod crypto;
mod server;
mod store;
mod telemetry;

use anyhow::{Context, Result};
use tracing::info;

use auth::TokenKeys;
use config::Config;
use crypto::FieldCipher;
use server::state::AppState;
use store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "tasks-api starting"
    );

    // -----------------------------------------------------------------------
    // 3. Field encryption
    // -----------------------------------------------------------------------
    let cipher = FieldCipher::new(&cfg.key_encrypt_aes).context("invalid KEY_ENCRYPT_AES")?;

    // -----------------------------------------------------------------------
    // 4. Storage
    // -----------------------------------------------------------------------
    let store = Store::open(&cfg.database_url, cfg.database_max_connections, cipher.clone())
        .await
        .context("failed to open database")?;

    // -----------------------------------------------------------------------
    // 5. HTTP server
    // -----------------------------------------------------------------------
    let tokens = TokenKeys::new(&cfg.jwt_secret, cfg.token_ttl_secs);
    let state = AppState::new(store, cipher, tokens);
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
