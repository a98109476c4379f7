//! Configuration loading and validation for the task API.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;

/// Longest accepted token lifetime (one year).
const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 3600;

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Secret the field-encryption key is derived from. **Required.**
    pub key_encrypt_aes: String,

    /// HMAC secret for bearer tokens. **Required.**
    pub jwt_secret: String,

    /// sqlx SQLite connection URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Upper bound on pooled database connections.
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Lifetime of issued bearer tokens, in seconds.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Optional OTLP endpoint; spans are exported only when set.
    #[serde(default)]
    pub otel_exporter_otlp_endpoint: Option<String>,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database_url() -> String {
    "sqlite://tasks.db?mode=rwc".into()
}
fn default_database_max_connections() -> u32 {
    5
}
fn default_token_ttl() -> u64 {
    1200
}
fn default_listen_port() -> u16 {
    8000
}
fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::default())
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.key_encrypt_aes, "KEY_ENCRYPT_AES")?;
        ensure_non_empty(&self.jwt_secret, "JWT_SECRET")?;
        ensure_non_empty(&self.database_url, "DATABASE_URL")?;

        if self.database_max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be > 0");
        }
        if self.token_ttl_secs == 0 || self.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            anyhow::bail!("TOKEN_TTL_SECS must be between 1 and {MAX_TOKEN_TTL_SECS}");
        }
        if let Some(endpoint) = &self.otel_exporter_otlp_endpoint {
            ensure_non_empty(endpoint, "OTEL_EXPORTER_OTLP_ENDPOINT")?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("key_encrypt_aes", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("database_url", &self.database_url)
            .field("database_max_connections", &self.database_max_connections)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("listen_port", &self.listen_port)
            .field("otel_exporter_otlp_endpoint", &self.otel_exporter_otlp_endpoint)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
