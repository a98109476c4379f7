//! SQLite persistence via `sqlx`: users, tasks, and the user audit log.
//!
//! # Unit of work
//!
//! Every user mutation runs in its own transaction opened here. The audited
//! repository writes the user row and its `logs` row on that transaction, so
//! both commit together or not at all.
//!
//! # Module invariants
//!
//! - Task descriptions cross this boundary as envelopes only; this module never
//!   sees a plaintext description.
//! - Audit payloads are encrypted before they reach SQL.

pub mod audit;
pub mod error;
pub mod models;
pub mod tasks;
pub mod users;

pub use audit::{AuditedUsers, Auditor};
pub use error::StoreError;
pub use models::{NewUser, Task, User, UserChanges};

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::crypto::FieldCipher;

/// Central store handle. Cheap to clone (the pool is `Arc`-backed).
#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
    users: AuditedUsers,
}

impl Store {
    /// Open (or create) the database at `database_url` and run pending
    /// migrations.
    ///
    /// `cipher` encrypts audit payloads.
    pub async fn open(
        database_url: &str,
        max_connections: u32,
        cipher: FieldCipher,
    ) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Connections are never recycled: an in-memory database lives exactly
        // as long as its single connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;

        info!(max_connections, "database ready");
        Ok(Self {
            pool,
            users: AuditedUsers::new(Auditor::new(cipher)),
        })
    }

    /// Fresh private in-memory database, migrated.
    #[cfg(test)]
    pub async fn in_memory(cipher: FieldCipher) -> Result<Self, StoreError> {
        Self::open("sqlite::memory:", 1, cipher).await
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────────────────

    pub async fn create_user(&self, new: &NewUser) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;
        let user = self.users.create(&mut tx, new).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;
        let user = self.users.update(&mut tx, id, changes).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;
        let user = self.users.delete(&mut tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    pub async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        users::find_by_id(&mut conn, id).await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        users::find_by_username(&mut conn, username).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        users::list(&mut conn).await
    }

    // ── Tasks ────────────────────────────────────────────────────────────────

    pub async fn create_task(
        &self,
        user_id: i64,
        title: &str,
        encrypted_description: &str,
    ) -> Result<Task, StoreError> {
        let mut conn = self.pool.acquire().await?;
        tasks::insert(&mut conn, user_id, title, encrypted_description).await
    }

    pub async fn list_tasks(&self, user_id: i64) -> Result<Vec<Task>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        tasks::list_for_user(&mut conn, user_id).await
    }

    pub async fn find_task(&self, id: i64, user_id: i64) -> Result<Option<Task>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        tasks::find_for_user(&mut conn, id, user_id).await
    }

    pub async fn update_task(
        &self,
        id: i64,
        user_id: i64,
        title: &str,
        encrypted_description: &str,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        tasks::update_for_user(&mut conn, id, user_id, title, encrypted_description).await
    }

    pub async fn delete_task(&self, id: i64, user_id: i64) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        tasks::delete_for_user(&mut conn, id, user_id).await
    }
}
