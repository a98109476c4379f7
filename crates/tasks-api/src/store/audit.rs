//! Mutation audit for the user entity.
//!
//! [`AuditedUsers`] wraps the plain repository in [`super::users`]: every
//! create, update and delete performs its write and then appends a `logs` row
//! through [`Auditor::record`] on the **same connection**. When the caller's
//! transaction rolls back, the audit row goes with it; when the audit insert
//! fails, the error aborts the caller's transaction.
//!
//! Tasks are not audited.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::crypto::FieldCipher;

use super::error::StoreError;
use super::models::{AuditOperation, NewUser, User, UserChanges, UserSnapshot};
use super::{tasks, users};

/// Appends encrypted user snapshots to the `logs` table.
#[derive(Clone, Debug)]
pub struct Auditor {
    cipher: FieldCipher,
}

impl Auditor {
    pub fn new(cipher: FieldCipher) -> Self {
        Self { cipher }
    }

    /// Serialise `user`, encrypt the snapshot, and insert one audit row.
    ///
    /// Returns the id of the new row.
    pub async fn record(
        &self,
        conn: &mut SqliteConnection,
        operation: AuditOperation,
        user: &User,
    ) -> Result<i64, StoreError> {
        let snapshot = UserSnapshot::from(user).to_audit_string()?;
        let data = self.cipher.encrypt(&snapshot)?;

        let id = sqlx::query("INSERT INTO logs (operation, data, timestamp) VALUES (?, ?, ?)")
            .bind(operation.as_str())
            .bind(data)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?
            .last_insert_rowid();

        debug!(audit_id = id, operation = %operation, user_id = user.id, "audit entry appended");
        Ok(id)
    }
}

/// User repository whose mutations are always audited.
#[derive(Clone, Debug)]
pub struct AuditedUsers {
    auditor: Auditor,
}

impl AuditedUsers {
    pub fn new(auditor: Auditor) -> Self {
        Self { auditor }
    }

    pub async fn create(
        &self,
        conn: &mut SqliteConnection,
        new: &NewUser,
    ) -> Result<User, StoreError> {
        let user = users::insert(conn, new).await?;
        self.auditor
            .record(conn, AuditOperation::Create, &user)
            .await?;
        Ok(user)
    }

    /// Apply `changes` to user `id`.
    ///
    /// When nothing would change, no write happens and no audit row is added;
    /// the current record is returned as-is.
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        id: i64,
        changes: &UserChanges,
    ) -> Result<User, StoreError> {
        let existing = users::find_by_id(conn, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;
        if !changes.differs_from(&existing) {
            return Ok(existing);
        }

        let updated = users::update(conn, id, changes).await?;
        self.auditor
            .record(conn, AuditOperation::Update, &updated)
            .await?;
        Ok(updated)
    }

    /// Delete user `id` together with its tasks.
    ///
    /// The audit row carries the snapshot taken before removal.
    pub async fn delete(&self, conn: &mut SqliteConnection, id: i64) -> Result<User, StoreError> {
        let existing = users::find_by_id(conn, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))?;

        tasks::delete_all_for_user(conn, id).await?;
        users::delete(conn, id).await?;
        self.auditor
            .record(conn, AuditOperation::Delete, &existing)
            .await?;
        Ok(existing)
    }
}

/// Read back every audit row in id order.
#[cfg(test)]
pub async fn list_entries(
    conn: &mut SqliteConnection,
) -> Result<Vec<super::models::AuditEntry>, StoreError> {
    #[derive(sqlx::FromRow)]
    struct Row {
        id: i64,
        operation: String,
        data: String,
        timestamp: chrono::DateTime<Utc>,
    }

    let rows = sqlx::query_as::<_, Row>("SELECT id, operation, data, timestamp FROM logs ORDER BY id")
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|r| super::models::AuditEntry {
            id: r.id,
            operation: r
                .operation
                .parse()
                .expect("audit rows carry a known operation tag"),
            data: r.data,
            timestamp: r.timestamp,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::AuditEntry;
    use crate::store::Store;

    const SECRET: &str = "correct-horse";

    fn cipher() -> FieldCipher {
        FieldCipher::new(SECRET).unwrap()
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: format!("{username}@example.com"),
            full_name: format!("{username} original"),
            password: None,
            phone_number: "555-0100".into(),
        }
    }

    fn changes_from(user: &User) -> UserChanges {
        UserChanges {
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            phone_number: user.phone_number.clone(),
        }
    }

    async fn entries(store: &Store) -> Vec<AuditEntry> {
        let mut conn = store.pool().acquire().await.unwrap();
        list_entries(&mut conn).await.unwrap()
    }

    async fn user_count(store: &Store) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(store.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_update_writes_two_entries() {
        let store = Store::in_memory(cipher()).await.unwrap();
        let user = store.create_user(&new_user("alice")).await.unwrap();

        let mut changes = changes_from(&user);
        changes.full_name = "Alice Liddell".into();
        store.update_user(user.id, &changes).await.unwrap();

        let log = entries(&store).await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].operation, AuditOperation::Create);
        assert_eq!(log[1].operation, AuditOperation::Update);
        assert!(log[0].id < log[1].id);
        assert!(log[0].timestamp <= log[1].timestamp);
        let age = Utc::now() - log[1].timestamp;
        assert!(age >= chrono::Duration::zero() && age < chrono::Duration::minutes(1));

        let c = cipher();
        let created = c.decrypt(&log[0].data).unwrap();
        let updated = c.decrypt(&log[1].data).unwrap();
        assert!(created.contains("\"full_name\":\"alice original\""));
        assert!(created.contains("alice@example.com"));
        assert!(updated.contains("\"full_name\":\"Alice Liddell\""));
        assert!(updated.contains("\"username\":\"alice\""));
    }

    #[tokio::test]
    async fn audit_payload_is_not_plaintext() {
        let store = Store::in_memory(cipher()).await.unwrap();
        store.create_user(&new_user("bob")).await.unwrap();
        let log = entries(&store).await;
        assert!(!log[0].data.contains("bob"));
    }

    #[tokio::test]
    async fn delete_records_snapshot_before_removal() {
        let store = Store::in_memory(cipher()).await.unwrap();
        let user = store.create_user(&new_user("carol")).await.unwrap();
        store.delete_user(user.id).await.unwrap();

        let log = entries(&store).await;
        let ops: Vec<_> = log.iter().map(|e| e.operation).collect();
        assert_eq!(ops, vec![AuditOperation::Create, AuditOperation::Delete]);
        let deleted = cipher().decrypt(&log[1].data).unwrap();
        assert!(deleted.contains("carol@example.com"));
        assert_eq!(user_count(&store).await, 0);
    }

    #[tokio::test]
    async fn unchanged_update_is_not_audited() {
        let store = Store::in_memory(cipher()).await.unwrap();
        let user = store.create_user(&new_user("dave")).await.unwrap();
        let same = store.update_user(user.id, &changes_from(&user)).await.unwrap();
        assert_eq!(same, user);
        assert_eq!(entries(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn rolled_back_transaction_leaves_no_entry() {
        let store = Store::in_memory(cipher()).await.unwrap();
        let audited = AuditedUsers::new(Auditor::new(cipher()));

        let mut tx = store.pool().begin().await.unwrap();
        audited.create(&mut tx, &new_user("erin")).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(entries(&store).await.is_empty());
        assert_eq!(user_count(&store).await, 0);
    }

    #[tokio::test]
    async fn downstream_failure_rolls_back_audit() {
        let store = Store::in_memory(cipher()).await.unwrap();
        store.create_user(&new_user("frank")).await.unwrap();

        // Second user collides on email after its own insert succeeded
        // inside the same unit of work.
        let audited = AuditedUsers::new(Auditor::new(cipher()));
        let mut tx = store.pool().begin().await.unwrap();
        let grace = audited.create(&mut tx, &new_user("grace")).await.unwrap();
        let mut clash = changes_from(&grace);
        clash.email = "frank@example.com".into();
        let err = audited.update(&mut tx, grace.id, &clash).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        tx.rollback().await.unwrap();

        let log = entries(&store).await;
        assert_eq!(log.len(), 1);
        assert_eq!(user_count(&store).await, 1);
    }

    #[tokio::test]
    async fn failed_audit_insert_aborts_user_write() {
        let store = Store::in_memory(cipher()).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_audit BEFORE INSERT ON logs \
             BEGIN SELECT RAISE(ABORT, 'audit store offline'); END",
        )
        .execute(store.pool())
        .await
        .unwrap();

        assert!(store.create_user(&new_user("heidi")).await.is_err());
        assert_eq!(user_count(&store).await, 0);
    }

    #[tokio::test]
    async fn audit_rows_are_append_only() {
        let store = Store::in_memory(cipher()).await.unwrap();
        store.create_user(&new_user("ivan")).await.unwrap();
        assert!(sqlx::query("DELETE FROM logs").execute(store.pool()).await.is_err());
        assert!(sqlx::query("UPDATE logs SET data = 'x'")
            .execute(store.pool())
            .await
            .is_err());
        assert_eq!(entries(&store).await.len(), 1);
    }

    #[tokio::test]
    async fn entries_decrypt_only_with_same_secret() {
        let store = Store::in_memory(cipher()).await.unwrap();
        store.create_user(&new_user("judy")).await.unwrap();
        let log = entries(&store).await;
        let other = FieldCipher::new("another-secret").unwrap();
        match other.decrypt(&log[0].data) {
            Ok(text) => assert!(!text.contains("judy")),
            Err(e) => assert!(matches!(e, crate::crypto::CipherError::WrongKeyOrCorrupt)),
        }
    }
}
