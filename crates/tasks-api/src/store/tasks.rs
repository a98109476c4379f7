//! Task repository. Descriptions arrive and leave as envelopes; callers own
//! the encryption.

use sqlx::SqliteConnection;

use super::error::StoreError;
use super::models::Task;

pub async fn insert(
    conn: &mut SqliteConnection,
    user_id: i64,
    title: &str,
    encrypted_description: &str,
) -> Result<Task, StoreError> {
    let id = sqlx::query(
        "INSERT INTO tasks (title, encrypted_description, user_id) VALUES (?, ?, ?)",
    )
    .bind(title)
    .bind(encrypted_description)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    find_for_user(conn, id, user_id)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("task {id}")))
}

pub async fn list_for_user(conn: &mut SqliteConnection, user_id: i64) -> Result<Vec<Task>, StoreError> {
    let tasks = sqlx::query_as::<_, Task>(
        "SELECT id, title, encrypted_description, user_id FROM tasks WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(tasks)
}

/// Fetch a task only if it belongs to `user_id`.
pub async fn find_for_user(
    conn: &mut SqliteConnection,
    id: i64,
    user_id: i64,
) -> Result<Option<Task>, StoreError> {
    let task = sqlx::query_as::<_, Task>(
        "SELECT id, title, encrypted_description, user_id FROM tasks WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(task)
}

/// Returns `false` when no task `id` is owned by `user_id`.
pub async fn update_for_user(
    conn: &mut SqliteConnection,
    id: i64,
    user_id: i64,
    title: &str,
    encrypted_description: &str,
) -> Result<bool, StoreError> {
    let affected = sqlx::query(
        "UPDATE tasks SET title = ?, encrypted_description = ? WHERE id = ? AND user_id = ?",
    )
    .bind(title)
    .bind(encrypted_description)
    .bind(id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();
    Ok(affected > 0)
}

/// Returns `false` when no task `id` is owned by `user_id`.
pub async fn delete_for_user(conn: &mut SqliteConnection, id: i64, user_id: i64) -> Result<bool, StoreError> {
    let affected = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

pub async fn delete_all_for_user(conn: &mut SqliteConnection, user_id: i64) -> Result<u64, StoreError> {
    let affected = sqlx::query("DELETE FROM tasks WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    Ok(affected)
}
