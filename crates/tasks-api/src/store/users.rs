//! Plain user repository. Writes here are NOT audited; go through
//! [`super::audit::AuditedUsers`] for create/update/delete.

use sqlx::SqliteConnection;

use super::error::StoreError;
use super::models::{NewUser, User, UserChanges};

const USER_COLUMNS: &str = "id, username, email, full_name, password, phone_number";

pub async fn insert(conn: &mut SqliteConnection, new: &NewUser) -> Result<User, StoreError> {
    let id = sqlx::query(
        "INSERT INTO users (username, email, full_name, password, phone_number) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&new.username)
    .bind(&new.email)
    .bind(&new.full_name)
    .bind(&new.password)
    .bind(&new.phone_number)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    find_by_id(conn, id)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
}

pub async fn find_by_id(conn: &mut SqliteConnection, id: i64) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(user)
}

pub async fn find_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(username)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(user)
}

pub async fn list(conn: &mut SqliteConnection) -> Result<Vec<User>, StoreError> {
    let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
        .fetch_all(&mut *conn)
        .await?;
    Ok(users)
}

pub async fn update(
    conn: &mut SqliteConnection,
    id: i64,
    changes: &UserChanges,
) -> Result<User, StoreError> {
    let affected = sqlx::query(
        "UPDATE users SET username = ?, email = ?, full_name = ?, phone_number = ? WHERE id = ?",
    )
    .bind(&changes.username)
    .bind(&changes.email)
    .bind(&changes.full_name)
    .bind(&changes.phone_number)
    .bind(id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(StoreError::NotFound(format!("user {id}")));
    }
    find_by_id(conn, id)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> Result<(), StoreError> {
    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();
    if affected == 0 {
        return Err(StoreError::NotFound(format!("user {id}")));
    }
    Ok(())
}
