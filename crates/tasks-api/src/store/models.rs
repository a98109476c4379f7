//! Database row models and the audit snapshot of a user.

use std::fmt;

use common::protocol::UserResponse;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Argon2 PHC string; `None` for accounts provisioned without a password.
    pub password: Option<String>,
    pub phone_number: String,
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            full_name: u.full_name.clone(),
            phone_number: u.phone_number.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: Option<String>,
    pub phone_number: String,
}

/// Full replacement of a user's profile fields. The password is untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
}

impl UserChanges {
    /// `true` if applying these changes to `user` would alter any column.
    pub fn differs_from(&self, user: &User) -> bool {
        self.username != user.username
            || self.email != user.email
            || self.full_name != user.full_name
            || self.phone_number != user.phone_number
    }
}

/// The serialised form of a user written into audit entries.
///
/// Field order is fixed by declaration order. The password hash is not part
/// of the snapshot.
#[derive(Debug, Serialize)]
pub struct UserSnapshot<'a> {
    pub id: i64,
    pub username: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
    pub phone_number: &'a str,
}

impl<'a> From<&'a User> for UserSnapshot<'a> {
    fn from(u: &'a User) -> Self {
        Self {
            id: u.id,
            username: &u.username,
            email: &u.email,
            full_name: &u.full_name,
            phone_number: &u.phone_number,
        }
    }
}

impl UserSnapshot<'_> {
    pub fn to_audit_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A task row as stored; the description is still an envelope.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub encrypted_description: Option<String>,
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOperation {
    Create,
    Update,
    Delete,
}

impl AuditOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditOperation::Create => "CREATE",
            AuditOperation::Update => "UPDATE",
            AuditOperation::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Only the audit-log reader used by tests needs to decode tags.
#[cfg(test)]
impl std::str::FromStr for AuditOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(AuditOperation::Create),
            "UPDATE" => Ok(AuditOperation::Update),
            "DELETE" => Ok(AuditOperation::Delete),
            other => Err(format!("unknown audit operation tag: {other}")),
        }
    }
}

/// One row of the append-only `logs` table.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub operation: AuditOperation,
    /// Envelope of the [`UserSnapshot`] JSON.
    pub data: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
