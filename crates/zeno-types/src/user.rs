//! Users, roles, and favorites. Owned by the external auth/relational store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role claim attached to a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Standard,
}

/// Identity returned by the external auth provider for a valid session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

/// A fully authorized caller: both gates passed, role resolved.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub user: AuthUser,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Role-tagged user record from the role table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A user-to-tool favorite relation with an optional note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Favorite {
    pub user_id: String,
    #[serde(rename = "toolId")]
    pub tool_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
