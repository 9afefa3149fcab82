//! Users, roles, and favorites, owned by the external relational store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use zeno_types::{Favorite, Role, UserRecord};

use crate::{Result, ZenoError};

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<UserRecord>>;
    /// Role from the role table; `None` when the user has no row.
    async fn get_role(&self, user_id: &str) -> Result<Option<Role>>;
    async fn set_user_role(&self, user_id: &str, role: Role) -> Result<UserRecord>;
    async fn delete_user(&self, user_id: &str) -> Result<()>;

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>>;
    /// Rejects a second favorite for the same (user, tool) pair.
    async fn add_favorite(&self, favorite: Favorite) -> Result<Favorite>;
    async fn update_favorite_note(
        &self,
        user_id: &str,
        tool_id: Uuid,
        note: Option<String>,
    ) -> Result<Favorite>;
    async fn remove_favorite(&self, user_id: &str, tool_id: Uuid) -> Result<()>;
}

// ============ In-memory backend ============

/// Test backend; `seed_user` stands in for auth-provider signups.
#[derive(Default)]
pub struct MemoryDirectory {
    users: DashMap<String, UserRecord>,
    favorites: DashMap<String, Favorite>,
}

fn favorite_key(user_id: &str, tool_id: Uuid) -> String {
    format!("{user_id}:{tool_id}")
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, id: impl Into<String>, email: impl Into<String>, role: Role) {
        let id = id.into();
        self.users.insert(
            id.clone(),
            UserRecord {
                id,
                email: email.into(),
                role,
                created_at: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectory {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }

    async fn get_role(&self, user_id: &str) -> Result<Option<Role>> {
        Ok(self.users.get(user_id).map(|u| u.role))
    }

    async fn set_user_role(&self, user_id: &str, role: Role) -> Result<UserRecord> {
        let mut user = self
            .users
            .get_mut(user_id)
            .ok_or_else(|| ZenoError::NotFound(format!("user {user_id}")))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        self.users
            .remove(user_id)
            .ok_or_else(|| ZenoError::NotFound(format!("user {user_id}")))?;
        self.favorites.retain(|_, f| f.user_id != user_id);
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let mut favorites: Vec<Favorite> = self
            .favorites
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.value().clone())
            .collect();
        favorites.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(favorites)
    }

    async fn add_favorite(&self, favorite: Favorite) -> Result<Favorite> {
        let key = favorite_key(&favorite.user_id, favorite.tool_id);
        if self.favorites.contains_key(&key) {
            return Err(ZenoError::Conflict(format!(
                "tool {} is already a favorite",
                favorite.tool_id
            )));
        }
        self.favorites.insert(key, favorite.clone());
        Ok(favorite)
    }

    async fn update_favorite_note(
        &self,
        user_id: &str,
        tool_id: Uuid,
        note: Option<String>,
    ) -> Result<Favorite> {
        let mut favorite = self
            .favorites
            .get_mut(&favorite_key(user_id, tool_id))
            .ok_or_else(|| ZenoError::NotFound(format!("favorite for tool {tool_id}")))?;
        favorite.note = note;
        Ok(favorite.clone())
    }

    async fn remove_favorite(&self, user_id: &str, tool_id: Uuid) -> Result<()> {
        self.favorites
            .remove(&favorite_key(user_id, tool_id))
            .ok_or_else(|| ZenoError::NotFound(format!("favorite for tool {tool_id}")))?;
        Ok(())
    }
}

// ============ PostgREST backend ============

/// PostgREST client over the `user_roles` and `favorites` tables.
pub struct SupabaseDirectory {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseDirectory {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
        })
    }

    fn url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    if status == reqwest::StatusCode::CONFLICT {
        return Err(ZenoError::Conflict(message));
    }
    Err(ZenoError::Upstream {
        service: "supabase",
        message: format!("{status}: {message}"),
    })
}

#[derive(Deserialize)]
struct RoleRow {
    role: Role,
}

#[async_trait]
impl DirectoryStore for SupabaseDirectory {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        let resp = self
            .request(self.client.get(self.url("user_roles")))
            .query(&[("select", "*"), ("order", "created_at.asc")])
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn get_role(&self, user_id: &str) -> Result<Option<Role>> {
        let resp = self
            .request(self.client.get(self.url("user_roles")))
            .query(&[("id", format!("eq.{user_id}")), ("select", "role".into())])
            .send()
            .await?;
        let rows: Vec<RoleRow> = check(resp).await?.json().await?;
        Ok(rows.into_iter().next().map(|r| r.role))
    }

    async fn set_user_role(&self, user_id: &str, role: Role) -> Result<UserRecord> {
        let resp = self
            .request(self.client.patch(self.url("user_roles")))
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "role": role }))
            .send()
            .await?;
        let rows: Vec<UserRecord> = check(resp).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ZenoError::NotFound(format!("user {user_id}")))
    }

    async fn delete_user(&self, user_id: &str) -> Result<()> {
        let resp = self
            .request(self.client.delete(self.url("user_roles")))
            .query(&[("id", format!("eq.{user_id}"))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = check(resp).await?.json().await?;
        if rows.is_empty() {
            return Err(ZenoError::NotFound(format!("user {user_id}")));
        }

        // Favorites cascade; a failure here leaves orphans for the next delete.
        let resp = self
            .request(self.client.delete(self.url("favorites")))
            .query(&[("user_id", format!("eq.{user_id}"))])
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn list_favorites(&self, user_id: &str) -> Result<Vec<Favorite>> {
        let resp = self
            .request(self.client.get(self.url("favorites")))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("select", "*".into()),
                ("order", "created_at.asc".into()),
            ])
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn add_favorite(&self, favorite: Favorite) -> Result<Favorite> {
        let resp = self
            .request(self.client.post(self.url("favorites")))
            .header("Prefer", "return=representation")
            .json(&favorite)
            .send()
            .await?;
        let rows: Vec<Favorite> = check(resp).await?.json().await?;
        rows.into_iter().next().ok_or_else(|| ZenoError::Upstream {
            service: "supabase",
            message: "favorite insert returned no row".to_string(),
        })
    }

    async fn update_favorite_note(
        &self,
        user_id: &str,
        tool_id: Uuid,
        note: Option<String>,
    ) -> Result<Favorite> {
        let resp = self
            .request(self.client.patch(self.url("favorites")))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("toolId", format!("eq.{tool_id}")),
            ])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "note": note }))
            .send()
            .await?;
        let rows: Vec<Favorite> = check(resp).await?.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| ZenoError::NotFound(format!("favorite for tool {tool_id}")))
    }

    async fn remove_favorite(&self, user_id: &str, tool_id: Uuid) -> Result<()> {
        let resp = self
            .request(self.client.delete(self.url("favorites")))
            .query(&[
                ("user_id", format!("eq.{user_id}")),
                ("toolId", format!("eq.{tool_id}")),
            ])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = check(resp).await?.json().await?;
        if rows.is_empty() {
            return Err(ZenoError::NotFound(format!("favorite for tool {tool_id}")));
        }
        Ok(())
    }
}

// ============ Unconfigured backend ============

pub struct UnconfiguredDirectory;

macro_rules! unconfigured {
    () => {
        Err(ZenoError::MissingCredential("user directory"))
    };
}

#[async_trait]
impl DirectoryStore for UnconfiguredDirectory {
    async fn list_users(&self) -> Result<Vec<UserRecord>> {
        unconfigured!()
    }
    async fn get_role(&self, _user_id: &str) -> Result<Option<Role>> {
        unconfigured!()
    }
    async fn set_user_role(&self, _user_id: &str, _role: Role) -> Result<UserRecord> {
        unconfigured!()
    }
    async fn delete_user(&self, _user_id: &str) -> Result<()> {
        unconfigured!()
    }
    async fn list_favorites(&self, _user_id: &str) -> Result<Vec<Favorite>> {
        unconfigured!()
    }
    async fn add_favorite(&self, _favorite: Favorite) -> Result<Favorite> {
        unconfigured!()
    }
    async fn update_favorite_note(
        &self,
        _user_id: &str,
        _tool_id: Uuid,
        _note: Option<String>,
    ) -> Result<Favorite> {
        unconfigured!()
    }
    async fn remove_favorite(&self, _user_id: &str, _tool_id: Uuid) -> Result<()> {
        unconfigured!()
    }
}
