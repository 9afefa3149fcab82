//! Two-gate access control.
//!
//! Gate A is a shared portal password compared verbatim against
//! configuration. Gate B is a per-user bearer session verified against the
//! external auth provider, with the role claim looked up from the role
//! table. Both gates must pass to reach protected content.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use zeno_types::{AuthUser, Identity, Role};

use crate::directory::DirectoryStore;
use crate::{Result, ZenoError};

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve a bearer token to its user, or `Unauthorized`.
    async fn verify_session(&self, token: &str) -> Result<AuthUser>;
    /// Invalidate the session upstream. Best-effort.
    async fn sign_out(&self, token: &str) -> Result<()>;
}

// ============ Supabase backend ============

/// GoTrue-style auth endpoint client.
pub struct SupabaseAuth {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
}

impl SupabaseAuth {
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
}

#[derive(Deserialize)]
struct GotrueUser {
    id: String,
    #[serde(default)]
    email: String,
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    async fn verify_session(&self, token: &str) -> Result<AuthUser> {
        let resp = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ZenoError::Unauthorized("invalid session".to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ZenoError::Upstream {
                service: "supabase-auth",
                message: format!("{status}: {body}"),
            });
        }

        let user: GotrueUser = resp.json().await?;
        Ok(AuthUser {
            id: user.id,
            email: user.email,
        })
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        let resp = self
            .client
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await?;
        // 401 on an already-dead session is fine; the gate is clear either way.
        if resp.status().is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ZenoError::Upstream {
                service: "supabase-auth",
                message: body,
            });
        }
        Ok(())
    }
}

// ============ In-memory backend ============

/// Token table for tests; `issue` mints a session.
#[derive(Default)]
pub struct MemoryAuth {
    tokens: DashMap<String, AuthUser>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, token: impl Into<String>, user: AuthUser) {
        self.tokens.insert(token.into(), user);
    }
}

#[async_trait]
impl AuthProvider for MemoryAuth {
    async fn verify_session(&self, token: &str) -> Result<AuthUser> {
        self.tokens
            .get(token)
            .map(|u| u.clone())
            .ok_or_else(|| ZenoError::Unauthorized("invalid session".to_string()))
    }

    async fn sign_out(&self, token: &str) -> Result<()> {
        self.tokens.remove(token);
        Ok(())
    }
}

// ============ Unconfigured backend ============

pub struct UnconfiguredAuth;

#[async_trait]
impl AuthProvider for UnconfiguredAuth {
    async fn verify_session(&self, _token: &str) -> Result<AuthUser> {
        Err(ZenoError::MissingCredential("auth provider"))
    }
    async fn sign_out(&self, _token: &str) -> Result<()> {
        Err(ZenoError::MissingCredential("auth provider"))
    }
}

// ============ Gate ============

/// Combines both gates and resolves the caller's role.
#[derive(Clone)]
pub struct AuthGate {
    portal_password: Option<String>,
    provider: Arc<dyn AuthProvider>,
    directory: Arc<dyn DirectoryStore>,
}

impl AuthGate {
    pub fn new(
        portal_password: Option<String>,
        provider: Arc<dyn AuthProvider>,
        directory: Arc<dyn DirectoryStore>,
    ) -> Self {
        Self {
            portal_password,
            provider,
            directory,
        }
    }

    /// Gate A alone: verbatim comparison against the configured password.
    pub fn check_password(&self, supplied: &str) -> Result<()> {
        let expected = self
            .portal_password
            .as_deref()
            .ok_or(ZenoError::MissingCredential("portal password"))?;
        if supplied == expected {
            Ok(())
        } else {
            Err(ZenoError::Unauthorized("wrong portal password".to_string()))
        }
    }

    /// Both gates. A user with no role-table row defaults to standard.
    pub async fn authorize(
        &self,
        password: Option<&str>,
        bearer: Option<&str>,
    ) -> Result<Identity> {
        let password =
            password.ok_or_else(|| ZenoError::Unauthorized("portal password required".into()))?;
        self.check_password(password)?;

        let token = bearer.ok_or_else(|| ZenoError::Unauthorized("session required".into()))?;
        let user = self.provider.verify_session(token).await?;
        let role = self
            .directory
            .get_role(&user.id)
            .await?
            .unwrap_or(Role::Standard);

        Ok(Identity { user, role })
    }

    pub async fn sign_out(&self, bearer: Option<&str>) -> Result<()> {
        if let Some(token) = bearer {
            self.provider.sign_out(token).await?;
        }
        Ok(())
    }
}
