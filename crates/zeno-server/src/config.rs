//! Server configuration.
//!
//! Listen address and tuning come from `config/default.toml`; credentials
//! come from the environment and are optional. A missing credential leaves
//! the matching backend unconfigured, so dependent requests answer 5xx
//! while the rest of the API keeps working.

use anyhow::Result;
use serde::Deserialize;
use zeno_core::DEFAULT_CHAT_MODEL;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Idle poll interval of the sync worker, seconds.
    #[serde(default = "default_worker_poll_secs")]
    pub worker_poll_secs: u64,

    /// Shared portal password (gate A). Env: `ZENO_PORTAL_PASSWORD`.
    #[serde(default)]
    pub portal_password: Option<String>,
    /// Redis-compatible REST endpoint. Env: `ZENO_KV_REST_URL` / `ZENO_KV_REST_TOKEN`.
    #[serde(default)]
    pub kv_rest_url: Option<String>,
    #[serde(default)]
    pub kv_rest_token: Option<String>,
    /// Supabase project. Env: `SUPABASE_URL` / `SUPABASE_SERVICE_ROLE_KEY`.
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_service_key: Option<String>,
    /// Env: `OPENAI_API_KEY`.
    #[serde(default)]
    pub openai_api_key: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_worker_poll_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            chat_model: default_chat_model(),
            worker_poll_secs: default_worker_poll_secs(),
            portal_password: None,
            kv_rest_url: None,
            kv_rest_token: None,
            supabase_url: None,
            supabase_service_key: None,
            openai_api_key: None,
        }
    }
}

impl Config {
    /// Load config from a specific file path, then overlay the environment.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.overlay_env();
        Ok(config)
    }

    /// Load from `config/default.toml`, then the user config dir, else
    /// defaults; the environment is overlaid in every case.
    pub fn load() -> Result<Self> {
        let local = std::path::PathBuf::from("config/default.toml");
        if local.exists() {
            return Self::load_from(&local);
        }

        if let Some(dir) = dirs::config_dir() {
            let user = dir.join("zeno").join("config.toml");
            if user.exists() {
                return Self::load_from(&user);
            }
        }

        let mut config = Config::default();
        config.overlay_env();
        Ok(config)
    }

    /// Environment credentials win over file values.
    fn overlay_env(&mut self) {
        for (var, slot) in [
            ("ZENO_PORTAL_PASSWORD", &mut self.portal_password),
            ("ZENO_KV_REST_URL", &mut self.kv_rest_url),
            ("ZENO_KV_REST_TOKEN", &mut self.kv_rest_token),
            ("SUPABASE_URL", &mut self.supabase_url),
            ("SUPABASE_SERVICE_ROLE_KEY", &mut self.supabase_service_key),
            ("OPENAI_API_KEY", &mut self.openai_api_key),
        ] {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *slot = Some(value);
                }
            }
        }
    }
}
