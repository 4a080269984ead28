//! Server configuration.
//!
//! Loaded from `mercatu.toml` in the working directory, or from the path in
//! the `MERCATU_CONFIG` environment variable. Every field has a default, so
//! a missing file still boots a working dev server.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// What /api/ping answers with.
    #[serde(default = "default_ping_message")]
    pub ping_message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Sessions older than this are dropped on first use.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,
    /// Phone login uses a fixed code; only enable outside production.
    #[serde(default = "default_phone_login_enabled")]
    pub phone_login_enabled: bool,
    #[serde(default = "default_phone_login_code")]
    pub phone_login_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
    /// Radius applied to /api/requests/nearby when the caller gives none.
    #[serde(default = "default_nearby_radius_km")]
    pub nearby_radius_km: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Seed demo accounts, requests, and a conversation on startup.
    #[serde(default = "default_demo_seed")]
    pub seed: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_ping_message() -> String {
    "pong".to_string()
}

fn default_session_ttl_days() -> i64 {
    7
}

fn default_phone_login_enabled() -> bool {
    true
}

fn default_phone_login_code() -> String {
    "123456".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_max_page_size() -> u32 {
    100
}

fn default_nearby_radius_km() -> f64 {
    10.0
}

fn default_demo_seed() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ping_message: default_ping_message(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: default_session_ttl_days(),
            phone_login_enabled: default_phone_login_enabled(),
            phone_login_code: default_phone_login_code(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            nearby_radius_km: default_nearby_radius_km(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: default_demo_seed(),
        }
    }
}

impl Config {
    /// Load configuration from disk, falling back to defaults when the file
    /// does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let path =
            std::env::var("MERCATU_CONFIG").unwrap_or_else(|_| "mercatu.toml".to_string());
        if !Path::new(&path).exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
