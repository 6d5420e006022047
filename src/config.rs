//! Configuration loading with layered overrides.
//!
//! Config is loaded in order (each layer overrides the previous):
//! 1. Default values
//! 2. Config file (TOML)
//! 3. Environment variables
//! 4. CLI arguments
//!
//! Secrets (the JWT signing key and the AI API key) are never read from
//! config files - they must come from environment variables or CLI arguments.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Minimum JWT secret length in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Configuration shared with every request handler.
pub type SharedConfig = Arc<Config>;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub auth: Auth,
    #[serde(default)]
    pub ai: Ai,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. `["*"]` reflects any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Send `Strict-Transport-Security`.
    #[serde(default)]
    pub hsts: bool,
    #[serde(default)]
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            hsts: false,
            rate_limit: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Per-IP request budget.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "inkstone.db".to_string()
}

/// Authentication settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct Auth {
    /// JWT secret for token signing/verification.
    /// Must be provided via environment variable or CLI - never from config file.
    #[serde(default, skip_serializing)]
    pub jwt_secret: String,

    /// Token expiry in days.
    #[serde(default = "default_token_expiry_days")]
    pub token_expiry_days: u32,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_days: default_token_expiry_days(),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("token_expiry_days", &self.token_expiry_days)
            .finish()
    }
}

fn default_token_expiry_days() -> u32 {
    7
}

/// External text-generation API settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct Ai {
    /// API key. Environment only; AI features fall back to canned answers
    /// when it is absent.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_ai_model")]
    pub model: String,
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Ai {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_ai_model(),
            base_url: default_ai_base_url(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl fmt::Debug for Ai {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ai")
            .field("api_key", &self.api_key.as_deref().map(redact))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_ai_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_ai_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<redacted>" }
}

/// CLI-supplied overrides, applied last.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    pub host: Option<&'a str>,
    pub port: Option<u16>,
    pub database_url: Option<&'a str>,
    pub jwt_secret: Option<&'a str>,
}

/// Builder for loading configuration with customizable options.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix (e.g., "MYAPP" -> MYAPP_HOST, MYAPP_PORT)
    pub env_prefix: String,
    /// Name of the JWT secret environment variable (without prefix)
    pub jwt_secret_env: String,
    /// Name of the AI API key environment variable (without prefix)
    pub ai_key_env: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            env_prefix: "INKSTONE".to_string(),
            jwt_secret_env: "JWT_SECRET".to_string(),
            ai_key_env: "AI_API_KEY".to_string(),
        }
    }
}

impl ConfigLoader {
    /// Create a new config loader with the given environment prefix.
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
            ..Default::default()
        }
    }

    /// Load configuration from file, environment, and CLI overrides.
    pub fn load(&self, config_path: Option<&Path>, cli: Overrides<'_>) -> crate::Result<Config> {
        // Start with file config or defaults
        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {e}")))?;
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?
        } else {
            Config::default()
        };

        // Secrets never come from the file
        config.auth.jwt_secret = String::new();
        config.ai.api_key = None;

        // Override with environment variables
        let prefix = &self.env_prefix;

        if let Ok(host) = std::env::var(format!("{prefix}_HOST")) {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var(format!("{prefix}_PORT"))
            && let Ok(p) = port.parse()
        {
            config.server.port = p;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(secret) = std::env::var(format!("{}_{}", prefix, self.jwt_secret_env)) {
            config.auth.jwt_secret = secret;
        }
        if let Ok(key) = std::env::var(format!("{}_{}", prefix, self.ai_key_env))
            && !key.is_empty()
        {
            config.ai.api_key = Some(key);
        }

        // Override with CLI arguments
        if let Some(host) = cli.host {
            config.server.host = host.to_string();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(url) = cli.database_url {
            config.database.url = url.to_string();
        }
        if let Some(secret) = cli.jwt_secret {
            config.auth.jwt_secret = secret.to_string();
        }

        // Validate required fields
        if config.auth.jwt_secret.is_empty() {
            return Err(Error::Config(format!(
                "{}_{} must be set via environment variable or --jwt-secret flag",
                prefix, self.jwt_secret_env
            )));
        }
        if config.auth.jwt_secret.len() < MIN_SECRET_LENGTH {
            return Err(Error::Config(format!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} bytes"
            )));
        }

        Ok(config)
    }
}
