//! Configuration file handling

use serde::Deserialize;
use std::path::Path;

use super::paths::config_path;
use super::{Error, Result};

/// Environment variable that overrides the configured base URL
pub const BASE_URL_ENV: &str = "STOREFRONT_BASE_URL";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the API under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Messages the remote API answers with for the user lifecycle
    #[serde(default)]
    pub messages: Messages,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            http: HttpConfig::default(),
            messages: Messages::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://automationexercise.com".to_string()
}

/// HTTP client settings
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "storefront-contract".to_string()
}

/// Lifecycle messages
///
/// The remote API reports every outcome with HTTP 200 and a `message` field,
/// so the lifecycle decides success by message text.
#[derive(Debug, Deserialize, Clone)]
pub struct Messages {
    #[serde(default = "default_account_not_found")]
    pub account_not_found: String,

    #[serde(default = "default_account_deleted")]
    pub account_deleted: String,

    #[serde(default = "default_user_created")]
    pub user_created: String,

    #[serde(default = "default_email_exists")]
    pub email_exists: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            account_not_found: default_account_not_found(),
            account_deleted: default_account_deleted(),
            user_created: default_user_created(),
            email_exists: default_email_exists(),
        }
    }
}

fn default_account_not_found() -> String {
    "Account not found!".to_string()
}
fn default_account_deleted() -> String {
    "Account deleted!".to_string()
}
fn default_user_created() -> String {
    "User created!".to_string()
}
fn default_email_exists() -> String {
    "Email already exists!".to_string()
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist. The
    /// `STOREFRONT_BASE_URL` environment variable wins over the file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load from `path`, or from the default config file when `None`
    ///
    /// An explicit path must exist. The environment override applies either way.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!(%url, "Base URL overridden from environment");
                self.base_url = url;
            }
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
