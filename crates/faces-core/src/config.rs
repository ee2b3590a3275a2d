//! Application configuration management.
//!
//! This module handles loading and saving the configuration: API location,
//! request timeout, payment currency, keychain service name and the last
//! user greeted.
//!
//! Configuration is stored at `~/.config/faces/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_API_URL;
use crate::api::ClientConfig;
use crate::auth::credentials::DEFAULT_SERVICE_NAME;
use crate::payment::DEFAULT_CURRENCY;

/// Application name used for config directory paths
const APP_NAME: &str = "faces";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub currency_code: Option<String>,
    pub keyring_service: Option<String>,
    pub last_user_name: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn currency_code(&self) -> &str {
        self.currency_code.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn keyring_service(&self) -> &str {
        self.keyring_service.as_deref().unwrap_or(DEFAULT_SERVICE_NAME)
    }

    /// Connection settings for the storefront client
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.api_url());
        if let Some(secs) = self.request_timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}
