use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::PathBuf};
use tracing::{debug, warn};

use super::currency::{CurrencyCode, SupportedCurrencies};
use super::history::DEFAULT_HISTORY_CAPACITY;

/// Environment variable that overrides `api_key` from the config file.
pub const API_KEY_ENV: &str = "FREECURRENCY_API_KEY";

pub const DEFAULT_FREECURRENCY_URL: &str = "https://api.freecurrencyapi.com";

const DEFAULT_CURRENCIES: [&str; 10] = [
    "USD", "EUR", "JPY", "BGN", "DKK", "CZK", "HRK", "PLN", "GBP", "TRY",
];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FreeCurrencyProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub freecurrency: Option<FreeCurrencyProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            freecurrency: Some(FreeCurrencyProviderConfig {
                base_url: DEFAULT_FREECURRENCY_URL.to_string(),
            }),
        }
    }
}

fn default_currencies() -> Vec<CurrencyCode> {
    DEFAULT_CURRENCIES
        .iter()
        .filter_map(|code| CurrencyCode::parse(code).ok())
        .collect()
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_currencies")]
    pub currencies: Vec<CurrencyCode>,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_key: None,
            currencies: default_currencies(),
            history_capacity: default_history_capacity(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "fxconv")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.currencies.len() >= 2,
            "At least two currencies are required, found {}",
            self.currencies.len()
        );
        let mut seen = HashSet::new();
        for code in &self.currencies {
            ensure!(seen.insert(code), "Duplicate currency: {code}");
        }
        ensure!(
            self.history_capacity > 0,
            "history_capacity must be at least 1"
        );
        Ok(())
    }

    /// The API key to send, preferring a non-empty `env_value` over the file.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> String {
        let key = env_value
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_key.clone())
            .unwrap_or_default();
        if key.is_empty() {
            warn!("No API key configured; set {API_KEY_ENV} or api_key in the config file");
        }
        key
    }

    pub fn supported_currencies(&self) -> SupportedCurrencies {
        SupportedCurrencies::new(self.currencies.clone())
    }

    pub fn freecurrency_base_url(&self) -> &str {
        self.providers
            .freecurrency
            .as_ref()
            .map_or(DEFAULT_FREECURRENCY_URL, |p| &p.base_url)
    }
}
