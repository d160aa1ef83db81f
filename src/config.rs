//! Configuration system for the `fixit` tool.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_TTL_SECS;
use crate::providers::{ProviderConfig, API_KEY_ENV_VAR, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};

/// Completion API settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ApiConfig {
    /// API key; usually supplied through OPENAI_API_KEY instead
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Base URL for OpenAI-compatible endpoints
    pub base_url: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Explanation cache settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Time-to-live in seconds
    pub ttl_secs: u64,
    /// Upper bound on stored entries (unbounded when unset)
    pub max_entries: Option<usize>,
    /// Cache fallback explanations produced after a failed request
    pub cache_fallbacks: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_TTL_SECS,
            max_entries: None,
            cache_fallbacks: true,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub cache: CacheConfig,
}

impl Config {
    /// Load config from file and apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::load_from_path(Self::config_path());
        config.apply_env_overrides();
        config
    }

    /// Load config from a specific path, returning defaults if it is missing
    /// or unreadable
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read config file");
                Self::default()
            }
        }
    }

    /// Get the config file path (~/.config/fixit/config.toml)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("fixit").join("config.toml"))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from a key lookup. Unparsable numbers are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.api.model = model;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.api.base_url = Some(url);
        }
        if let Some(secs) = lookup("API_TIMEOUT").and_then(|v| v.trim().parse().ok()) {
            self.api.timeout_secs = secs;
        }
        if let Some(secs) = lookup("CACHE_TTL").and_then(|v| v.trim().parse().ok()) {
            self.cache.ttl_secs = secs;
        }
        if let Some(value) = lookup("FIXIT_CACHE_ENABLED") {
            self.cache.enabled = parse_bool(&value);
        }
        if let Some(max) = lookup("FIXIT_CACHE_MAX_ENTRIES").and_then(|v| v.trim().parse().ok()) {
            self.cache.max_entries = Some(max);
        }
    }

    /// Problems that prevent explaining anything, keyed by setting
    pub fn validate(&self) -> BTreeMap<&'static str, String> {
        let mut errors = BTreeMap::new();

        let has_key = self
            .api
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false);
        if !has_key {
            errors.insert(
                "api_key",
                format!("API key is required. Set {API_KEY_ENV_VAR} or api.api_key"),
            );
        }

        if self.api.timeout_secs == 0 {
            errors.insert("timeout_secs", "API timeout must be positive".to_string());
        }

        if self.cache.ttl_secs == 0 {
            errors.insert("ttl_secs", "Cache TTL must be positive".to_string());
        }

        errors
    }

    /// Copy with the API key masked for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.api.api_key = self.api.api_key.as_deref().map(mask_secret);
        copy
    }

    /// Settings for the completion provider
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_key: self.api.api_key.clone(),
            model: self.api.model.clone(),
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

/// Interpret a configuration flag. Accepts true/1/yes/on/enabled.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

/// Keep only the last four characters of a secret
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("***{tail}")
}

/// Generate default config as TOML string
pub fn generate_default_config() -> String {
    r#"# fixit - failed command explanation configuration
# Place this file at ~/.config/fixit/config.toml

[api]
# API key (prefer the OPENAI_API_KEY environment variable)
# api_key = "sk-..."

# Model used for explanations
model = "gpt-3.5-turbo"

# OpenAI-compatible endpoint override
# base_url = "https://api.openai.com/v1"

# Request timeout in seconds
timeout_secs = 30

[cache]
# Reuse explanations for identical failures (command, stderr, exit code)
enabled = true

# Seconds before a cached explanation expires
ttl_secs = 3600

# Maximum cached explanations (unbounded when unset)
# max_entries = 500

# Also cache the fallback explanation produced when the API call fails
cache_fallbacks = true

# Environment variable overrides:
# OPENAI_API_KEY, OPENAI_MODEL, OPENAI_BASE_URL, API_TIMEOUT,
# CACHE_TTL, FIXIT_CACHE_ENABLED, FIXIT_CACHE_MAX_ENTRIES
"#
    .to_string()
}
