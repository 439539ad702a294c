//! Configuration for the ad slot subsystem.
//!
//! Settings are read from a TOML file. Every field has a default, so a
//! partial file (or none at all) is valid:
//!
//! ```toml
//! [script]
//! ad_client = "ca-pub-0000000000000000"
//! max_attempts = 3
//!
//! [environment]
//! preview_suffixes = ["vercel.app"]
//! ```
//!
//! The default location is the platform config folder:
//! - macOS: ~/Library/Application Support/com.adslot.adslot/
//! - Windows: %APPDATA%/adslot/adslot/config/
//! - Linux: ~/.config/adslot/

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{AdsError, Result};
use crate::format::DEFAULT_MOBILE_BREAKPOINT;
use crate::loader::Backoff;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "adslot";
const APP_NAME: &str = "adslot";
const CONFIG_FILENAME: &str = "adslot.toml";

/// Default cap on script load attempts.
pub const MAX_ADSENSE_RETRIES: u32 = 3;

/// Default ad-network script endpoint.
pub const DEFAULT_SCRIPT_URL: &str =
    "https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js";

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsConfig {
    /// Script loading and retry behavior.
    pub script: ScriptConfig,
    /// Host classification.
    pub environment: EnvironmentConfig,
    /// Viewport classification.
    pub viewport: ViewportConfig,
}

/// Script endpoint and retry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Script URL without query parameters.
    pub url: String,
    /// Publisher id (`ca-pub-...`). Empty means none.
    pub ad_client: String,
    /// Maximum load attempts before giving up.
    pub max_attempts: u32,
    /// Delay after the first failure, in milliseconds.
    pub retry_base_ms: u64,
    /// Upper bound on any retry delay, in milliseconds.
    pub retry_max_ms: u64,
    /// Per-attempt request timeout, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SCRIPT_URL.to_string(),
            ad_client: String::new(),
            max_attempts: MAX_ADSENSE_RETRIES,
            retry_base_ms: 1_000,
            retry_max_ms: 10_000,
            timeout_ms: 10_000,
        }
    }
}

impl ScriptConfig {
    /// Retry delay curve.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.retry_base_ms),
            Duration::from_millis(self.retry_max_ms),
        )
    }

    /// Per-attempt timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full script source including the client query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] if `url` is not an absolute URL.
    pub fn script_src(&self) -> Result<Url> {
        let mut url = Url::parse(self.url.trim())
            .map_err(|e| AdsError::Config(format!("script.url {:?}: {e}", self.url)))?;
        if !self.ad_client.is_empty() {
            url.query_pairs_mut().append_pair("client", &self.ad_client);
        }
        Ok(url)
    }
}

/// Hosts on which ads are suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Exact loopback host names.
    pub loopback_hosts: Vec<String>,
    /// Preview-hosting domains; subdomains match too.
    pub preview_suffixes: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            loopback_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "::1".to_string(),
            ],
            preview_suffixes: vec!["vercel.app".to_string(), "netlify.app".to_string()],
        }
    }
}

/// Viewport classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Widths below this are mobile.
    pub mobile_breakpoint: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: DEFAULT_MOBILE_BREAKPOINT,
        }
    }
}

impl AdsConfig {
    /// Get the default config file path.
    ///
    /// Returns `None` if the platform-specific directory cannot be determined.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// Load settings from the default path.
    ///
    /// Returns defaults if:
    /// - The file doesn't exist
    /// - The file cannot be read or parsed
    /// - The platform-specific directory cannot be determined
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            tracing::warn!("Could not determine config path, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => {
                tracing::info!("Loaded ad config from {:?}", path);
                config
            }
            Err(AdsError::Io(_)) if !path.exists() => {
                tracing::info!("No ad config found at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load ad config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Load and validate settings from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        if self.script.max_attempts == 0 {
            return Err(AdsError::Config(
                "script.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.script.retry_base_ms > self.script.retry_max_ms {
            return Err(AdsError::Config(format!(
                "script.retry_base_ms ({}) exceeds script.retry_max_ms ({})",
                self.script.retry_base_ms, self.script.retry_max_ms
            )));
        }
        if self.script.url.trim().is_empty() {
            return Err(AdsError::Config("script.url must not be empty".to_string()));
        }
        self.script.script_src()?;
        if self.viewport.mobile_breakpoint == 0 {
            return Err(AdsError::Config(
                "viewport.mobile_breakpoint must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
