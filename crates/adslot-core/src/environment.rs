//! Runtime environment detection from host identity.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EnvironmentConfig;

/// Where the page is being served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Local or preview deployment; ads are never requested.
    Development,
    /// Public deployment.
    Production,
}

impl Environment {
    /// True for production deployments.
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Get a human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classifies hosts as development or production.
#[derive(Debug, Clone)]
pub struct EnvironmentDetector {
    loopback_hosts: Vec<String>,
    preview_suffixes: Vec<String>,
}

impl Default for EnvironmentDetector {
    fn default() -> Self {
        Self::new(&EnvironmentConfig::default())
    }
}

impl EnvironmentDetector {
    /// Build a detector from configuration.
    #[must_use]
    pub fn new(config: &EnvironmentConfig) -> Self {
        Self {
            loopback_hosts: config
                .loopback_hosts
                .iter()
                .map(|h| normalize_host(h))
                .collect(),
            preview_suffixes: config
                .preview_suffixes
                .iter()
                .map(|s| normalize_host(s.trim_start_matches('.')))
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Classify a host (as seen in the page URL, port allowed).
    #[must_use]
    pub fn detect(&self, host: &str) -> Environment {
        let host = normalize_host(host);
        if host.is_empty() || self.is_loopback(&host) || self.is_preview(&host) {
            Environment::Development
        } else {
            Environment::Production
        }
    }

    /// Shorthand for `detect(host).is_production()`.
    #[must_use]
    pub fn is_production(&self, host: &str) -> bool {
        self.detect(host).is_production()
    }

    fn is_loopback(&self, host: &str) -> bool {
        self.loopback_hosts.iter().any(|h| h == host) || host.ends_with(".localhost")
    }

    fn is_preview(&self, host: &str) -> bool {
        self.preview_suffixes
            .iter()
            .any(|suffix| host == suffix || is_subdomain_of(host, suffix))
    }
}

fn is_subdomain_of(host: &str, domain: &str) -> bool {
    host.strip_suffix(domain)
        .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Lowercase, strip the port and any trailing dot.
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = if let Some(rest) = host.strip_prefix('[') {
        // [::1]:3000
        rest.split(']').next().unwrap_or(rest)
    } else if host.matches(':').count() == 1 {
        host.split(':').next().unwrap_or(host)
    } else {
        host
    };
    host.trim_end_matches('.').to_ascii_lowercase()
}
