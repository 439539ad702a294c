//! Error types for the ad slot subsystem.

use thiserror::Error;

/// Errors that can occur while resolving, loading, or configuring ad slots.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdsError {
    /// A format key that is not part of the fixed catalog.
    #[error("unknown ad format: {0:?}")]
    UnknownFormatKind(String),

    /// The ad-network script could not be loaded.
    #[error("ad script failed to load: {0}")]
    ScriptLoad(String),

    /// A single slot's creative failed to load.
    #[error("creative failed to load for slot {0}")]
    CreativeLoad(String),

    /// Invalid configuration values.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(String),

    /// No async runtime was available to drive the loader.
    #[error("no async runtime available: {0}")]
    Runtime(String),
}

impl AdsError {
    /// Returns a neutral message safe to surface outside the subsystem.
    ///
    /// End users never see raw error text, so every variant maps to
    /// one of a few generic strings.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::UnknownFormatKind(_) | Self::Config(_) => "Ad configuration is invalid.",
            Self::ScriptLoad(_) | Self::CreativeLoad(_) => "Advertisement unavailable.",
            Self::Io(_) | Self::Runtime(_) => "An unexpected error occurred.",
        }
    }

    /// Returns whether this error is transient and may succeed on retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ScriptLoad(_) | Self::Io(_))
    }
}

impl From<reqwest::Error> for AdsError {
    fn from(err: reqwest::Error) -> Self {
        Self::ScriptLoad(err.to_string())
    }
}

impl From<std::io::Error> for AdsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for AdsError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type alias for ad slot operations.
pub type Result<T> = std::result::Result<T, AdsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_hide_details() {
        let err = AdsError::ScriptLoad("dns error: pagead2 unreachable".to_string());
        assert_eq!(err.user_message(), "Advertisement unavailable.");
        assert!(!err.user_message().contains("dns"));

        let err = AdsError::UnknownFormatKind("bogus-key".to_string());
        assert!(err.user_message().contains("configuration"));
    }

    #[test]
    fn test_retryable() {
        assert!(AdsError::ScriptLoad("timeout".to_string()).is_retryable());
        assert!(AdsError::Io("reset".to_string()).is_retryable());
        assert!(!AdsError::UnknownFormatKind("bogus".to_string()).is_retryable());
        assert!(!AdsError::CreativeLoad("slot-1".to_string()).is_retryable());
    }

    #[test]
    fn test_display_includes_key() {
        let err = AdsError::UnknownFormatKind("bogus-key".to_string());
        assert_eq!(err.to_string(), "unknown ad format: \"bogus-key\"");
    }
}
