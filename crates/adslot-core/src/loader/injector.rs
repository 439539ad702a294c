//! Script injection backends.
//!
//! An injector performs exactly one load attempt and reports its outcome.
//! Retry policy lives in the loader, never here.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::config::ScriptConfig;
use crate::error::{AdsError, Result};

/// Performs one ad-script load attempt.
pub trait ScriptInjector: Send + Sync + 'static {
    /// Start attempt number `attempt` (1-based). The future resolves on the
    /// script's load or error signal.
    fn inject(&self, attempt: u32) -> BoxFuture<'static, Result<()>>;
}

/// Fetches the script endpoint over HTTP; any 2xx counts as loaded.
#[derive(Debug, Clone)]
pub struct HttpScriptInjector {
    client: reqwest::Client,
    src: reqwest::Url,
}

impl HttpScriptInjector {
    /// Build an injector for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Config`] for an invalid script URL, or
    /// [`AdsError::ScriptLoad`] if the HTTP client cannot be built.
    pub fn new(config: &ScriptConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("adslot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            src: config.script_src()?,
        })
    }

    /// The URL requested on each attempt.
    #[must_use]
    pub fn src(&self) -> &str {
        self.src.as_str()
    }
}

impl ScriptInjector for HttpScriptInjector {
    fn inject(&self, attempt: u32) -> BoxFuture<'static, Result<()>> {
        let request = self.client.get(self.src.clone());
        async move {
            tracing::debug!(attempt, "requesting ad script");
            let response = request.send().await?;
            response.error_for_status()?;
            Ok(())
        }
        .boxed()
    }
}

/// Replays a fixed sequence of outcomes; used for simulation and tests.
///
/// Attempts past the end of the sequence fail.
#[derive(Debug)]
pub struct ScriptedInjector {
    outcomes: Mutex<VecDeque<bool>>,
    latency: Duration,
    injections: AtomicU32,
}

impl ScriptedInjector {
    /// Outcomes in attempt order; `true` means the script loaded.
    pub fn new(outcomes: impl IntoIterator<Item = bool>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            latency: Duration::ZERO,
            injections: AtomicU32::new(0),
        }
    }

    /// `failures` failed attempts followed by a success.
    #[must_use]
    pub fn failing_then_loading(failures: u32) -> Self {
        Self::new((0..failures).map(|_| false).chain([true]))
    }

    /// Delay each outcome by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Number of `inject` calls so far.
    pub fn injections(&self) -> u32 {
        self.injections.load(Ordering::Acquire)
    }

    fn next_outcome(&self) -> bool {
        self.outcomes
            .lock()
            .map(|mut queue| queue.pop_front().unwrap_or(false))
            .unwrap_or(false)
    }
}

impl ScriptInjector for ScriptedInjector {
    fn inject(&self, attempt: u32) -> BoxFuture<'static, Result<()>> {
        self.injections.fetch_add(1, Ordering::AcqRel);
        let loaded = self.next_outcome();
        let latency = self.latency;
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            if loaded {
                Ok(())
            } else {
                Err(AdsError::ScriptLoad(format!("scripted failure on attempt {attempt}")))
            }
        }
        .boxed()
    }
}

impl<T: ScriptInjector> ScriptInjector for std::sync::Arc<T> {
    fn inject(&self, attempt: u32) -> BoxFuture<'static, Result<()>> {
        (**self).inject(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_outcomes_in_order() {
        let injector = ScriptedInjector::failing_then_loading(2);
        assert!(injector.inject(1).await.is_err());
        assert!(injector.inject(2).await.is_err());
        assert!(injector.inject(3).await.is_ok());
        // Past the end: failure.
        assert!(injector.inject(4).await.is_err());
        assert_eq!(injector.injections(), 4);
    }

    #[tokio::test]
    async fn test_scripted_failure_is_retryable() {
        let injector = ScriptedInjector::new([false]);
        let err = injector.inject(1).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_http_injector_src() {
        let config = ScriptConfig {
            ad_client: "ca-pub-9".to_string(),
            ..ScriptConfig::default()
        };
        let injector = HttpScriptInjector::new(&config).unwrap();
        assert!(injector.src().ends_with("adsbygoogle.js?client=ca-pub-9"));
    }
}
