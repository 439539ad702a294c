//! Shared ad-script loader with bounded retry.
//!
//! One [`ScriptLoader`] exists per page load and is shared (cheaply cloned)
//! by every slot. The first [`ScriptLoader::ensure_loaded`] call spawns a
//! single driver task that injects the script, waits for its signal, and
//! schedules retries with [`Backoff`] until the script loads or the attempt
//! cap is reached. Later calls are no-ops.
//!
//! State is published on two channels:
//! - a `watch` channel carrying the latest [`LoaderState`] (slots re-render on change)
//! - a `broadcast` channel carrying every [`LoaderTransition`] (diagnostics)
//!
//! [`ScriptLoader::shutdown`] closes the loader for good: no transition is
//! applied afterwards and no driver is started.

mod backoff;
mod injector;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::AbortHandle;

use crate::config::ScriptConfig;
use crate::error::{AdsError, Result};

pub use backoff::Backoff;
pub use injector::{HttpScriptInjector, ScriptInjector, ScriptedInjector};
pub use state::{Completion, LoaderFlags, LoaderPhase, LoaderState, LoaderTransition};

const TRANSITION_CAPACITY: usize = 32;

/// Settings for a [`ScriptLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    /// Publisher id stamped on live containers.
    pub ad_client: String,
    /// Attempt cap.
    pub max_attempts: u32,
    /// Delay curve between attempts.
    pub backoff: Backoff,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self::from(&ScriptConfig::default())
    }
}

impl From<&ScriptConfig> for LoaderSettings {
    fn from(config: &ScriptConfig) -> Self {
        Self {
            ad_client: config.ad_client.clone(),
            max_attempts: config.max_attempts,
            backoff: config.backoff(),
        }
    }
}

/// Handle to the process-wide script loader.
#[derive(Clone)]
pub struct ScriptLoader {
    inner: Arc<Inner>,
}

struct Inner {
    shared: Arc<Shared>,
    injector: Arc<dyn ScriptInjector>,
    ad_client: String,
    backoff: Backoff,
    runtime: Handle,
    driver: OnceLock<DriverGuard>,
}

/// State owned by the loader and read by the driver task.
struct Shared {
    state: watch::Sender<LoaderState>,
    transitions: broadcast::Sender<LoaderTransition>,
    /// Written only while holding the `state` write lock.
    closed: AtomicBool,
}

/// Aborts the driver task (and any pending retry timer) when dropped.
struct DriverGuard(AbortHandle);

impl Drop for DriverGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

impl ScriptLoader {
    /// Create a loader on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`AdsError::Runtime`] when called outside a tokio runtime.
    pub fn new(settings: LoaderSettings, injector: impl ScriptInjector) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| AdsError::Runtime(e.to_string()))?;
        Ok(Self::with_handle(runtime, settings, injector))
    }

    /// Create a loader that spawns its driver on `runtime`.
    pub fn with_handle(
        runtime: Handle,
        settings: LoaderSettings,
        injector: impl ScriptInjector,
    ) -> Self {
        let (state, _) = watch::channel(LoaderState::new(settings.max_attempts));
        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                shared: Arc::new(Shared {
                    state,
                    transitions,
                    closed: AtomicBool::new(false),
                }),
                injector: Arc::new(injector),
                ad_client: settings.ad_client,
                backoff: settings.backoff,
                runtime,
                driver: OnceLock::new(),
            }),
        }
    }

    /// Start loading the script unless a load was already requested.
    ///
    /// Safe to call from any number of slots; injection starts at most once.
    pub fn ensure_loaded(&self) {
        if !self.inner.shared.transition(LoaderState::begin) {
            tracing::trace!(phase = %self.phase(), "ad script load already requested");
            return;
        }

        let task = self.inner.runtime.spawn(drive(
            Arc::clone(&self.inner.shared),
            Arc::clone(&self.inner.injector),
            self.inner.backoff,
        ));
        // `begin` succeeds once per loader, so this slot is always empty.
        let _ = self.inner.driver.set(DriverGuard(task.abort_handle()));

        // A shutdown that raced `begin` may have missed the guard.
        if self.inner.shared.is_closed() {
            self.abort_driver();
        }
    }

    /// Close the loader and cancel any in-flight attempt or pending retry.
    ///
    /// The state is left as-is; a loader torn down mid-retry stays pending.
    /// Later [`ensure_loaded`](Self::ensure_loaded) calls are no-ops.
    pub fn shutdown(&self) {
        self.inner.shared.close();
        self.abort_driver();
    }

    /// The loader was shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.shared.is_closed()
    }

    fn abort_driver(&self) {
        if let Some(guard) = self.inner.driver.get() {
            tracing::debug!("cancelling ad script driver");
            guard.0.abort();
        }
    }

    /// Publisher id for live containers.
    #[must_use]
    pub fn ad_client(&self) -> &str {
        &self.inner.ad_client
    }

    /// Latest state snapshot.
    #[must_use]
    pub fn state(&self) -> LoaderState {
        *self.inner.shared.state.borrow()
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> LoaderPhase {
        self.state().phase()
    }

    /// The script has loaded.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state().is_ready()
    }

    /// Loading failed and no retries remain.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.state().is_exhausted()
    }

    /// Diagnostic flag view of the current state.
    #[must_use]
    pub fn flags(&self) -> LoaderFlags {
        self.state().flags()
    }

    /// Receiver notified whenever the state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoaderState> {
        self.inner.shared.state.subscribe()
    }

    /// Receiver of every phase change from now on.
    #[must_use]
    pub fn transitions(&self) -> broadcast::Receiver<LoaderTransition> {
        self.inner.shared.transitions.subscribe()
    }
}

impl std::fmt::Debug for ScriptLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptLoader")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Shared {
    /// Apply `update` atomically; publish if it changed the phase.
    ///
    /// Refused once the loader is closed.
    fn transition(&self, update: impl FnOnce(&mut LoaderState) -> bool) -> bool {
        let mut change = None;
        self.state.send_if_modified(|state| {
            if self.closed.load(Ordering::Acquire) {
                return false;
            }
            let from = state.phase();
            if !update(state) {
                return false;
            }
            change = Some(LoaderTransition {
                from,
                to: state.phase(),
                attempts: state.attempts(),
            });
            true
        });
        match change {
            Some(transition) => {
                // No subscribers is fine.
                let _ = self.transitions.send(transition);
                true
            }
            None => false,
        }
    }

    /// Mark closed under the state lock, so it orders against `transition`.
    fn close(&self) {
        self.state.send_if_modified(|_| {
            self.closed.store(true, Ordering::Release);
            false
        });
    }

    fn is_closed(&self) -> bool {
        let _state = self.state.borrow();
        self.closed.load(Ordering::Acquire)
    }

    fn complete(&self, outcome: &Result<()>) -> Completion {
        let mut completion = Completion::Ignored;
        self.transition(|state| {
            completion = state.complete(outcome);
            completion != Completion::Ignored
        });
        completion
    }
}

async fn drive(shared: Arc<Shared>, injector: Arc<dyn ScriptInjector>, backoff: Backoff) {
    loop {
        if shared.is_closed() {
            return;
        }
        let attempt = shared.state.borrow().attempts() + 1;
        tracing::debug!(attempt, "injecting ad script");

        let outcome = injector.inject(attempt).await;
        if let Err(error) = &outcome {
            tracing::warn!(attempt, %error, "ad script attempt failed");
        }

        match shared.complete(&outcome) {
            Completion::Loaded => {
                tracing::info!(attempt, "ad script loaded");
                return;
            }
            Completion::Exhausted => {
                tracing::warn!(attempts = attempt, "ad script retries exhausted");
                return;
            }
            Completion::Ignored => return,
            Completion::RetryAllowed { failures } => {
                let delay = backoff.delay(failures);
                tracing::debug!(
                    failures,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "scheduling ad script retry"
                );
                tokio::time::sleep(delay).await;
                if !shared.transition(LoaderState::retry) {
                    return;
                }
            }
        }
    }
}
