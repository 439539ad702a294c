//! Loader state machine.
//!
//! ```text
//! Idle ──begin──▶ Loading ──ok──▶ Loaded
//!                   ▲   │
//!             retry │   │ err
//!                   │   ▼
//!                  Failed ──(attempts == max)──▶ terminal
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::Result;

/// Phase of the shared script load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderPhase {
    /// No load requested yet.
    Idle,
    /// An injection attempt is in flight.
    Loading,
    /// The script loaded. Terminal.
    Loaded,
    /// The last attempt failed; a retry may be pending.
    Failed,
}

impl LoaderPhase {
    /// Get a human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LoaderPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of feeding a completion signal into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Moved to `Loaded`.
    Loaded,
    /// Moved to `Failed`; a retry is allowed after `failures` failures.
    RetryAllowed {
        /// Failures recorded so far.
        failures: u32,
    },
    /// Moved to `Failed` with no retries left.
    Exhausted,
    /// Signal arrived outside `Loading` and was dropped.
    Ignored,
}

/// Snapshot of the shared loader state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoaderState {
    phase: LoaderPhase,
    attempts: u32,
    max_attempts: u32,
}

impl LoaderState {
    /// Fresh state. `max_attempts` is raised to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            phase: LoaderPhase::Idle,
            attempts: 0,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> LoaderPhase {
        self.phase
    }

    /// Failed attempts recorded so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempt cap.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The script is loaded and slots may show live content.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.phase == LoaderPhase::Loaded
    }

    /// Loading failed and no retries remain.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.phase == LoaderPhase::Failed && self.attempts >= self.max_attempts
    }

    /// Neither ready nor exhausted.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.is_ready() && !self.is_exhausted()
    }

    /// `Idle -> Loading`. Returns whether injection should start.
    pub fn begin(&mut self) -> bool {
        if self.phase != LoaderPhase::Idle {
            return false;
        }
        self.phase = LoaderPhase::Loading;
        true
    }

    /// `Failed -> Loading` while retries remain. Returns whether to re-inject.
    pub fn retry(&mut self) -> bool {
        if self.phase != LoaderPhase::Failed || self.attempts >= self.max_attempts {
            return false;
        }
        self.phase = LoaderPhase::Loading;
        true
    }

    /// Apply an injection outcome.
    pub fn complete(&mut self, outcome: &Result<()>) -> Completion {
        if self.phase != LoaderPhase::Loading {
            return Completion::Ignored;
        }
        match outcome {
            Ok(()) => {
                self.phase = LoaderPhase::Loaded;
                Completion::Loaded
            }
            Err(_) => {
                self.attempts = self.attempts.saturating_add(1).min(self.max_attempts);
                self.phase = LoaderPhase::Failed;
                if self.attempts < self.max_attempts {
                    Completion::RetryAllowed {
                        failures: self.attempts,
                    }
                } else {
                    Completion::Exhausted
                }
            }
        }
    }

    /// Diagnostic flag view.
    #[must_use]
    pub fn flags(&self) -> LoaderFlags {
        LoaderFlags {
            loaded: self.phase == LoaderPhase::Loaded,
            loading: self.phase == LoaderPhase::Loading,
            retries: self.attempts,
            max_retries: self.max_attempts,
        }
    }
}

/// Flat flag view of [`LoaderState`] for outside diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoaderFlags {
    /// Script loaded.
    #[serde(rename = "adsenseLoaded")]
    pub loaded: bool,
    /// Attempt in flight.
    #[serde(rename = "adsenseLoading")]
    pub loading: bool,
    /// Failed attempts so far.
    #[serde(rename = "adsenseRetries")]
    pub retries: u32,
    /// Attempt cap.
    #[serde(rename = "MAX_ADSENSE_RETRIES")]
    pub max_retries: u32,
}

/// One phase change, as broadcast to observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoaderTransition {
    /// Phase before.
    pub from: LoaderPhase,
    /// Phase after.
    pub to: LoaderPhase,
    /// Failed attempts after the change.
    pub attempts: u32,
}
