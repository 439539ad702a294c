//! Loader runs driven by the CLI.

use std::sync::Arc;
use std::time::Duration;

use adslot_core::{
    Backoff, LoaderFlags, LoaderPhase, LoaderSettings, LoaderState, LoaderTransition,
    ScriptLoader, ScriptedInjector,
};
use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::Instant;

/// Wait until the loader has loaded or given up.
pub async fn settle(loader: &ScriptLoader) -> Result<LoaderState> {
    let mut updates = loader.subscribe();
    let state = updates
        .wait_for(|state| state.is_ready() || state.is_exhausted())
        .await
        .context("script loader stopped before settling")?;
    Ok(*state)
}

/// One observed phase change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedTransition {
    /// Time since the load was requested.
    pub at: Duration,
    /// The change itself.
    pub transition: LoaderTransition,
}

/// Outcome of [`simulate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    /// Every phase change in order.
    pub transitions: Vec<TimedTransition>,
    /// Final flag view.
    pub flags: LoaderFlags,
    /// Injection attempts made.
    pub injections: u32,
}

impl Simulation {
    /// The loader ended exhausted.
    pub fn exhausted(&self) -> bool {
        !self.flags.loaded && self.flags.retries >= self.flags.max_retries
    }
}

/// Run a loader whose first `failures` attempts fail.
pub async fn simulate(failures: u32, max_attempts: u32, backoff: Backoff) -> Result<Simulation> {
    let injector = Arc::new(ScriptedInjector::failing_then_loading(failures));
    let settings = LoaderSettings {
        ad_client: String::new(),
        max_attempts,
        backoff,
    };
    let loader = ScriptLoader::new(settings, Arc::clone(&injector))?;
    let max_attempts = loader.state().max_attempts();
    let mut rx = loader.transitions();

    let started = Instant::now();
    loader.ensure_loaded();

    let mut transitions = Vec::new();
    loop {
        let transition = match rx.recv().await {
            Ok(transition) => transition,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "transition log lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        transitions.push(TimedTransition {
            at: started.elapsed(),
            transition,
        });
        let terminal = transition.to == LoaderPhase::Loaded
            || (transition.to == LoaderPhase::Failed && transition.attempts >= max_attempts);
        if terminal {
            break;
        }
    }

    Ok(Simulation {
        transitions,
        flags: loader.flags(),
        injections: injector.injections(),
    })
}
