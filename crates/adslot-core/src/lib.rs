//! Ad slot loading and fallback orchestration.
//!
//! This crate decides what each ad placement on a page shows: a live ad
//! container sized for the viewport, or a neutral placeholder block.
//!
//! # Overview
//!
//! - [`environment`] - classifies the host as development or production
//! - [`format`] - the fixed format catalog and dimension resolution
//! - [`loader`] - the shared script loader and its retry state machine
//! - [`slot`] - per-placement rendering
//! - [`placeholder`] - the fallback block
//! - [`config`] - TOML-backed settings
//!
//! # Failure policy
//!
//! Nothing here blocks or breaks page rendering. Script failures are
//! retried with capped backoff and then absorbed; slots show placeholders.
//! The only hard error is an unknown format key, which is a configuration
//! bug and should be caught before deployment.
//!
//! # Example
//!
//! ```no_run
//! use adslot_core::{
//!     AdFormatKind, AdSlot, AdSlotRequest, AdsConfig, EnvironmentDetector,
//!     HttpScriptInjector, LoaderSettings, ScriptLoader, Viewport,
//! };
//!
//! async fn render_sidebar(host: &str, width: u32) -> adslot_core::Result<String> {
//!     let config = AdsConfig::load();
//!     let environment = EnvironmentDetector::new(&config.environment).detect(host);
//!     let loader = ScriptLoader::new(
//!         LoaderSettings::from(&config.script),
//!         HttpScriptInjector::new(&config.script)?,
//!     )?;
//!
//!     let request = AdSlotRequest::new("1234567890", AdFormatKind::Skyscraper)
//!         .with_mobile_format(AdFormatKind::MobileBanner);
//!     let mut slot = AdSlot::new(request);
//!     let viewport = Viewport::new(width).with_breakpoint(config.viewport.mobile_breakpoint);
//!
//!     let mut view = slot.render(environment, viewport, &loader);
//!     while !loader.state().is_ready() && !loader.state().is_exhausted() && slot.changed().await {
//!         view = slot.render(environment, viewport, &loader);
//!     }
//!     Ok(view.to_html())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analytics;
pub mod config;
pub mod environment;
pub mod error;
pub mod format;
pub mod loader;
pub mod placeholder;
pub mod slot;

pub use analytics::{AnalyticsSink, TracingAnalytics, track_page_view};
pub use config::{AdsConfig, EnvironmentConfig, MAX_ADSENSE_RETRIES, ScriptConfig, ViewportConfig};
pub use environment::{Environment, EnvironmentDetector};
pub use error::{AdsError, Result};
pub use format::{
    AD_FORMATS, AdFormat, AdFormatKind, ResolvedDimensions, Viewport, resolve, resolve_kind,
};
pub use loader::{
    Backoff, HttpScriptInjector, LoaderFlags, LoaderPhase, LoaderSettings, LoaderState,
    LoaderTransition, ScriptInjector, ScriptLoader, ScriptedInjector,
};
pub use placeholder::{Placeholder, PlaceholderIcon, PlaceholderReason};
pub use slot::{AdSlot, AdSlotRequest, LiveSlot, SlotView};
