use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use adslot_cli::report::{flags_json, formats_table, transitions_table};
use adslot_cli::run::{settle, simulate};
use adslot_core::{
    AdSlot, AdSlotRequest, AdsConfig, Backoff, EnvironmentDetector, HttpScriptInjector,
    LoaderSettings, ScriptLoader, Viewport, resolve,
};

use crate::cli::{RenderArgs, ResolveArgs, SimulateArgs};

/// Load settings from `--config` or the default location.
pub fn load_config(path: Option<&Path>) -> Result<AdsConfig> {
    match path {
        Some(path) => AdsConfig::load_from(path)
            .with_context(|| format!("load config from {}", path.display())),
        None => Ok(AdsConfig::load()),
    }
}

pub fn run_formats() {
    println!("{}", formats_table());
}

pub fn run_resolve(args: &ResolveArgs, config: &AdsConfig) -> Result<()> {
    let is_mobile = args.viewport_width.is_some_and(|width| {
        Viewport::new(width)
            .with_breakpoint(config.viewport.mobile_breakpoint)
            .is_narrow()
    });
    let dimensions = resolve(&args.format, args.mobile_format.as_deref(), is_mobile)?;
    println!("{dimensions}");
    Ok(())
}

pub async fn run_render(args: &RenderArgs, config: &AdsConfig) -> Result<()> {
    let request = AdSlotRequest::parse(
        args.slot_id.as_str(),
        &args.format,
        args.mobile_format.as_deref(),
    )?;
    let request = match &args.label {
        Some(label) => request.with_label(label.as_str()),
        None => request,
    };
    let environment = EnvironmentDetector::new(&config.environment).detect(&args.host);
    let viewport =
        Viewport::new(args.viewport_width).with_breakpoint(config.viewport.mobile_breakpoint);
    debug!(
        slot_id = %args.slot_id,
        host = %args.host,
        %environment,
        width = args.viewport_width,
        "rendering slot"
    );

    let loader = ScriptLoader::new(
        LoaderSettings::from(&config.script),
        HttpScriptInjector::new(&config.script)?,
    )?;
    let mut slot = AdSlot::new(request);
    slot.render(environment, viewport, &loader);

    if environment.is_production() {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(args.wait_secs);
        while !loader.is_ready() && !loader.is_exhausted() {
            match tokio::time::timeout_at(deadline, slot.changed()).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(_) => {
                    warn!(wait_secs = args.wait_secs, "gave up waiting for ad script");
                    break;
                }
            }
        }
        loader.shutdown();
    }

    let view = slot.render(environment, viewport, &loader);
    println!("{view}");
    Ok(())
}

/// Returns whether the simulated loader ended exhausted.
pub async fn run_simulate(args: &SimulateArgs, config: &AdsConfig) -> Result<bool> {
    let max_attempts = args.max_attempts.unwrap_or(config.script.max_attempts);
    if max_attempts == 0 {
        bail!("--max-attempts must be at least 1");
    }
    let base = Duration::from_millis(args.retry_base_ms);
    let cap = Duration::from_millis(config.script.retry_max_ms);
    let simulation = simulate(args.failures, max_attempts, Backoff::new(base, cap)).await?;

    println!("{}", transitions_table(&simulation));
    println!("Injections: {}", simulation.injections);
    println!("{}", flags_json(&simulation.flags)?);
    Ok(simulation.exhausted())
}

/// Returns whether the live script could not be loaded.
pub async fn run_probe(config: &AdsConfig) -> Result<bool> {
    let injector = HttpScriptInjector::new(&config.script)?;
    debug!(src = injector.src(), "probing ad script");
    let loader = ScriptLoader::new(LoaderSettings::from(&config.script), injector)?;
    loader.ensure_loaded();
    let state = settle(&loader).await?;

    println!("{}", flags_json(&state.flags())?);
    Ok(state.is_exhausted())
}
