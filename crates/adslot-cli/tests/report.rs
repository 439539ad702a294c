//! Integration tests for CLI output and simulated loader runs.

use std::time::Duration;

use adslot_cli::report::{flags_json, formats_table, transitions_table};
use adslot_cli::run::{settle, simulate};
use adslot_core::{
    Backoff, LoaderFlags, LoaderPhase, LoaderSettings, ScriptLoader, ScriptedInjector,
};

fn backoff() -> Backoff {
    Backoff::new(Duration::from_millis(100), Duration::from_secs(10))
}

#[test]
fn test_formats_table_lists_catalog() {
    let rendered = formats_table().to_string();
    for key in [
        "rectangle",
        "leaderboard",
        "skyscraper",
        "large_mobile",
        "mobile_banner",
        "billboard",
    ] {
        assert!(rendered.contains(key), "missing {key}");
    }
    assert!(rendered.contains("Medium Rectangle"));
    assert!(rendered.contains("970"));
}

#[test]
fn test_flags_json_uses_page_names() {
    let flags = LoaderFlags {
        loaded: true,
        loading: false,
        retries: 1,
        max_retries: 3,
    };
    insta::assert_snapshot!(flags_json(&flags).unwrap(), @r#"
    {
      "adsenseLoaded": true,
      "adsenseLoading": false,
      "adsenseRetries": 1,
      "MAX_ADSENSE_RETRIES": 3
    }
    "#);
}

#[tokio::test(start_paused = true)]
async fn test_simulate_recovers_after_failures() {
    let simulation = simulate(2, 3, backoff()).await.unwrap();

    let phases: Vec<_> = simulation
        .transitions
        .iter()
        .map(|step| step.transition.to)
        .collect();
    assert_eq!(
        phases,
        vec![
            LoaderPhase::Loading,
            LoaderPhase::Failed,
            LoaderPhase::Loading,
            LoaderPhase::Failed,
            LoaderPhase::Loading,
            LoaderPhase::Loaded,
        ]
    );
    assert_eq!(simulation.injections, 3);
    assert!(simulation.flags.loaded);
    assert_eq!(simulation.flags.retries, 2);
    assert!(!simulation.exhausted());

    // 100ms then 200ms of backoff.
    let last = simulation.transitions.last().unwrap();
    assert!(last.at >= Duration::from_millis(300));

    let table = transitions_table(&simulation).to_string();
    assert!(table.contains("loaded"));
}

#[tokio::test(start_paused = true)]
async fn test_simulate_exhausts() {
    let simulation = simulate(5, 2, backoff()).await.unwrap();

    assert!(simulation.exhausted());
    assert_eq!(simulation.injections, 2);
    assert!(!simulation.flags.loaded);
    assert!(!simulation.flags.loading);
    assert_eq!(simulation.flags.retries, 2);
    assert_eq!(simulation.flags.max_retries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_settle_waits_for_outcome() {
    let settings = LoaderSettings {
        ad_client: String::new(),
        max_attempts: 3,
        backoff: backoff(),
    };
    let loader = ScriptLoader::new(settings, ScriptedInjector::failing_then_loading(1)).unwrap();
    loader.ensure_loaded();

    let state = settle(&loader).await.unwrap();
    assert!(state.is_ready());
    assert_eq!(state.attempts(), 1);
}
