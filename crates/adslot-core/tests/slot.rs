//! Integration tests for slot rendering against the shared loader.

use std::sync::Arc;
use std::time::Duration;

use adslot_core::{
    AdFormatKind, AdSlot, AdSlotRequest, Backoff, Environment, EnvironmentDetector, LoaderPhase,
    LoaderSettings, PlaceholderReason, ScriptLoader, ScriptedInjector, SlotView, Viewport,
};

fn settings() -> LoaderSettings {
    LoaderSettings {
        ad_client: "ca-pub-7".to_string(),
        max_attempts: 2,
        backoff: Backoff::new(Duration::from_millis(50), Duration::from_millis(50)),
    }
}

fn sidebar() -> AdSlotRequest {
    AdSlotRequest::new("5550001", AdFormatKind::Leaderboard)
        .with_mobile_format(AdFormatKind::MobileBanner)
        .with_label("Sponsored")
}

#[tokio::test(start_paused = true)]
async fn test_development_never_touches_loader() {
    let injector = Arc::new(ScriptedInjector::new([true]));
    let loader = ScriptLoader::new(settings(), Arc::clone(&injector)).unwrap();
    let environment = EnvironmentDetector::default().detect("localhost");
    assert_eq!(environment, Environment::Development);

    let mut slots: Vec<_> = AdFormatKind::ALL
        .into_iter()
        .map(|kind| AdSlot::new(AdSlotRequest::new("1", kind)))
        .collect();
    for slot in &mut slots {
        for width in [320, 1440] {
            let view = slot.render(environment, Viewport::new(width), &loader);
            assert_eq!(
                view.placeholder_reason(),
                Some(PlaceholderReason::Development)
            );
        }
    }

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(loader.phase(), LoaderPhase::Idle);
    assert_eq!(injector.injections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_development_placeholder_even_when_loaded() {
    let loader = ScriptLoader::new(settings(), ScriptedInjector::new([true])).unwrap();
    loader.ensure_loaded();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(loader.is_ready());

    let mut slot = AdSlot::new(sidebar());
    let view = slot.render(Environment::Development, Viewport::new(1280), &loader);
    assert!(!view.is_live());
}

#[tokio::test(start_paused = true)]
async fn test_production_goes_live_after_load() {
    let injector =
        Arc::new(ScriptedInjector::new([true]).with_latency(Duration::from_millis(200)));
    let loader = ScriptLoader::new(settings(), Arc::clone(&injector)).unwrap();
    let mut slot = AdSlot::new(sidebar());
    let viewport = Viewport::new(1280);

    let view = slot.render(Environment::Production, viewport, &loader);
    assert_eq!(view.placeholder_reason(), Some(PlaceholderReason::Loading));
    match &view {
        SlotView::Placeholder(p) => assert_eq!((p.width(), p.height()), (728, 90)),
        SlotView::Live(_) => panic!("expected placeholder while loading"),
    }

    assert!(slot.changed().await);
    while !loader.is_ready() {
        assert!(slot.changed().await);
    }

    let view = slot.render(Environment::Production, viewport, &loader);
    let SlotView::Live(live) = view else {
        panic!("expected live container");
    };
    assert_eq!(live.slot_id, "5550001");
    assert_eq!(live.ad_client, "ca-pub-7");
    assert_eq!((live.dimensions.width, live.dimensions.height), (728, 90));
    assert_eq!(injector.injections(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_mobile_viewport_uses_mobile_format() {
    let loader = ScriptLoader::new(settings(), ScriptedInjector::new([true])).unwrap();
    let mut slot = AdSlot::new(sidebar());
    slot.render(Environment::Production, Viewport::new(390), &loader);
    tokio::time::sleep(Duration::from_millis(10)).await;

    let SlotView::Live(live) = slot.render(Environment::Production, Viewport::new(390), &loader)
    else {
        panic!("expected live container");
    };
    assert_eq!((live.dimensions.width, live.dimensions.height), (320, 50));
    assert!(live.to_string().contains("width:320px;height:50px"));
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_loader_renders_placeholder() {
    let loader = ScriptLoader::new(settings(), ScriptedInjector::new([false, false])).unwrap();
    let mut slot = AdSlot::new(sidebar());
    slot.render(Environment::Production, Viewport::new(1280), &loader);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(loader.is_exhausted());
    let view = slot.render(Environment::Production, Viewport::new(1280), &loader);
    assert_eq!(view.placeholder_reason(), Some(PlaceholderReason::Exhausted));
    assert!(!view.to_html().contains("error"));
}

#[tokio::test(start_paused = true)]
async fn test_many_slots_share_one_injection() {
    let injector = Arc::new(ScriptedInjector::new([true]));
    let loader = ScriptLoader::new(settings(), Arc::clone(&injector)).unwrap();
    let mut slots: Vec<_> = (0..8)
        .map(|i| AdSlot::new(AdSlotRequest::new(format!("slot-{i}"), AdFormatKind::Rectangle)))
        .collect();

    for slot in &mut slots {
        slot.render(Environment::Production, Viewport::new(1024), &loader);
    }
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(injector.injections(), 1);
    for slot in &mut slots {
        assert!(slot.render(Environment::Production, Viewport::new(1024), &loader).is_live());
    }
}

#[tokio::test(start_paused = true)]
async fn test_creative_failure_is_slot_local() {
    let loader = ScriptLoader::new(settings(), ScriptedInjector::new([true])).unwrap();
    let mut broken = AdSlot::new(AdSlotRequest::new("a", AdFormatKind::Rectangle));
    let mut healthy = AdSlot::new(AdSlotRequest::new("b", AdFormatKind::Rectangle));

    broken.render(Environment::Production, Viewport::new(1024), &loader);
    tokio::time::sleep(Duration::from_millis(10)).await;
    let before = loader.state();

    broken.mark_creative_failed();
    assert!(broken.creative_error().is_some());
    assert!(healthy.creative_error().is_none());

    let view = broken.render(Environment::Production, Viewport::new(1024), &loader);
    assert_eq!(
        view.placeholder_reason(),
        Some(PlaceholderReason::CreativeFailed)
    );
    assert!(healthy.render(Environment::Production, Viewport::new(1024), &loader).is_live());
    assert_eq!(loader.state(), before);
}

#[tokio::test]
async fn test_unsubscribed_slot_has_no_updates() {
    let mut slot = AdSlot::new(sidebar());
    assert!(!slot.changed().await);
}
