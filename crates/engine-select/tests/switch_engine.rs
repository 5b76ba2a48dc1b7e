//! Hot-swap contract: tab identity survives, the outgoing engine is fully
//! unobserved, and the current location is re-issued on the incoming one.

use std::sync::Arc;
use std::time::Duration;

use engine_bridge::{StubEngineFactory, OBSERVED_PROPERTIES};
use engine_select::{EngineSelector, VariantCatalog};
use nav_center::Hooks;
use tabshell_core_types::EngineVariant;
use tabshell_event_bus::SignalBus;
use url::Url;

fn selector() -> (EngineSelector, Arc<StubEngineFactory>) {
    let factory = StubEngineFactory::new();
    let selector = EngineSelector::new(
        factory.clone(),
        VariantCatalog::default(),
        Hooks::disabled(),
        SignalBus::new(16),
    )
    .with_watchdog_timeout(Duration::from_secs(5));
    (selector, factory)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time")
}

fn example() -> Url {
    "https://example.com/".parse().unwrap()
}

#[tokio::test]
async fn switch_preserves_identity_and_reissues_the_current_location() {
    let (selector, factory) = selector();
    let url = example();

    let tab = selector.open_tab(EngineVariant::Standard, Some(url.clone()));
    let first = factory.last_created().expect("engine built");
    {
        let url = url.clone();
        let first = first.clone();
        wait_until(move || first.last_requested_load() == Some(url.clone())).await;
    }
    // The engine reports the load; the runtime commits it.
    first.complete_load(url.clone(), "Example Domain");
    {
        let tab_nav = tab.nav().clone();
        let url = url.clone();
        wait_until(move || tab_nav.latest().url == Some(url.clone())).await;
    }

    let id_before = tab.id();
    selector.switch_engine(&tab, EngineVariant::Desktop);

    assert_eq!(tab.id(), id_before);
    assert_eq!(tab.variant(), EngineVariant::Desktop);
    assert_eq!(factory.created_count(), 2);

    // Outgoing instance fully unobserved.
    assert_eq!(first.live_registrations(), 0);
    assert!(!first.has_delegate());

    // Incoming instance observed and asked to reload the current location.
    let second = factory.last_created().expect("replacement built");
    assert_eq!(second.live_registrations(), OBSERVED_PROPERTIES.len());
    assert!(second.has_delegate());
    {
        let url = url.clone();
        let second = second.clone();
        wait_until(move || second.last_requested_load() == Some(url.clone())).await;
    }

    // Identity and shims differ between the two variants.
    assert_ne!(first.client_identity(), second.client_identity());
    assert!(first.injected_shims().is_empty());
    assert!(!second.injected_shims().is_empty());
}

#[tokio::test]
async fn switch_mid_navigation_cancels_the_attempt_first() {
    let (selector, factory) = selector();
    let url = example();

    let tab = selector.open_tab(EngineVariant::Standard, None);
    let first = factory.last_created().expect("engine built");

    first.emit_navigation(engine_bridge::NavigationEvent::Started { url });
    {
        let tab_nav = tab.nav().clone();
        wait_until(move || tab_nav.latest().is_loading).await;
    }

    selector.switch_engine(&tab, EngineVariant::Desktop);
    {
        let tab_nav = tab.nav().clone();
        wait_until(move || !tab_nav.latest().is_loading).await;
    }

    // Nothing had committed, so there is no location to re-issue.
    let second = factory.last_created().expect("replacement built");
    assert_eq!(second.requested_loads().len(), 0);
    assert_eq!(tab.latest_state().url, None);
}

#[tokio::test]
async fn switching_to_the_current_variant_is_a_no_op() {
    let (selector, factory) = selector();
    let tab = selector.open_tab(EngineVariant::Standard, None);
    assert_eq!(factory.created_count(), 1);

    selector.switch_engine(&tab, EngineVariant::Standard);
    assert_eq!(factory.created_count(), 1);
    assert_eq!(tab.variant(), EngineVariant::Standard);
}

#[tokio::test]
async fn close_tab_detaches_and_stops_the_runtime() {
    let (selector, factory) = selector();
    let tab = selector.open_tab(EngineVariant::Standard, None);
    let engine = factory.last_created().expect("engine built");

    selector.close_tab(&tab);
    assert_eq!(engine.live_registrations(), 0);
    assert!(!engine.has_delegate());
    assert!(!tab.has_engine());
}

#[tokio::test]
async fn scripting_permission_is_queried_for_the_destination() {
    let factory = StubEngineFactory::new();
    let hooks = Hooks {
        policy: Arc::new(nav_center::OriginDenyPolicy::new(vec![
            "https://example.com".to_string(),
        ])),
        ..Hooks::disabled()
    };
    let selector = EngineSelector::new(
        factory.clone(),
        VariantCatalog::default(),
        hooks,
        SignalBus::new(16),
    );

    let _tab = selector.open_tab(EngineVariant::Standard, Some(example()));
    let engine = factory.last_created().expect("engine built");
    assert!(!engine.scripting_enabled());
}
