//! End-to-end shell flow (open, navigate, hot-swap, close) against the
//! stub engine, with real hooks observing the side effects.

use std::sync::Arc;
use std::time::Duration;

use nav_center::{
    AllowAllPolicy, Hooks, InMemorySnapshotLog, InMemoryVisitLog, StaticHomeResolver,
};
use tabshell::{EngineVariant, NavigationState, Shell, ShellConfig, StubEngineFactory};
use tokio::sync::watch;
use url::Url;

async fn wait_for<F>(feed: &mut watch::Receiver<NavigationState>, pred: F) -> NavigationState
where
    F: Fn(&NavigationState) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            {
                let current = feed.borrow().clone();
                if pred(&current) {
                    return current;
                }
            }
            feed.changed().await.expect("state feed closed");
        }
    })
    .await
    .expect("condition not reached in time")
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

#[tokio::test]
async fn full_tab_lifecycle_with_engine_swap() {
    let factory = StubEngineFactory::new();
    let visits = InMemoryVisitLog::new();
    let snapshots = InMemorySnapshotLog::new();
    let home: Url = "https://start.example/".parse().unwrap();
    let hooks = Hooks {
        home: Arc::new(StaticHomeResolver::new(home)),
        policy: Arc::new(AllowAllPolicy),
        visits: visits.clone(),
        snapshots: snapshots.clone(),
    };
    let config = ShellConfig {
        home_url: Some("https://start.example/".into()),
        default_variant: EngineVariant::Standard,
        ..ShellConfig::default()
    };
    let shell = Shell::new(config, factory.clone(), hooks).unwrap();

    let tab = shell.open_tab_with(EngineVariant::Standard, None);
    let mut feed = tab.nav().watch();
    let target: Url = "https://example.com/".parse().unwrap();

    shell.navigate(tab.id(), target.clone()).unwrap();
    let engine = factory.last_created().unwrap();
    {
        let engine = engine.clone();
        let target = target.clone();
        wait_until(move || engine.last_requested_load() == Some(target.clone())).await;
    }

    engine.complete_load(target.clone(), "Example Domain");
    let state = wait_for(&mut feed, |s| !s.is_loading && s.progress == 1.0).await;
    assert_eq!(state.url, Some(target.clone()));
    assert!(state.display_url_in_chrome);
    assert_eq!(visits.len(), 1);
    assert_eq!(snapshots.captures(), vec![tab.id()]);

    // Hot-swap: identity preserved, load re-issued on the new instance.
    let id_before = tab.id();
    shell.switch_engine(tab.id(), EngineVariant::Desktop).unwrap();
    assert_eq!(tab.id(), id_before);
    let replacement = factory.last_created().unwrap();
    {
        let replacement = replacement.clone();
        let target = target.clone();
        wait_until(move || replacement.last_requested_load() == Some(target.clone())).await;
    }
    assert_eq!(engine.live_registrations(), 0);

    replacement.complete_load(target.clone(), "Example Domain");
    let state = wait_for(&mut feed, |s| !s.is_loading && s.progress == 1.0).await;
    assert_eq!(state.url, Some(target));
    assert_eq!(visits.len(), 2);

    shell.close_tab(tab.id()).unwrap();
    assert_eq!(shell.tab_count(), 0);
    assert_eq!(replacement.live_registrations(), 0);
}

#[tokio::test]
async fn home_navigation_suppresses_url_display() {
    let factory = StubEngineFactory::new();
    let home: Url = "https://start.example/".parse().unwrap();
    let hooks = Hooks {
        home: Arc::new(StaticHomeResolver::new(home.clone())),
        ..Hooks::disabled()
    };
    let config = ShellConfig {
        home_url: Some(home.to_string()),
        ..ShellConfig::default()
    };
    let shell = Shell::new(config, factory.clone(), hooks).unwrap();

    let tab = shell.open_tab().unwrap();
    let mut feed = tab.nav().watch();
    let engine = factory.last_created().unwrap();
    {
        let engine = engine.clone();
        let home = home.clone();
        wait_until(move || engine.last_requested_load() == Some(home.clone())).await;
    }

    engine.complete_load(home.clone(), "Start");
    let state = wait_for(&mut feed, |s| !s.is_loading && s.progress == 1.0).await;
    assert_eq!(state.url, Some(home));
    assert!(!state.display_url_in_chrome);
}
