//! Wires the adapter stack together: tab registry, engine selector,
//! collaborator hooks, and the chrome scroll controller.

use std::sync::Arc;

use dashmap::DashMap;
use engine_bridge::EngineFactory;
use engine_select::{EngineSelector, Tab, VariantCatalog};
use nav_center::{Hooks, NavStarted};
use scroll_chrome::{ChromeSignal, ScrollChromeController, ScrollSample};
use tabshell_core_types::{EngineVariant, TabId};
use tabshell_event_bus::SignalBus;
use tokio::sync::broadcast;
use tracing::info;
use url::Url;

use crate::config::ShellConfig;
use crate::errors::ShellError;

pub struct Shell {
    config: ShellConfig,
    selector: EngineSelector,
    tabs: DashMap<TabId, Arc<Tab>>,
    nav_started: Arc<SignalBus<NavStarted>>,
    chrome_signals: Arc<SignalBus<ChromeSignal>>,
    scroll: ScrollChromeController,
}

impl Shell {
    pub fn new(
        config: ShellConfig,
        factory: Arc<dyn EngineFactory>,
        hooks: Hooks,
    ) -> Result<Self, ShellError> {
        // Fail early on an unparseable home location.
        let _ = config.home()?;

        let nav_started = SignalBus::new(config.signal_capacity);
        let chrome_signals = SignalBus::new(config.signal_capacity);
        let selector = EngineSelector::new(
            factory,
            VariantCatalog::default(),
            hooks,
            nav_started.clone(),
        )
        .with_watchdog_timeout(config.watchdog_timeout());
        let scroll =
            ScrollChromeController::new(config.scroll_threshold, chrome_signals.clone());

        Ok(Self {
            config,
            selector,
            tabs: DashMap::new(),
            nav_started,
            chrome_signals,
            scroll,
        })
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    // ── tabs ──

    /// Open a tab on the configured default variant, loading home if set.
    pub fn open_tab(&self) -> Result<Arc<Tab>, ShellError> {
        let home = self.config.home()?;
        Ok(self.open_tab_with(self.config.default_variant, home))
    }

    pub fn open_tab_with(&self, variant: EngineVariant, initial: Option<Url>) -> Arc<Tab> {
        let tab = Arc::new(self.selector.open_tab(variant, initial));
        self.tabs.insert(tab.id(), tab.clone());
        info!(target: "tabshell", tab = %tab.id(), count = self.tabs.len(), "tab registered");
        tab
    }

    pub fn close_tab(&self, id: TabId) -> Result<(), ShellError> {
        let (_, tab) = self.tabs.remove(&id).ok_or(ShellError::TabNotFound(id))?;
        self.selector.close_tab(&tab);
        Ok(())
    }

    pub fn navigate(&self, id: TabId, url: Url) -> Result<(), ShellError> {
        let tab = self.tab(id)?;
        tab.nav().navigate(url);
        Ok(())
    }

    pub fn switch_engine(&self, id: TabId, to: EngineVariant) -> Result<(), ShellError> {
        let tab = self.tab(id)?;
        self.selector.switch_engine(&tab, to);
        Ok(())
    }

    pub fn tab(&self, id: TabId) -> Result<Arc<Tab>, ShellError> {
        self.tabs
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(ShellError::TabNotFound(id))
    }

    pub fn tabs(&self) -> Vec<Arc<Tab>> {
        self.tabs.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    // ── signals ──

    pub fn nav_started_signals(&self) -> broadcast::Receiver<NavStarted> {
        self.nav_started.subscribe()
    }

    pub fn chrome_signals(&self) -> broadcast::Receiver<ChromeSignal> {
        self.chrome_signals.subscribe()
    }

    // ── scroll side channel ──

    pub fn on_scroll_sample(&self, sample: ScrollSample) -> Option<ChromeSignal> {
        self.scroll.on_sample(sample)
    }

    pub fn set_chrome_input_focused(&self, focused: bool) {
        self.scroll.set_input_focused(focused);
    }

    /// Forget the scroll baseline, e.g. when the active document changes.
    pub fn reset_scroll_baseline(&self) {
        self.scroll.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_bridge::StubEngineFactory;

    fn shell() -> (Shell, Arc<StubEngineFactory>) {
        let factory = StubEngineFactory::new();
        let shell = Shell::new(
            ShellConfig {
                home_url: None,
                ..ShellConfig::default()
            },
            factory.clone(),
            Hooks::disabled(),
        )
        .unwrap();
        (shell, factory)
    }

    #[tokio::test]
    async fn tabs_register_and_close() {
        let (shell, _factory) = shell();
        let tab = shell.open_tab().unwrap();
        assert_eq!(shell.tab_count(), 1);

        shell.close_tab(tab.id()).unwrap();
        assert_eq!(shell.tab_count(), 0);
        assert!(matches!(
            shell.close_tab(tab.id()),
            Err(ShellError::TabNotFound(_))
        ));
    }

    #[tokio::test]
    async fn scroll_samples_flow_through_the_shell() {
        let (shell, _factory) = shell();
        let mut signals = shell.chrome_signals();

        shell.on_scroll_sample(ScrollSample::now(0.0));
        let emitted = shell.on_scroll_sample(ScrollSample::now(500.0));
        assert_eq!(emitted, Some(ChromeSignal::Hide));
        assert_eq!(signals.recv().await.unwrap(), ChromeSignal::Hide);
    }
}
