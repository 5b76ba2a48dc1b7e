//! Owns which engine configuration backs each tab, and the swap between
//! them.

use std::sync::Arc;
use std::time::Duration;

use engine_bridge::{EngineFactory, EngineInstance, EngineSlot, ObservationBridge};
use nav_center::{Hooks, JournalKind, NavDeps, NavStarted};
use tabshell_core_types::{EngineVariant, TabId};
use tabshell_event_bus::SignalBus;
use tracing::{info, warn};
use url::Url;

use crate::tab::Tab;
use crate::variant::VariantCatalog;

pub struct EngineSelector {
    factory: Arc<dyn EngineFactory>,
    catalog: VariantCatalog,
    hooks: Hooks,
    nav_started: Arc<SignalBus<NavStarted>>,
    watchdog_timeout: Duration,
}

impl EngineSelector {
    pub fn new(
        factory: Arc<dyn EngineFactory>,
        catalog: VariantCatalog,
        hooks: Hooks,
        nav_started: Arc<SignalBus<NavStarted>>,
    ) -> Self {
        Self {
            factory,
            catalog,
            hooks,
            nav_started,
            watchdog_timeout: Duration::from_secs(15),
        }
    }

    pub fn with_watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }

    /// Create a tab on `variant`, optionally issuing an initial load.
    pub fn open_tab(&self, variant: EngineVariant, initial: Option<Url>) -> Tab {
        let id = TabId::new();
        let engine_slot = EngineSlot::new();
        let deps = NavDeps::new(
            self.hooks.clone(),
            engine_slot.clone(),
            self.nav_started.clone(),
        )
        .with_watchdog_timeout(self.watchdog_timeout);
        let (nav, bridge_tx, runtime) = nav_center::spawn(id, deps);
        let bridge = Arc::new(ObservationBridge::new(bridge_tx));

        let engine = self.build_engine(variant, initial.as_ref());
        engine_slot.set(engine.clone());
        bridge.attach(&engine);

        info!(target: "engine-select", tab = %id, %variant, "tab opened");
        let tab = Tab::new(id, variant, nav, bridge, engine_slot, runtime);
        if let Some(url) = initial {
            tab.nav().navigate(url);
        }
        tab
    }

    /// Swap `tab` onto `to`, preserving tab identity.
    ///
    /// Ordering matters: the in-flight attempt is cancelled through the
    /// adapter queue first, then the bridge detaches (making any residual
    /// events from the outgoing instance no-ops), and only then is the
    /// instance discarded and replaced. The re-issued load goes through the
    /// same queue, behind the cancellation.
    pub fn switch_engine(&self, tab: &Tab, to: EngineVariant) {
        if tab.variant() == to {
            return;
        }
        let current = tab.latest_state().url;

        tab.nav().cancel_attempt();
        tab.bridge().detach();
        tab.engine().clear();

        let engine = self.build_engine(to, current.as_ref());
        tab.engine().set(engine.clone());
        tab.bridge().attach(&engine);
        tab.set_variant(to);

        tab.nav()
            .journal()
            .record(JournalKind::EngineSwapped, to.as_str());
        info!(target: "engine-select", tab = %tab.id(), variant = %to, "engine swapped");

        if let Some(url) = current {
            tab.nav().navigate(url);
        }
    }

    /// Tear the tab down: cancel, detach, discard, stop the runtime.
    pub fn close_tab(&self, tab: &Tab) {
        tab.nav().cancel_attempt();
        tab.bridge().detach();
        tab.engine().clear();
        tab.nav().shutdown();
        info!(target: "engine-select", tab = %tab.id(), "tab closed");
    }

    /// Construct and prepare an instance for `variant`. Content-blocking
    /// rules are applied once per instance; scripting permission is queried
    /// for the location the instance is about to host.
    fn build_engine(
        &self,
        variant: EngineVariant,
        destination: Option<&Url>,
    ) -> Arc<dyn EngineInstance> {
        let profile = self.catalog.profile(variant);
        let engine = self.factory.create(&profile.user_agent, &profile.shims);

        if let Err(err) = self.hooks.policy.apply_rules(engine.as_ref()) {
            warn!(target: "engine-select", %variant, %err, "content rules not applied");
        }
        if let Some(url) = destination {
            let origin = url.origin().ascii_serialization();
            let blocked = self.hooks.policy.is_scripting_blocked(&origin);
            engine.set_scripting_enabled(!blocked);
        }
        engine
    }
}
