//! The logical tab entity: identity that survives engine hot-swaps.

use std::sync::Arc;

use engine_bridge::{EngineSlot, ObservationBridge};
use nav_center::{NavHandle, NavigationState};
use parking_lot::Mutex;
use tabshell_core_types::{EngineVariant, TabId};
use tokio::task::JoinHandle;

/// One logical tab. The id, navigation state, and runtime stay fixed for
/// the tab's whole life; the engine instance and its observation wiring are
/// the only parts replaced on a variant switch.
pub struct Tab {
    id: TabId,
    variant: Mutex<EngineVariant>,
    nav: NavHandle,
    bridge: Arc<ObservationBridge>,
    engine: EngineSlot,
    #[allow(dead_code)]
    runtime: JoinHandle<()>,
}

impl Tab {
    pub(crate) fn new(
        id: TabId,
        variant: EngineVariant,
        nav: NavHandle,
        bridge: Arc<ObservationBridge>,
        engine: EngineSlot,
        runtime: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            variant: Mutex::new(variant),
            nav,
            bridge,
            engine,
            runtime,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn variant(&self) -> EngineVariant {
        *self.variant.lock()
    }

    pub(crate) fn set_variant(&self, variant: EngineVariant) {
        *self.variant.lock() = variant;
    }

    pub fn nav(&self) -> &NavHandle {
        &self.nav
    }

    pub(crate) fn bridge(&self) -> &Arc<ObservationBridge> {
        &self.bridge
    }

    pub(crate) fn engine(&self) -> &EngineSlot {
        &self.engine
    }

    pub fn latest_state(&self) -> NavigationState {
        self.nav.latest()
    }

    /// True while a live engine instance backs this tab.
    pub fn has_engine(&self) -> bool {
        self.engine.current().is_some()
    }
}
