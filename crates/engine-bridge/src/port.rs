//! The engine port: the fixed capability surface the adapter wires against.
//!
//! The rendering engine is a black box. It loads documents on its own
//! schedule and reports state through two channels with no ordering guarantee
//! between them: property-change notifications and delegate-style callbacks.
//! Both are modelled here as a fixed set of observer methods, one per event
//! kind, rather than reflection-based observation.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tabshell_core_types::LoadError;
use url::Url;

/// Properties the adapter observes on every live engine instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineProperty {
    Loading,
    Progress,
    Title,
    CanGoBack,
    CanGoForward,
}

/// The full property set registered by the bridge on attach.
pub const OBSERVED_PROPERTIES: [EngineProperty; 5] = [
    EngineProperty::Loading,
    EngineProperty::Progress,
    EngineProperty::Title,
    EngineProperty::CanGoBack,
    EngineProperty::CanGoForward,
];

/// A single property-change notification.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyChange {
    Loading(bool),
    Progress(f64),
    Title(String),
    CanGoBack(bool),
    CanGoForward(bool),
}

impl PropertyChange {
    pub fn property(&self) -> EngineProperty {
        match self {
            PropertyChange::Loading(_) => EngineProperty::Loading,
            PropertyChange::Progress(_) => EngineProperty::Progress,
            PropertyChange::Title(_) => EngineProperty::Title,
            PropertyChange::CanGoBack(_) => EngineProperty::CanGoBack,
            PropertyChange::CanGoForward(_) => EngineProperty::CanGoForward,
        }
    }
}

/// Navigation lifecycle callbacks delivered on the delegate channel.
#[derive(Clone, Debug, PartialEq)]
pub enum NavigationEvent {
    /// A load started (explicit request, link click, or engine redirect).
    Started { url: Url },
    /// The load reached a terminal success state.
    Finished { url: Url },
    /// The load terminated without finishing.
    Failed { url: Option<Url>, error: LoadError },
}

/// Authoring callbacks delivered on the delegate channel.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthoringEvent {
    /// The page asked for a new window; the adapter decides placement.
    PopupRequested { url: Url },
}

/// Opaque handle for one (engine instance, property) observation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RegistrationId(pub u64);

/// Sink implemented by the adapter side of the bridge. The engine invokes
/// these from any of its internal execution contexts; implementations must
/// not assume an ordering between the property and delegate channels.
pub trait EngineObserver: Send + Sync {
    fn on_property(&self, change: PropertyChange);
    fn on_navigation(&self, event: NavigationEvent);
    fn on_authoring(&self, event: AuthoringEvent);
}

/// One running engine instance, exclusively owned by the engine selector for
/// the duration of its life. Everything else holds weak or borrowed access.
pub trait EngineInstance: Send + Sync {
    /// Register interest in one property. The returned handle must be passed
    /// back to [`EngineInstance::unobserve`] before the instance is
    /// discarded; a registration left live past that point will invoke the
    /// observer on a dead adapter.
    fn observe(&self, property: EngineProperty, observer: Arc<dyn EngineObserver>)
        -> RegistrationId;

    fn unobserve(&self, registration: RegistrationId);

    /// Install the delegate sink for navigation/authoring callbacks.
    fn set_delegate(&self, observer: Arc<dyn EngineObserver>);

    fn clear_delegate(&self);

    /// Begin loading a document. Completion is reported via the delegate
    /// channel, never synchronously.
    fn load(&self, url: Url);

    fn stop_loading(&self);

    /// The last committed location, if any. Unchanged while a provisional
    /// load is still in flight.
    fn current_url(&self) -> Option<Url>;

    fn set_client_identity(&self, user_agent: &str);

    fn inject_shim(&self, script: &str);

    fn set_scripting_enabled(&self, enabled: bool);

    /// Produce a visual snapshot of the current document, when supported.
    fn capture_snapshot(&self) -> Option<Vec<u8>>;
}

/// Constructs engine instances for a given client identity and shim set.
pub trait EngineFactory: Send + Sync {
    fn create(&self, user_agent: &str, shims: &[String]) -> Arc<dyn EngineInstance>;
}

/// Shared cell holding the tab's currently-live engine instance.
///
/// The selector is the only writer; the navigation runtime reads it to hand
/// a borrowed handle to collaborator hooks. An empty slot means the tab is
/// between engines (mid-swap or shutting down).
#[derive(Clone, Default)]
pub struct EngineSlot {
    inner: Arc<RwLock<Option<Arc<dyn EngineInstance>>>>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, engine: Arc<dyn EngineInstance>) {
        *self.inner.write() = Some(engine);
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    pub fn current(&self) -> Option<Arc<dyn EngineInstance>> {
        self.inner.read().clone()
    }
}
