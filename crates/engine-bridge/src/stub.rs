//! Deterministic in-process engine used by tests and the demo driver.
//!
//! Selected whenever no real engine backend is wired in, the same way the
//! adapter falls back to a stub transport when no browser is available. The
//! stub performs no loading of its own: tests and the demo script every
//! property notification and delegate callback explicitly, which is exactly
//! the unordered, externally-driven delivery the bridge has to absorb.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tracing::debug;
use url::Url;

use crate::port::{
    AuthoringEvent, EngineFactory, EngineInstance, EngineObserver, EngineProperty,
    NavigationEvent, PropertyChange, RegistrationId,
};

const STUB_SNAPSHOT: &[u8] = b"stub-snapshot";

pub struct StubEngine {
    registrations: DashMap<u64, (EngineProperty, Arc<dyn EngineObserver>)>,
    delegate: RwLock<Option<Arc<dyn EngineObserver>>>,
    next_registration: AtomicU64,
    current_url: RwLock<Option<Url>>,
    client_identity: RwLock<String>,
    shims: RwLock<Vec<String>>,
    scripting_enabled: AtomicBool,
    requested_loads: Mutex<Vec<Url>>,
    stop_requests: AtomicU64,
}

impl StubEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            registrations: DashMap::new(),
            delegate: RwLock::new(None),
            next_registration: AtomicU64::new(1),
            current_url: RwLock::new(None),
            client_identity: RwLock::new(String::new()),
            shims: RwLock::new(Vec::new()),
            scripting_enabled: AtomicBool::new(true),
            requested_loads: Mutex::new(Vec::new()),
            stop_requests: AtomicU64::new(0),
        })
    }

    // ── scripting surface ──

    /// Deliver a property notification to every observer registered for that
    /// property, on the calling thread.
    pub fn emit_property(&self, change: PropertyChange) {
        let property = change.property();
        for entry in self.registrations.iter() {
            let (registered, observer) = entry.value();
            if *registered == property {
                observer.on_property(change.clone());
            }
        }
    }

    /// Deliver a navigation callback on the delegate channel.
    pub fn emit_navigation(&self, event: NavigationEvent) {
        if let Some(observer) = self.delegate.read().clone() {
            observer.on_navigation(event);
        }
    }

    /// Deliver an authoring callback on the delegate channel.
    pub fn emit_authoring(&self, event: AuthoringEvent) {
        if let Some(observer) = self.delegate.read().clone() {
            observer.on_authoring(event);
        }
    }

    /// Mark `url` as committed, as a real engine would once the response
    /// starts arriving. Only then does `current_url` change.
    pub fn commit(&self, url: Url) {
        *self.current_url.write() = Some(url);
    }

    /// Script a full successful load: started, progress, commit, title,
    /// progress complete, finished.
    pub fn complete_load(&self, url: Url, title: &str) {
        self.emit_navigation(NavigationEvent::Started { url: url.clone() });
        self.emit_property(PropertyChange::Loading(true));
        self.emit_property(PropertyChange::Progress(0.3));
        self.commit(url.clone());
        self.emit_property(PropertyChange::Title(title.to_string()));
        self.emit_property(PropertyChange::Progress(1.0));
        self.emit_navigation(NavigationEvent::Finished { url });
    }

    // ── inspection surface ──

    pub fn live_registrations(&self) -> usize {
        self.registrations.len()
    }

    pub fn has_delegate(&self) -> bool {
        self.delegate.read().is_some()
    }

    /// Clone out the installed delegate sink, simulating an engine thread
    /// that captured the observer before it was unregistered.
    pub fn delegate(&self) -> Option<Arc<dyn EngineObserver>> {
        self.delegate.read().clone()
    }

    pub fn requested_loads(&self) -> Vec<Url> {
        self.requested_loads.lock().clone()
    }

    pub fn last_requested_load(&self) -> Option<Url> {
        self.requested_loads.lock().last().cloned()
    }

    pub fn stop_requests(&self) -> u64 {
        self.stop_requests.load(Ordering::Relaxed)
    }

    pub fn client_identity(&self) -> String {
        self.client_identity.read().clone()
    }

    pub fn injected_shims(&self) -> Vec<String> {
        self.shims.read().clone()
    }

    pub fn scripting_enabled(&self) -> bool {
        self.scripting_enabled.load(Ordering::Relaxed)
    }
}

impl EngineInstance for StubEngine {
    fn observe(
        &self,
        property: EngineProperty,
        observer: Arc<dyn EngineObserver>,
    ) -> RegistrationId {
        let id = self.next_registration.fetch_add(1, Ordering::Relaxed);
        self.registrations.insert(id, (property, observer));
        RegistrationId(id)
    }

    fn unobserve(&self, registration: RegistrationId) {
        self.registrations.remove(&registration.0);
    }

    fn set_delegate(&self, observer: Arc<dyn EngineObserver>) {
        *self.delegate.write() = Some(observer);
    }

    fn clear_delegate(&self) {
        *self.delegate.write() = None;
    }

    fn load(&self, url: Url) {
        debug!(target: "engine-stub", %url, "load requested");
        self.requested_loads.lock().push(url);
    }

    fn stop_loading(&self) {
        self.stop_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn current_url(&self) -> Option<Url> {
        self.current_url.read().clone()
    }

    fn set_client_identity(&self, user_agent: &str) {
        *self.client_identity.write() = user_agent.to_string();
    }

    fn inject_shim(&self, script: &str) {
        self.shims.write().push(script.to_string());
    }

    fn set_scripting_enabled(&self, enabled: bool) {
        self.scripting_enabled.store(enabled, Ordering::Relaxed);
    }

    fn capture_snapshot(&self) -> Option<Vec<u8>> {
        Some(STUB_SNAPSHOT.to_vec())
    }
}

/// Factory handing out stub instances; keeps every created instance
/// reachable so tests can script the engine a selector just built.
#[derive(Default)]
pub struct StubEngineFactory {
    created: Mutex<Vec<Arc<StubEngine>>>,
}

impl StubEngineFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn last_created(&self) -> Option<Arc<StubEngine>> {
        self.created.lock().last().cloned()
    }
}

impl EngineFactory for StubEngineFactory {
    fn create(&self, user_agent: &str, shims: &[String]) -> Arc<dyn EngineInstance> {
        let engine = StubEngine::new();
        engine.set_client_identity(user_agent);
        for shim in shims {
            engine.inject_shim(shim);
        }
        self.created.lock().push(engine.clone());
        engine
    }
}
