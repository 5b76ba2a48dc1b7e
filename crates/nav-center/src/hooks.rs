//! Collaborator hooks invoked by the navigation lifecycle.
//!
//! Every external concern (history, content policy, thumbnails, home
//! location) is injected as a trait object at construction. Hook failures
//! are isolated per hook and never affect navigation state.

use std::sync::Arc;

use engine_bridge::EngineInstance;
use parking_lot::Mutex;
use tabshell_core_types::TabId;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct HookError(pub String);

impl HookError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Resolves the designated home location, used to suppress the URL display.
pub trait HomeResolver: Send + Sync {
    fn home_url(&self) -> Option<Url>;
}

/// Content-blocking policy. Queried at engine construction and re-queried
/// when a navigation finishes on a new origin.
pub trait ContentPolicy: Send + Sync {
    fn is_scripting_blocked(&self, origin: &str) -> bool;

    /// Apply compiled blocking rules to a freshly constructed instance.
    fn apply_rules(&self, engine: &dyn EngineInstance) -> Result<(), HookError>;
}

/// Records a finished visit for history.
pub trait VisitSink: Send + Sync {
    fn record_visit(&self, url: &Url, title: &str) -> Result<(), HookError>;
}

/// Captures a visual snapshot of the finished document.
pub trait SnapshotSink: Send + Sync {
    fn capture(&self, engine: &dyn EngineInstance, tab: TabId) -> Result<(), HookError>;
}

/// The full injected hook set.
#[derive(Clone)]
pub struct Hooks {
    pub home: Arc<dyn HomeResolver>,
    pub policy: Arc<dyn ContentPolicy>,
    pub visits: Arc<dyn VisitSink>,
    pub snapshots: Arc<dyn SnapshotSink>,
}

impl Hooks {
    /// Hooks that do nothing; useful for tests and headless runs.
    pub fn disabled() -> Self {
        Self {
            home: Arc::new(StaticHomeResolver::none()),
            policy: Arc::new(AllowAllPolicy),
            visits: Arc::new(NullVisitSink),
            snapshots: Arc::new(NullSnapshotSink),
        }
    }
}

// ── default implementations ──

/// Fixed home location (or none).
pub struct StaticHomeResolver {
    home: Option<Url>,
}

impl StaticHomeResolver {
    pub fn new(home: Url) -> Self {
        Self { home: Some(home) }
    }

    pub fn none() -> Self {
        Self { home: None }
    }
}

impl HomeResolver for StaticHomeResolver {
    fn home_url(&self) -> Option<Url> {
        self.home.clone()
    }
}

/// Permits scripting everywhere and applies no rules.
pub struct AllowAllPolicy;

impl ContentPolicy for AllowAllPolicy {
    fn is_scripting_blocked(&self, _origin: &str) -> bool {
        false
    }

    fn apply_rules(&self, _engine: &dyn EngineInstance) -> Result<(), HookError> {
        Ok(())
    }
}

/// Blocks scripting for an explicit origin list; applies no other rules.
pub struct OriginDenyPolicy {
    blocked: Vec<String>,
}

impl OriginDenyPolicy {
    pub fn new(blocked: Vec<String>) -> Self {
        Self { blocked }
    }
}

impl ContentPolicy for OriginDenyPolicy {
    fn is_scripting_blocked(&self, origin: &str) -> bool {
        self.blocked.iter().any(|entry| entry == origin)
    }

    fn apply_rules(&self, _engine: &dyn EngineInstance) -> Result<(), HookError> {
        Ok(())
    }
}

pub struct NullVisitSink;

impl VisitSink for NullVisitSink {
    fn record_visit(&self, _url: &Url, _title: &str) -> Result<(), HookError> {
        Ok(())
    }
}

/// Keeps visits in memory; the demo driver and tests read them back.
#[derive(Default)]
pub struct InMemoryVisitLog {
    entries: Mutex<Vec<(Url, String)>>,
}

impl InMemoryVisitLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn entries(&self) -> Vec<(Url, String)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl VisitSink for InMemoryVisitLog {
    fn record_visit(&self, url: &Url, title: &str) -> Result<(), HookError> {
        self.entries.lock().push((url.clone(), title.to_string()));
        Ok(())
    }
}

pub struct NullSnapshotSink;

impl SnapshotSink for NullSnapshotSink {
    fn capture(&self, _engine: &dyn EngineInstance, _tab: TabId) -> Result<(), HookError> {
        Ok(())
    }
}

/// Records which tabs were snapshotted, discarding the image data.
#[derive(Default)]
pub struct InMemorySnapshotLog {
    captures: Mutex<Vec<TabId>>,
}

impl InMemorySnapshotLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn captures(&self) -> Vec<TabId> {
        self.captures.lock().clone()
    }
}

impl SnapshotSink for InMemorySnapshotLog {
    fn capture(&self, engine: &dyn EngineInstance, tab: TabId) -> Result<(), HookError> {
        engine
            .capture_snapshot()
            .ok_or_else(|| HookError::new("engine produced no snapshot"))?;
        self.captures.lock().push(tab);
        Ok(())
    }
}
