//! Canonical per-tab navigation state and the serialized lifecycle that
//! maintains it.
//!
//! Engine events, watchdog expiries, and control commands are funnelled
//! through one single-consumer queue per tab; that queue is the only place
//! navigation state is ever written. Readers subscribe to a latest-value
//! feed and may observe it from any context.

pub mod hooks;
pub mod journal;
pub mod lifecycle;
pub mod metrics;
pub mod state;
pub mod watchdog;

pub use hooks::{
    AllowAllPolicy, ContentPolicy, HomeResolver, HookError, Hooks, InMemorySnapshotLog,
    InMemoryVisitLog, NullSnapshotSink, NullVisitSink, OriginDenyPolicy, SnapshotSink,
    StaticHomeResolver, VisitSink,
};
pub use journal::{JournalEntry, JournalKind, NavJournal};
pub use lifecycle::{spawn, InternalEvent, NavDeps, NavHandle, NavStarted, TabCommand};
pub use state::{NavPhase, NavigationState, DEFAULT_TITLE};
pub use watchdog::LoadWatchdog;
