//! The serialized navigation lifecycle.
//!
//! One runtime task per tab consumes the adapter queue: bridged engine
//! events, watchdog expiries, and control commands all funnel into the same
//! single-consumer loop, which is the only writer of `NavigationState`.
//! Events from the engine's property and delegate channels carry no mutual
//! ordering guarantee, so terminal events are treated as authoritative
//! resets regardless of stale property values around them.

use std::sync::Arc;
use std::time::{Duration, Instant};

use engine_bridge::{
    AuthoringEvent, BridgeReceiver, BridgeSender, BridgedEvent, EngineSlot, NavigationEvent,
    PropertyChange,
};
use tabshell_core_types::{AttemptId, LoadError, TabId};
use tabshell_event_bus::{SignalBus, StateFeed};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::hooks::Hooks;
use crate::journal::{JournalKind, NavJournal};
use crate::metrics;
use crate::state::{NavPhase, NavigationState, DEFAULT_TITLE};
use crate::watchdog::LoadWatchdog;

/// Control commands serialized onto the adapter queue.
#[derive(Clone, Debug)]
pub enum TabCommand {
    /// Ask the live engine to load `url`. The lifecycle reacts to the
    /// engine's own started callback, not to this command.
    Navigate { url: Url },
    /// Terminate the in-flight attempt (engine swap, tab close).
    CancelAttempt,
    Shutdown,
}

/// Internal events carried on the control channel alongside commands.
#[derive(Clone, Debug)]
pub enum InternalEvent {
    WatchdogFired { attempt: AttemptId, after_ms: u64 },
    Command(TabCommand),
}

/// Published when a navigation starts, carrying the requested target so the
/// UI can optimistically update its location field before commit.
#[derive(Clone, Debug)]
pub struct NavStarted {
    pub tab: TabId,
    pub url: Url,
}

/// Dependencies injected into a tab's navigation runtime.
#[derive(Clone)]
pub struct NavDeps {
    pub hooks: Hooks,
    pub engine: EngineSlot,
    pub nav_started: Arc<SignalBus<NavStarted>>,
    pub watchdog_timeout: Duration,
    pub journal_capacity: usize,
}

impl NavDeps {
    pub fn new(hooks: Hooks, engine: EngineSlot, nav_started: Arc<SignalBus<NavStarted>>) -> Self {
        Self {
            hooks,
            engine,
            nav_started,
            watchdog_timeout: Duration::from_secs(15),
            journal_capacity: 64,
        }
    }

    pub fn with_watchdog_timeout(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }
}

struct Attempt {
    id: AttemptId,
    target: Url,
    started_at: Instant,
    watchdog: LoadWatchdog,
}

/// Cheap clonable control surface over a running navigation runtime.
#[derive(Clone)]
pub struct NavHandle {
    tab: TabId,
    control: mpsc::UnboundedSender<InternalEvent>,
    feed: watch::Receiver<NavigationState>,
    journal: Arc<NavJournal>,
    cancel: CancellationToken,
}

impl NavHandle {
    pub fn tab(&self) -> TabId {
        self.tab
    }

    pub fn navigate(&self, url: Url) {
        let _ = self
            .control
            .send(InternalEvent::Command(TabCommand::Navigate { url }));
    }

    pub fn cancel_attempt(&self) {
        let _ = self
            .control
            .send(InternalEvent::Command(TabCommand::CancelAttempt));
    }

    pub fn shutdown(&self) {
        let _ = self
            .control
            .send(InternalEvent::Command(TabCommand::Shutdown));
        self.cancel.cancel();
    }

    /// Subscribe to committed state. Readable from any context.
    pub fn watch(&self) -> watch::Receiver<NavigationState> {
        self.feed.clone()
    }

    pub fn latest(&self) -> NavigationState {
        self.feed.borrow().clone()
    }

    pub fn journal(&self) -> &Arc<NavJournal> {
        &self.journal
    }
}

/// Spawn the per-tab runtime. Returns the control handle, the sender the
/// observation bridge feeds, and the runtime task handle.
pub fn spawn(tab: TabId, deps: NavDeps) -> (NavHandle, BridgeSender, JoinHandle<()>) {
    let (bridge_tx, bridge_rx) = engine_bridge::bridge_channel();
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let journal = Arc::new(NavJournal::new(deps.journal_capacity));
    let feed = StateFeed::new(NavigationState::default());
    let handle = NavHandle {
        tab,
        control: control_tx.clone(),
        feed: feed.watch(),
        journal: journal.clone(),
        cancel: cancel.clone(),
    };

    let runtime = NavRuntime {
        tab,
        phase: NavPhase::Idle,
        attempt: None,
        had_attempt: false,
        state: NavigationState::default(),
        feed,
        deps,
        journal,
        internal_tx: control_tx,
        cancel,
    };
    let task = tokio::spawn(runtime.run(bridge_rx, control_rx));

    (handle, bridge_tx, task)
}

struct NavRuntime {
    tab: TabId,
    phase: NavPhase,
    attempt: Option<Attempt>,
    /// Set on the first provisional start; afterwards, load-progress
    /// properties are only accepted while an attempt is in flight so stale
    /// echoes cannot clobber terminal values.
    had_attempt: bool,
    state: NavigationState,
    feed: StateFeed<NavigationState>,
    deps: NavDeps,
    journal: Arc<NavJournal>,
    internal_tx: mpsc::UnboundedSender<InternalEvent>,
    cancel: CancellationToken,
}

impl NavRuntime {
    async fn run(
        mut self,
        mut bridged: BridgeReceiver,
        mut control: mpsc::UnboundedReceiver<InternalEvent>,
    ) {
        debug!(target: "nav-center", tab = %self.tab, "navigation runtime started");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = bridged.recv() => match event {
                    Some(event) => self.on_bridged(event),
                    None => break,
                },
                event = control.recv() => match event {
                    Some(event) => self.on_internal(event),
                    None => break,
                },
            }
        }
        // The runtime going away terminates any in-flight attempt so its
        // watchdog cannot outlive the tab.
        if let Some(attempt) = self.attempt.take() {
            attempt.watchdog.stop();
        }
        debug!(target: "nav-center", tab = %self.tab, "navigation runtime stopped");
    }

    fn publish(&self) {
        self.feed.publish(self.state.clone());
    }

    fn on_bridged(&mut self, event: BridgedEvent) {
        match event {
            BridgedEvent::Property(change) => self.on_property(change),
            BridgedEvent::Navigation(event) => self.on_navigation(event),
            BridgedEvent::Authoring(event) => self.on_authoring(event),
        }
    }

    fn on_internal(&mut self, event: InternalEvent) {
        match event {
            InternalEvent::WatchdogFired { attempt, after_ms } => {
                self.on_watchdog_fired(attempt, after_ms)
            }
            InternalEvent::Command(command) => self.on_command(command),
        }
    }

    // ── property channel ──

    /// True while progress/loading notifications should be applied: during
    /// an attempt, and before the first attempt ever starts.
    fn accepts_load_properties(&self) -> bool {
        self.attempt.is_some() || !self.had_attempt
    }

    fn on_property(&mut self, change: PropertyChange) {
        match change {
            PropertyChange::Title(title) => {
                self.state.title = if title.is_empty() {
                    DEFAULT_TITLE.to_string()
                } else {
                    title
                };
                self.mark_committed();
            }
            PropertyChange::Progress(progress) => {
                if self.accepts_load_properties() {
                    self.state.progress = progress.clamp(0.0, 1.0);
                    self.mark_committed();
                } else {
                    debug!(target: "nav-center", tab = %self.tab, "stale progress echo dropped");
                    return;
                }
            }
            PropertyChange::Loading(loading) => {
                if self.accepts_load_properties() {
                    self.state.is_loading = loading;
                } else {
                    debug!(target: "nav-center", tab = %self.tab, "stale loading echo dropped");
                    return;
                }
            }
            PropertyChange::CanGoBack(value) => self.state.can_go_back = value,
            PropertyChange::CanGoForward(value) => self.state.can_go_forward = value,
        }
        self.publish();
    }

    /// Commit has no distinct engine event; the first content activity after
    /// a provisional start is taken as the commit point.
    fn mark_committed(&mut self) {
        if self.phase == NavPhase::Provisional && self.attempt.is_some() {
            self.phase = NavPhase::Committed;
        }
    }

    // ── delegate channel ──

    fn on_navigation(&mut self, event: NavigationEvent) {
        match event {
            NavigationEvent::Started { url } => self.on_started(url),
            NavigationEvent::Finished { url } => self.on_finished(url),
            NavigationEvent::Failed { url, error } => self.on_failed(url, error),
        }
    }

    fn on_started(&mut self, target: Url) {
        // A new start supersedes any in-flight attempt. The engine follows
        // up with a cancellation error for the old one, which is then a
        // stale echo filtered by target below.
        if let Some(previous) = self.attempt.take() {
            previous.watchdog.stop();
            self.journal
                .record(JournalKind::Cancelled, previous.target.as_str());
            metrics::record_cancelled();
        }

        let id = AttemptId::new();
        let watchdog = LoadWatchdog::arm(id, self.deps.watchdog_timeout, self.internal_tx.clone());
        self.attempt = Some(Attempt {
            id,
            target: target.clone(),
            started_at: Instant::now(),
            watchdog,
        });
        self.had_attempt = true;
        self.phase = NavPhase::Provisional;
        self.state.is_loading = true;
        self.state.progress = 0.0;

        // Mirror the engine's current location so the UI reflects the
        // pending navigation; the engine reports the last committed URI
        // here, which leaves the displayed location unchanged until commit.
        if let Some(engine) = self.deps.engine.current() {
            if let Some(url) = engine.current_url() {
                self.state.url = Some(url);
            }
        }

        self.journal.record(JournalKind::Started, target.as_str());
        metrics::record_started();
        self.deps.nav_started.publish(NavStarted {
            tab: self.tab,
            url: target,
        });
        self.publish();
    }

    fn on_finished(&mut self, url: Url) {
        let Some(attempt) = self.attempt.take() else {
            debug!(target: "nav-center", tab = %self.tab, %url, "finished with no live attempt");
            return;
        };
        attempt.watchdog.stop();

        self.phase = NavPhase::Idle;
        self.state.is_loading = false;
        self.state.progress = 1.0;
        self.state.url = Some(url.clone());
        self.state.display_url_in_chrome = !self.is_home(&url);

        self.run_finish_hooks(&url);
        self.journal.record(
            JournalKind::Finished,
            format!("{} ({}ms)", url, attempt.started_at.elapsed().as_millis()),
        );
        metrics::record_finished();
        self.publish();
    }

    fn on_failed(&mut self, url: Option<Url>, error: LoadError) {
        let Some(attempt) = self.attempt.take() else {
            debug!(target: "nav-center", tab = %self.tab, %error, "failure with no live attempt");
            return;
        };
        if let Some(failed_url) = &url {
            if *failed_url != attempt.target {
                // Failure report for an already-superseded load.
                debug!(target: "nav-center", tab = %self.tab, %failed_url, "stale failure ignored");
                self.attempt = Some(attempt);
                return;
            }
        }
        attempt.watchdog.stop();

        self.phase = NavPhase::Idle;
        self.state.is_loading = false;
        self.state.progress = 0.0;

        match &error {
            LoadError::Cancelled => {
                // Expected (superseded or user-stopped); silent.
                self.journal
                    .record(JournalKind::Cancelled, attempt.target.as_str());
                metrics::record_cancelled();
            }
            LoadError::WatchdogTimeout { .. } => {
                self.journal
                    .record(JournalKind::WatchdogTimeout, attempt.target.as_str());
                metrics::record_watchdog_timeout();
                warn!(target: "nav-center", tab = %self.tab, url = %attempt.target, "load watchdog expired");
            }
            LoadError::Transient { reason } => {
                self.journal.record(JournalKind::Failed, reason.as_str());
                metrics::record_failed();
                warn!(target: "nav-center", tab = %self.tab, url = %attempt.target, %error, "load failed");
            }
        }
        self.publish();
    }

    fn on_authoring(&mut self, event: AuthoringEvent) {
        match event {
            AuthoringEvent::PopupRequested { url } => {
                // New-window requests are resolved as same-tab navigations.
                debug!(target: "nav-center", tab = %self.tab, %url, "popup resolved in-tab");
                match self.deps.engine.current() {
                    Some(engine) => engine.load(url),
                    None => warn!(target: "nav-center", tab = %self.tab, "popup with no live engine"),
                }
            }
        }
    }

    // ── watchdog & commands ──

    fn on_watchdog_fired(&mut self, attempt: AttemptId, after_ms: u64) {
        let applies = self
            .attempt
            .as_ref()
            .map_or(false, |current| current.id == attempt);
        if !applies {
            debug!(target: "nav-center", tab = %self.tab, "stale watchdog expiry ignored");
            return;
        }
        let target = self
            .attempt
            .as_ref()
            .map(|current| current.target.clone());
        self.on_failed(target, LoadError::WatchdogTimeout { after_ms });
    }

    fn on_command(&mut self, command: TabCommand) {
        match command {
            TabCommand::Navigate { url } => match self.deps.engine.current() {
                Some(engine) => engine.load(url),
                None => {
                    warn!(target: "nav-center", tab = %self.tab, "navigate with no live engine")
                }
            },
            TabCommand::CancelAttempt => {
                let Some(attempt) = self.attempt.take() else {
                    return;
                };
                attempt.watchdog.stop();
                self.phase = NavPhase::Idle;
                self.state.is_loading = false;
                self.state.progress = 0.0;
                if let Some(engine) = self.deps.engine.current() {
                    engine.stop_loading();
                }
                self.journal
                    .record(JournalKind::Cancelled, attempt.target.as_str());
                metrics::record_cancelled();
                self.publish();
            }
            TabCommand::Shutdown => self.cancel.cancel(),
        }
    }

    // ── hooks ──

    fn is_home(&self, url: &Url) -> bool {
        self.deps
            .hooks
            .home
            .home_url()
            .map_or(false, |home| home == *url)
    }

    /// Each hook is isolated: a failing collaborator is logged and counted,
    /// never allowed to touch navigation state.
    fn run_finish_hooks(&self, url: &Url) {
        let hooks = &self.deps.hooks;

        if let Err(err) = hooks.visits.record_visit(url, &self.state.title) {
            metrics::record_hook_failure();
            warn!(target: "nav-center", tab = %self.tab, %err, "visit hook failed");
        }

        if let Some(engine) = self.deps.engine.current() {
            let origin = url.origin().ascii_serialization();
            let blocked = hooks.policy.is_scripting_blocked(&origin);
            engine.set_scripting_enabled(!blocked);

            if let Err(err) = hooks.snapshots.capture(engine.as_ref(), self.tab) {
                metrics::record_hook_failure();
                warn!(target: "nav-center", tab = %self.tab, %err, "snapshot hook failed");
            }
        }
    }
}
