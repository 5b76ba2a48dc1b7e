//! Process-local counters for navigation outcomes.
//!
//! Transient failures and watchdog timeouts are silent at the UI surface,
//! so these counters are the operator-facing record of them.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavMetricsSnapshot {
    pub started: u64,
    pub finished: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub watchdog_timeouts: u64,
    pub hook_failures: u64,
}

static STARTED: AtomicU64 = AtomicU64::new(0);
static FINISHED: AtomicU64 = AtomicU64::new(0);
static FAILED: AtomicU64 = AtomicU64::new(0);
static CANCELLED: AtomicU64 = AtomicU64::new(0);
static WATCHDOG_TIMEOUTS: AtomicU64 = AtomicU64::new(0);
static HOOK_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn record_started() {
    STARTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_finished() {
    FINISHED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_failed() {
    FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_cancelled() {
    CANCELLED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_watchdog_timeout() {
    WATCHDOG_TIMEOUTS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_hook_failure() {
    HOOK_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> NavMetricsSnapshot {
    NavMetricsSnapshot {
        started: STARTED.load(Ordering::Relaxed),
        finished: FINISHED.load(Ordering::Relaxed),
        failed: FAILED.load(Ordering::Relaxed),
        cancelled: CANCELLED.load(Ordering::Relaxed),
        watchdog_timeouts: WATCHDOG_TIMEOUTS.load(Ordering::Relaxed),
        hook_failures: HOOK_FAILURES.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    STARTED.store(0, Ordering::Relaxed);
    FINISHED.store(0, Ordering::Relaxed);
    FAILED.store(0, Ordering::Relaxed);
    CANCELLED.store(0, Ordering::Relaxed);
    WATCHDOG_TIMEOUTS.store(0, Ordering::Relaxed);
    HOOK_FAILURES.store(0, Ordering::Relaxed);
}
