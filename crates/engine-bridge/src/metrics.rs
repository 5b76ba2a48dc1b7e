//! Process-local counters for bridge activity.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeMetricsSnapshot {
    pub attaches: u64,
    pub detaches: u64,
    pub forwarded_events: u64,
    pub dropped_events: u64,
}

static ATTACHES: AtomicU64 = AtomicU64::new(0);
static DETACHES: AtomicU64 = AtomicU64::new(0);
static FORWARDED: AtomicU64 = AtomicU64::new(0);
static DROPPED: AtomicU64 = AtomicU64::new(0);

pub fn record_attach() {
    ATTACHES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_detach() {
    DETACHES.fetch_add(1, Ordering::Relaxed);
}

pub fn record_forwarded_event() {
    FORWARDED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_dropped_event() {
    DROPPED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> BridgeMetricsSnapshot {
    BridgeMetricsSnapshot {
        attaches: ATTACHES.load(Ordering::Relaxed),
        detaches: DETACHES.load(Ordering::Relaxed),
        forwarded_events: FORWARDED.load(Ordering::Relaxed),
        dropped_events: DROPPED.load(Ordering::Relaxed),
    }
}

pub fn reset() {
    ATTACHES.store(0, Ordering::Relaxed);
    DETACHES.store(0, Ordering::Relaxed);
    FORWARDED.store(0, Ordering::Relaxed);
    DROPPED.store(0, Ordering::Relaxed);
}
