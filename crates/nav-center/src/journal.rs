//! Bounded in-memory journal of recent lifecycle transitions, for
//! diagnostics. Failures that are silent at the UI surface still land here.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalKind {
    Started,
    Finished,
    Failed,
    Cancelled,
    WatchdogTimeout,
    EngineSwapped,
}

#[derive(Clone, Debug, Serialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub kind: JournalKind,
    pub detail: String,
}

#[derive(Debug)]
struct BoundedRing<T> {
    capacity: usize,
    data: VecDeque<T>,
}

impl<T: Clone> BoundedRing<T> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            data: VecDeque::new(),
        }
    }

    fn push(&mut self, item: T) {
        if self.data.len() == self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(item);
    }

    fn snapshot(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

pub struct NavJournal {
    ring: Mutex<BoundedRing<JournalEntry>>,
}

impl NavJournal {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: Mutex::new(BoundedRing::new(capacity)),
        }
    }

    pub fn record(&self, kind: JournalKind, detail: impl Into<String>) {
        self.ring.lock().push(JournalEntry {
            at: Utc::now(),
            kind,
            detail: detail.into(),
        });
    }

    pub fn snapshot(&self) -> Vec<JournalEntry> {
        self.ring.lock().snapshot()
    }

    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_drops_oldest_entries_past_capacity() {
        let journal = NavJournal::new(2);
        journal.record(JournalKind::Started, "a");
        journal.record(JournalKind::Finished, "b");
        journal.record(JournalKind::Started, "c");

        let entries = journal.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].detail, "b");
        assert_eq!(entries[1].detail, "c");
    }
}
