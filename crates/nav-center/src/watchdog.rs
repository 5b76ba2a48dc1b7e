//! Per-attempt watchdog escaping stuck provisional loads.

use std::time::Duration;

use tabshell_core_types::AttemptId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::InternalEvent;

/// One-shot cancellable timer scoped to a single navigation attempt.
///
/// Expiry never mutates state directly: it posts a timeout event through the
/// adapter queue, so a legitimate completion racing the timer is resolved by
/// whichever event the queue consumer processes first.
pub struct LoadWatchdog {
    cancel: CancellationToken,
}

impl LoadWatchdog {
    pub fn arm(
        attempt: AttemptId,
        timeout: Duration,
        queue: mpsc::UnboundedSender<InternalEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let guard = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    let _ = queue.send(InternalEvent::WatchdogFired {
                        attempt,
                        after_ms: timeout.as_millis() as u64,
                    });
                }
            }
        });
        Self { cancel }
    }

    /// Idempotent; called on every terminal path of the attempt.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for LoadWatchdog {
    fn drop(&mut self) {
        // An attempt record going away must never leave a timer behind.
        self.cancel.cancel();
    }
}
