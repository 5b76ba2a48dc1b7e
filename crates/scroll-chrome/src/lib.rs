//! Scroll-direction heuristic for auto-hiding chrome.
//!
//! Raw scroll offsets arrive as a side channel independent of navigation
//! phase. The controller retains one offset and compares each incoming
//! sample against it; only a move larger than the hysteresis threshold emits
//! a direction signal and advances the retained offset. Sub-threshold jitter
//! leaves the retained offset untouched, so slow drift and sub-pixel noise
//! can never oscillate the chrome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use serde::Serialize;
use tabshell_event_bus::SignalBus;
use tracing::trace;

/// Default hysteresis threshold in scroll-offset units (logical pixels).
pub const DEFAULT_THRESHOLD: f64 = 24.0;

/// Direction signal consumed by the chrome visibility controller.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChromeSignal {
    /// Scrolling up: show the chrome.
    Show,
    /// Scrolling down: hide the chrome.
    Hide,
}

/// One raw scroll sample. Consumed immediately, never retained.
#[derive(Clone, Copy, Debug)]
pub struct ScrollSample {
    pub offset: f64,
    pub at: Instant,
}

impl ScrollSample {
    pub fn now(offset: f64) -> Self {
        Self {
            offset,
            at: Instant::now(),
        }
    }
}

pub struct ScrollChromeController {
    threshold: f64,
    last_offset: Mutex<Option<f64>>,
    input_focused: AtomicBool,
    signals: Arc<SignalBus<ChromeSignal>>,
}

impl ScrollChromeController {
    pub fn new(threshold: f64, signals: Arc<SignalBus<ChromeSignal>>) -> Self {
        Self {
            threshold: threshold.abs().max(f64::EPSILON),
            last_offset: Mutex::new(None),
            input_focused: AtomicBool::new(false),
            signals,
        }
    }

    pub fn with_default_threshold(signals: Arc<SignalBus<ChromeSignal>>) -> Self {
        Self::new(DEFAULT_THRESHOLD, signals)
    }

    /// While the chrome-owned input field has focus (location entry in
    /// progress), scroll activity must not move the chrome at all.
    pub fn set_input_focused(&self, focused: bool) {
        self.input_focused.store(focused, Ordering::Relaxed);
    }

    pub fn input_focused(&self) -> bool {
        self.input_focused.load(Ordering::Relaxed)
    }

    /// Feed one sample. Returns the emitted signal, if any.
    pub fn on_sample(&self, sample: ScrollSample) -> Option<ChromeSignal> {
        if self.input_focused.load(Ordering::Relaxed) {
            return None;
        }

        let mut last = self.last_offset.lock();
        let Some(reference) = *last else {
            // First sample establishes the baseline without emitting.
            *last = Some(sample.offset);
            return None;
        };

        let delta = sample.offset - reference;
        if delta.abs() <= self.threshold {
            // Jitter: the baseline stays put so noise cannot accumulate
            // into a phantom direction change.
            return None;
        }

        *last = Some(sample.offset);
        let signal = if delta > 0.0 {
            ChromeSignal::Hide
        } else {
            ChromeSignal::Show
        };
        trace!(target: "scroll-chrome", ?signal, delta, "direction emitted");
        self.signals.publish(signal);
        Some(signal)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ChromeSignal> {
        self.signals.subscribe()
    }

    /// Forget the retained offset, e.g. after a navigation replaced the
    /// document and its scroll position.
    pub fn reset(&self) {
        *self.last_offset.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(threshold: f64) -> ScrollChromeController {
        ScrollChromeController::new(threshold, SignalBus::new(16))
    }

    #[test]
    fn first_sample_only_establishes_the_baseline() {
        let ctrl = controller(20.0);
        assert_eq!(ctrl.on_sample(ScrollSample::now(500.0)), None);
    }

    #[test]
    fn scrolling_down_hides_and_up_shows() {
        let ctrl = controller(20.0);
        ctrl.on_sample(ScrollSample::now(100.0));
        assert_eq!(
            ctrl.on_sample(ScrollSample::now(150.0)),
            Some(ChromeSignal::Hide)
        );
        assert_eq!(
            ctrl.on_sample(ScrollSample::now(60.0)),
            Some(ChromeSignal::Show)
        );
    }

    #[test]
    fn sub_threshold_jitter_is_ignored_entirely() {
        let ctrl = controller(20.0);
        ctrl.on_sample(ScrollSample::now(100.0));

        // Ten samples, each one threshold/20 away, ending where we started.
        let step = 1.0;
        for i in 0..5 {
            assert_eq!(ctrl.on_sample(ScrollSample::now(100.0 + (i + 1) as f64 * step)), None);
        }
        for i in (0..5).rev() {
            assert_eq!(ctrl.on_sample(ScrollSample::now(100.0 + i as f64 * step)), None);
        }

        // The baseline never moved, so a real scroll still measures from 100.
        assert_eq!(
            ctrl.on_sample(ScrollSample::now(121.0)),
            Some(ChromeSignal::Hide)
        );
    }

    #[test]
    fn creeping_drift_below_threshold_never_emits() {
        let ctrl = controller(20.0);
        ctrl.on_sample(ScrollSample::now(0.0));
        // Keep drifting by less than the threshold per sample, but also keep
        // the total under the threshold so the baseline rule is what's
        // being exercised.
        for offset in [5.0, 10.0, 15.0, 19.0, 15.0, 8.0, 0.0] {
            assert_eq!(ctrl.on_sample(ScrollSample::now(offset)), None);
        }
    }

    #[test]
    fn focused_input_suppresses_all_emission() {
        let ctrl = controller(20.0);
        ctrl.on_sample(ScrollSample::now(100.0));
        ctrl.set_input_focused(true);

        assert_eq!(ctrl.on_sample(ScrollSample::now(500.0)), None);
        assert_eq!(ctrl.on_sample(ScrollSample::now(0.0)), None);

        ctrl.set_input_focused(false);
        // Baseline survived the focused interlude.
        assert_eq!(
            ctrl.on_sample(ScrollSample::now(150.0)),
            Some(ChromeSignal::Hide)
        );
    }

    #[tokio::test]
    async fn emitted_signals_reach_subscribers() {
        let bus = SignalBus::new(16);
        let ctrl = ScrollChromeController::new(20.0, bus.clone());
        let mut rx = ctrl.subscribe();

        ctrl.on_sample(ScrollSample::now(0.0));
        ctrl.on_sample(ScrollSample::now(100.0));
        assert_eq!(rx.recv().await.unwrap(), ChromeSignal::Hide);
    }

    #[test]
    fn reset_reestablishes_the_baseline() {
        let ctrl = controller(20.0);
        ctrl.on_sample(ScrollSample::now(400.0));
        ctrl.reset();
        assert_eq!(ctrl.on_sample(ScrollSample::now(0.0)), None);
    }
}
