//! Marshals engine callbacks onto the per-tab adapter queue.
//!
//! The engine delivers property notifications and delegate callbacks from its
//! own internal threads, concurrently and unordered. The bridge is the single
//! synchronization point: every callback is re-dispatched onto one serialized
//! queue before any navigation state is read or written.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::metrics;
use crate::port::{
    AuthoringEvent, EngineInstance, EngineObserver, NavigationEvent, PropertyChange,
    RegistrationId, OBSERVED_PROPERTIES,
};

/// An engine callback after marshalling, as consumed by the adapter queue.
#[derive(Clone, Debug, PartialEq)]
pub enum BridgedEvent {
    Property(PropertyChange),
    Navigation(NavigationEvent),
    Authoring(AuthoringEvent),
}

/// Sender half of the adapter queue the bridge feeds.
pub type BridgeSender = mpsc::UnboundedSender<BridgedEvent>;

/// Receiver half, owned by the tab's navigation runtime.
pub type BridgeReceiver = mpsc::UnboundedReceiver<BridgedEvent>;

pub fn bridge_channel() -> (BridgeSender, BridgeReceiver) {
    mpsc::unbounded_channel()
}

/// Observer installed on the engine. Forwards onto the queue while live;
/// absorbs everything silently once the owning attachment is detached.
struct QueueSink {
    live: AtomicBool,
    queue: BridgeSender,
}

impl QueueSink {
    fn forward(&self, event: BridgedEvent) {
        if !self.live.load(Ordering::Acquire) {
            // Post-detach delivery is expected during engine teardown and
            // hot-swap; it must be a no-op, never a fault.
            metrics::record_dropped_event();
            return;
        }
        if self.queue.send(event).is_err() {
            debug!(target: "engine-bridge", "adapter queue closed; event dropped");
            metrics::record_dropped_event();
            return;
        }
        metrics::record_forwarded_event();
    }
}

impl EngineObserver for QueueSink {
    fn on_property(&self, change: PropertyChange) {
        self.forward(BridgedEvent::Property(change));
    }

    fn on_navigation(&self, event: NavigationEvent) {
        self.forward(BridgedEvent::Navigation(event));
    }

    fn on_authoring(&self, event: AuthoringEvent) {
        self.forward(BridgedEvent::Authoring(event));
    }
}

struct Attachment {
    /// Non-owning handle, held only so `detach` can unregister. Engine
    /// teardown never waits on the bridge.
    engine: Weak<dyn EngineInstance>,
    registrations: Vec<RegistrationId>,
    sink: Arc<QueueSink>,
}

/// Owns the observation registrations on the currently-live engine instance.
///
/// Invariant: the set of live registrations is exactly the set attached to
/// the current instance, and all of them are torn down strictly before the
/// instance reference is released.
pub struct ObservationBridge {
    queue: BridgeSender,
    attachment: Mutex<Option<Attachment>>,
}

impl ObservationBridge {
    pub fn new(queue: BridgeSender) -> Self {
        Self {
            queue,
            attachment: Mutex::new(None),
        }
    }

    /// Register the fixed property set and the delegate sinks on `engine`.
    /// An existing attachment to a different instance is detached first,
    /// which is what makes engine hot-swap safe.
    pub fn attach(&self, engine: &Arc<dyn EngineInstance>) {
        self.detach();

        let sink = Arc::new(QueueSink {
            live: AtomicBool::new(true),
            queue: self.queue.clone(),
        });
        let observer: Arc<dyn EngineObserver> = sink.clone();

        let registrations = OBSERVED_PROPERTIES
            .iter()
            .map(|property| engine.observe(*property, observer.clone()))
            .collect();
        engine.set_delegate(observer);

        metrics::record_attach();
        *self.attachment.lock() = Some(Attachment {
            engine: Arc::downgrade(engine),
            registrations,
            sink,
        });
    }

    /// Unregister everything, synchronously. Must run before the engine
    /// handle becomes invalid; calling it twice is a no-op.
    pub fn detach(&self) {
        let Some(attachment) = self.attachment.lock().take() else {
            return;
        };

        // Flip liveness first so callbacks racing the unregistration below
        // are absorbed rather than forwarded.
        attachment.sink.live.store(false, Ordering::Release);

        match attachment.engine.upgrade() {
            Some(engine) => {
                for registration in &attachment.registrations {
                    engine.unobserve(*registration);
                }
                engine.clear_delegate();
            }
            None => {
                warn!(
                    target: "engine-bridge",
                    "engine instance already gone at detach; registrations assumed dead"
                );
            }
        }
        metrics::record_detach();
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.lock().is_some()
    }
}

impl Drop for ObservationBridge {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubEngine;

    fn attach_to_stub() -> (Arc<StubEngine>, ObservationBridge, BridgeReceiver) {
        let (tx, rx) = bridge_channel();
        let bridge = ObservationBridge::new(tx);
        let stub = StubEngine::new();
        let engine: Arc<dyn EngineInstance> = stub.clone();
        bridge.attach(&engine);
        (stub, bridge, rx)
    }

    #[tokio::test]
    async fn attach_registers_full_property_set_and_delegate() {
        let (stub, bridge, _rx) = attach_to_stub();
        assert!(bridge.is_attached());
        assert_eq!(stub.live_registrations(), OBSERVED_PROPERTIES.len());
        assert!(stub.has_delegate());
    }

    #[tokio::test]
    async fn detach_is_idempotent_and_tears_everything_down() {
        let (stub, bridge, _rx) = attach_to_stub();
        bridge.detach();
        bridge.detach();
        assert!(!bridge.is_attached());
        assert_eq!(stub.live_registrations(), 0);
        assert!(!stub.has_delegate());
    }

    #[tokio::test]
    async fn events_delivered_after_detach_are_absorbed() {
        let (stub, bridge, mut rx) = attach_to_stub();

        stub.emit_property(PropertyChange::Progress(0.5));
        assert!(matches!(
            rx.recv().await,
            Some(BridgedEvent::Property(PropertyChange::Progress(_)))
        ));

        // An engine thread may have dequeued a callback before detach
        // unregistered it; invoking the retained sink afterwards must be
        // absorbed without reaching the queue.
        let stale_sink = stub.delegate().expect("delegate installed");
        bridge.detach();
        stale_sink.on_property(PropertyChange::Progress(0.9));
        stale_sink.on_navigation(NavigationEvent::Finished {
            url: "https://example.com/".parse().unwrap(),
        });
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reattach_to_second_instance_detaches_the_first() {
        let (first, bridge, _rx) = attach_to_stub();

        let second = StubEngine::new();
        let engine: Arc<dyn EngineInstance> = second.clone();
        bridge.attach(&engine);

        assert_eq!(first.live_registrations(), 0);
        assert!(!first.has_delegate());
        assert_eq!(second.live_registrations(), OBSERVED_PROPERTIES.len());
        assert!(second.has_delegate());
    }
}
