use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};

/// Trait implemented by payload types that can be carried on a signal bus.
pub trait Signal: Clone + Send + Sync + std::fmt::Debug + 'static {}

impl<T> Signal for T where T: Clone + Send + Sync + std::fmt::Debug + 'static {}

/// Broadcast fan-out for ephemeral signals (chrome show/hide, navigation
/// started). Publishing with no live subscribers is not an error; the signal
/// is simply dropped.
pub struct SignalBus<S>
where
    S: Signal,
{
    sender: broadcast::Sender<S>,
}

impl<S> SignalBus<S>
where
    S: Signal,
{
    pub fn new(capacity: usize) -> Arc<Self> {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Arc::new(Self { sender })
    }

    /// Publish a signal, returning the number of subscribers that saw it.
    pub fn publish(&self, signal: S) -> usize {
        self.sender.send(signal).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<S> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Latest-value feed for per-tab state.
///
/// The single writer publishes from the adapter queue; any number of readers
/// observe the latest committed value from any context. Readers cannot write
/// back through the feed.
pub struct StateFeed<T>
where
    T: Clone + Send + Sync + 'static,
{
    sender: watch::Sender<T>,
}

impl<T> StateFeed<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Replace the committed value. Never fails; a feed with no readers
    /// simply retains the value for future subscribers.
    pub fn publish(&self, value: T) {
        self.sender.send_replace(value);
    }

    pub fn watch(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> T {
        self.sender.borrow().clone()
    }
}

/// Materialise an mpsc receiver from a bus subscription so callers can await
/// signals without handling broadcast lag semantics directly.
pub fn to_mpsc<S>(bus: &Arc<SignalBus<S>>, capacity: usize) -> mpsc::Receiver<S>
where
    S: Signal,
{
    let mut rx = bus.subscribe();
    let (tx, out_rx) = mpsc::channel(capacity.max(1));
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(signal) => {
                    if tx.send(signal).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
    out_rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_without_subscribers_is_dropped() {
        let bus: Arc<SignalBus<u32>> = SignalBus::new(8);
        assert_eq!(bus.publish(1), 0);

        let mut rx = bus.subscribe();
        assert_eq!(bus.publish(2), 1);
        assert_eq!(rx.recv().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn state_feed_hands_latest_value_to_late_subscribers() {
        let feed = StateFeed::new(0u32);
        feed.publish(7);
        feed.publish(9);

        let rx = feed.watch();
        assert_eq!(*rx.borrow(), 9);
        assert_eq!(feed.latest(), 9);
    }

    #[tokio::test]
    async fn to_mpsc_forwards_signals_in_order() {
        let bus: Arc<SignalBus<u32>> = SignalBus::new(8);
        let mut rx = to_mpsc(&bus, 8);
        tokio::task::yield_now().await;

        bus.publish(1);
        bus.publish(2);
        assert_eq!(rx.recv().await, Some(1));
        assert_eq!(rx.recv().await, Some(2));
    }
}
