//! Non-blocking fan-out of node events to subscribers.
//!
//! [`SubscriberSet`] hands each [`Event`] to every subscriber without waiting
//! for any of them to process it:
//!
//! ```text
//!    emit(&Event)
//!        │                     (Arc-clone per subscriber)
//!        ├──────────► [queue console] ─► worker ─► ConsoleLog::on_event()
//!        └──────────► [queue custom]  ─► worker ─► <custom>::on_event()
//! ```
//!
//! `emit` returns immediately; each subscriber sees events in FIFO order and
//! its panics stay contained in its own worker. There is no global ordering
//! across subscribers and no retry on overflow: a full queue drops the event
//! for that subscriber only.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::warn;

use crate::events::Event;

use super::Subscribe;

/// Per-subscriber channel with metadata.
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Builds the set, spawning one worker task per subscriber.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let cap = sub.queue_capacity().max(1);
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let s = Arc::clone(&sub);

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = s.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        warn!(subscriber = s.name(), ?panic_err, "subscriber panicked");
                    }
                }
            });

            channels.push(SubscriberChannel { name, sender: tx });
            workers.push(handle);
        }

        Self { channels, workers }
    }

    /// Fans one event out to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is full or closed, the event is dropped for it
    /// and a warning is logged with the subscriber's name.
    pub fn emit(&self, event: &Event) {
        let ev = Arc::new(event.clone());
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = channel.name, "event dropped: queue full");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(subscriber = channel.name, "event dropped: worker closed");
                }
            }
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.channels);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Counter {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl Subscribe for Counter {
        async fn on_event(&self, _event: &Event) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    struct Panicker;

    #[async_trait]
    impl Subscribe for Panicker {
        async fn on_event(&self, _event: &Event) {
            panic!("boom");
        }

        fn name(&self) -> &'static str {
            "panicker"
        }
    }

    #[tokio::test]
    async fn events_reach_every_subscriber() {
        let counter = Arc::new(Counter {
            seen: AtomicUsize::new(0),
        });
        let subs: Vec<Arc<dyn Subscribe>> = vec![counter.clone()];
        let set = SubscriberSet::new(subs);
        assert_eq!(set.len(), 1);

        for _ in 0..5 {
            set.emit(&Event::new(EventKind::RoutineStatus));
        }
        set.shutdown().await;

        assert_eq!(counter.seen.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn panicking_subscriber_does_not_poison_others() {
        let counter = Arc::new(Counter {
            seen: AtomicUsize::new(0),
        });
        let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(Panicker), counter.clone()];
        let set = SubscriberSet::new(subs);

        set.emit(&Event::new(EventKind::AlarmRaised));
        set.emit(&Event::new(EventKind::AlarmRaised));
        tokio::time::sleep(Duration::from_millis(50)).await;
        set.shutdown().await;

        assert_eq!(counter.seen.load(Ordering::SeqCst), 2);
    }
}
