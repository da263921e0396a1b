//! Uplink reporter with a simulated lossy connection.
//!
//! [`UplinkTask`] forwards the latest snapshot to a (simulated) remote server
//! on a fixed period, modeling connectivity as a two-state machine:
//!
//! ```text
//!            trial fails
//!    ┌─ Up ───────────────► Down
//!    │   ▲                    │
//!    │   │  recovery hold     │
//!    │   └────────────────────┘
//!    └── snapshot + DataSent (only while Up)
//! ```
//!
//! Each tick draws a failure trial from the [`LinkProbe`]. While up, a failed
//! trial drops the link: the task mirrors `link_up = false` into the store,
//! publishes [`LinkLost`](crate::EventKind::LinkLost), holds for the fixed
//! recovery delay, then comes back up unconditionally and publishes
//! [`LinkRestored`](crate::EventKind::LinkRestored). Recovery always succeeds
//! after the one fixed delay; there is no backoff growth and no permanent
//! failure path. If the link is up after transitions settle, the task
//! snapshots the store under the lock and publishes
//! [`DataSent`](crate::EventKind::DataSent); while down, nothing is sent.
//!
//! The whole failure cycle is synchronous within the task's own loop
//! iteration. No other task blocks on it or is notified of connectivity
//! changes; readers see `link_up` only through the snapshot mechanism.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::node::state::StateStore;
use crate::tasks::Task;

/// Connectivity of the simulated uplink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Connected; sends happen.
    Up,
    /// Disconnected; holding for recovery.
    Down,
}

/// Failure trial drawn once per tick.
///
/// The seam exists so tests can force the trial outcome; production code uses
/// [`RandomProbe`].
pub trait LinkProbe: Send + 'static {
    /// Returns `true` when this tick's trial indicates a connection failure.
    fn trial_fails(&mut self) -> bool;
}

/// Bernoulli trial with a fixed failure probability.
#[derive(Debug, Clone, Copy)]
pub struct RandomProbe {
    failure_probability: f64,
}

impl RandomProbe {
    /// Creates a probe failing with the given probability, clamped to [0, 1].
    pub fn new(failure_probability: f64) -> Self {
        Self {
            failure_probability: failure_probability.clamp(0.0, 1.0),
        }
    }
}

impl LinkProbe for RandomProbe {
    fn trial_fails(&mut self) -> bool {
        rand::rng().random_bool(self.failure_probability)
    }
}

/// Periodic task forwarding the latest reading over the simulated link.
pub struct UplinkTask {
    name: String,
    period: Duration,
    recovery: Duration,
    probe: Mutex<Box<dyn LinkProbe>>,
    store: Arc<StateStore>,
    bus: Bus,
}

impl UplinkTask {
    /// Creates an uplink task.
    ///
    /// `period` is the send interval; `recovery` is the fixed hold between
    /// losing the link and regaining it.
    pub fn new(
        name: impl Into<String>,
        period: Duration,
        recovery: Duration,
        probe: impl LinkProbe,
        store: Arc<StateStore>,
        bus: Bus,
    ) -> Self {
        Self {
            name: name.into(),
            period,
            recovery,
            probe: Mutex::new(Box::new(probe)),
            store,
            bus,
        }
    }

    fn draw_trial(&self) -> bool {
        self.probe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .trial_fails()
    }
}

#[async_trait]
impl Task for UplinkTask {
    fn name(&self) -> &str {
        &self.name
    }

    /// Sleep-then-send loop. The state machine variable is local to the loop;
    /// the store's `link_up` field is a mirror updated under the lock.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let mut link = LinkState::Up;

        loop {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }

            tokio::select! {
                _ = time::sleep(self.period) => {}
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
            }

            if link == LinkState::Up && self.draw_trial() {
                link = LinkState::Down;
                self.store.set_link_up(false);
                self.bus.publish(
                    Event::new(EventKind::LinkLost)
                        .with_task(self.name.clone())
                        .with_delay(self.recovery),
                );

                tokio::select! {
                    _ = time::sleep(self.recovery) => {}
                    _ = ctx.cancelled() => return Err(TaskError::Canceled),
                }

                // Recovery is unconditional: one fixed hold, then back up.
                link = LinkState::Up;
                self.store.set_link_up(true);
                self.bus
                    .publish(Event::new(EventKind::LinkRestored).with_task(self.name.clone()));
            }

            if link == LinkState::Up {
                let snapshot = self.store.snapshot();
                self.bus.publish(
                    Event::new(EventKind::DataSent)
                        .with_task(self.name.clone())
                        .with_snapshot(snapshot),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::state::Reading;

    struct AlwaysFail;

    impl LinkProbe for AlwaysFail {
        fn trial_fails(&mut self) -> bool {
            true
        }
    }

    struct NeverFail;

    impl LinkProbe for NeverFail {
        fn trial_fails(&mut self) -> bool {
            false
        }
    }

    fn spawn_uplink(
        probe: impl LinkProbe,
        recovery: Duration,
        store: Arc<StateStore>,
        bus: Bus,
    ) -> (CancellationToken, tokio::task::JoinHandle<Result<(), TaskError>>) {
        let task = UplinkTask::new(
            "uplink",
            Duration::from_millis(5),
            recovery,
            probe,
            store,
            bus,
        );
        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let token = token.clone();
            async move { task.run(token).await }
        });
        (token, handle)
    }

    #[test]
    fn random_probe_clamps_probability() {
        let mut never = RandomProbe::new(-1.0);
        let mut always = RandomProbe::new(2.0);
        for _ in 0..50 {
            assert!(!never.trial_fails());
            assert!(always.trial_fails());
        }
    }

    #[tokio::test]
    async fn forced_failure_cycles_exactly_once_per_tick() {
        let store = Arc::new(StateStore::new());
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let (token, handle) =
            spawn_uplink(AlwaysFail, Duration::from_millis(2), Arc::clone(&store), bus);

        // Two full ticks: each must be Lost -> Restored -> DataSent, in order.
        for _ in 0..2 {
            assert_eq!(rx.recv().await.unwrap().kind, EventKind::LinkLost);
            assert_eq!(rx.recv().await.unwrap().kind, EventKind::LinkRestored);
            assert_eq!(rx.recv().await.unwrap().kind, EventKind::DataSent);
        }

        token.cancel();
        assert!(matches!(handle.await.unwrap(), Err(TaskError::Canceled)));
    }

    #[tokio::test]
    async fn link_state_is_mirrored_into_the_store_during_the_hold() {
        let store = Arc::new(StateStore::new());
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let (token, handle) = spawn_uplink(
            AlwaysFail,
            Duration::from_millis(200),
            Arc::clone(&store),
            bus,
        );

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::LinkLost);
        assert!(!store.snapshot().link_up, "hold in progress, link must be down");

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::LinkRestored);
        assert!(store.snapshot().link_up);

        token.cancel();
        let _ = handle.await.unwrap();
    }

    #[tokio::test]
    async fn stable_link_sends_the_latest_snapshot_every_tick() {
        let store = Arc::new(StateStore::new());
        store.record(Reading::Gas(275));
        store.record(Reading::Presence(true));

        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let (token, handle) = spawn_uplink(
            NeverFail,
            Duration::from_millis(2),
            Arc::clone(&store),
            bus,
        );

        for _ in 0..3 {
            let ev = rx.recv().await.unwrap();
            assert_eq!(ev.kind, EventKind::DataSent, "no link events expected");
            let sent = ev.snapshot.unwrap();
            assert_eq!(sent.gas_ppm, 275);
            assert!(sent.presence);
            assert!(sent.link_up);
        }

        token.cancel();
        let _ = handle.await.unwrap();
    }

    #[tokio::test]
    async fn lost_event_carries_the_recovery_delay() {
        let store = Arc::new(StateStore::new());
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let (token, handle) = spawn_uplink(
            AlwaysFail,
            Duration::from_millis(150),
            Arc::clone(&store),
            bus,
        );

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::LinkLost);
        assert_eq!(ev.delay_ms, Some(150));

        token.cancel();
        let _ = handle.await.unwrap();
    }
}
