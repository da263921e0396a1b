//! Periodic alarm evaluation over consistent snapshots.
//!
//! [`AlarmTask`] takes one [`Snapshot`](crate::node::Snapshot) per tick under
//! a single lock acquisition and evaluates an [`AlarmRule`] against it. The
//! rule either trips, producing an
//! [`AlarmRaised`](crate::EventKind::AlarmRaised) event, or does not,
//! producing a [`RoutineStatus`](crate::EventKind::RoutineStatus) event. Both
//! carry the snapshot they were derived from.
//!
//! The snapshot may be stale relative to a producer's most recent write; it
//! is never torn. Evaluation happens before the first sleep, so the task also
//! runs safely against the store's zero defaults before any producer has
//! written.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::node::state::{Snapshot, StateStore};
use crate::tasks::Task;

/// Threshold condition the alarm task evaluates each tick.
///
/// This is configuration, not a constant: thresholds come from the config
/// file and may differ per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmRule {
    /// Gas concentration strictly above this trips the rule.
    pub gas_threshold_ppm: u32,
    /// When true, the rule additionally requires presence to be detected.
    pub require_presence: bool,
}

impl AlarmRule {
    /// Evaluates the rule against one snapshot.
    pub fn triggers(&self, snapshot: &Snapshot) -> bool {
        let gas_high = snapshot.gas_ppm > self.gas_threshold_ppm;
        let presence_ok = !self.require_presence || snapshot.presence;
        gas_high && presence_ok
    }
}

/// Periodic task that classifies the current state as alarming or routine.
pub struct AlarmTask {
    name: String,
    period: Duration,
    rule: AlarmRule,
    store: Arc<StateStore>,
    bus: Bus,
}

impl AlarmTask {
    /// Creates an alarm task with the given rule and period.
    pub fn new(
        name: impl Into<String>,
        period: Duration,
        rule: AlarmRule,
        store: Arc<StateStore>,
        bus: Bus,
    ) -> Self {
        Self {
            name: name.into(),
            period,
            rule,
            store,
            bus,
        }
    }

    /// One evaluation: snapshot once, classify, publish.
    fn evaluate(&self) {
        let snapshot = self.store.snapshot();
        let kind = if self.rule.triggers(&snapshot) {
            EventKind::AlarmRaised
        } else {
            EventKind::RoutineStatus
        };
        self.bus.publish(
            Event::new(kind)
                .with_task(self.name.clone())
                .with_snapshot(snapshot),
        );
    }
}

#[async_trait]
impl Task for AlarmTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        loop {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }

            self.evaluate();

            tokio::select! {
                _ = time::sleep(self.period) => {}
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
            }
        }
    }
}
