//! Runtime events emitted by the node tasks and the supervisor.
//!
//! The [`EventKind`] enum classifies events in two categories:
//! - **Domain events**: the observable behavior of the simulated node
//!   (readings, alarm decisions, link transitions, sends)
//! - **Lifecycle events**: ambient supervision flow (task start/stop/fail,
//!   restart scheduling, shutdown progress)
//!
//! The [`Event`] struct carries metadata such as timestamps, the originating
//! task name, the committed reading or snapshot, and restart delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use envnode::{Event, EventKind, Reading};
//!
//! let ev = Event::new(EventKind::ReadingProduced)
//!     .with_task("sensor:gas")
//!     .with_reading(Reading::Gas(312));
//!
//! assert_eq!(ev.kind, EventKind::ReadingProduced);
//! assert_eq!(ev.task.as_deref(), Some("sensor:gas"));
//! assert_eq!(ev.reading, Some(Reading::Gas(312)));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::node::{Reading, Snapshot};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Domain events ===
    /// A sensor committed a new reading to the shared state.
    ///
    /// Sets:
    /// - `task`: sensor task name
    /// - `reading`: the value that was committed (exactly, not re-read)
    ReadingProduced,

    /// The alarm rule evaluated false over a snapshot.
    ///
    /// Sets:
    /// - `task`: alarm task name
    /// - `snapshot`: the snapshot the rule was evaluated against
    RoutineStatus,

    /// The alarm rule evaluated true over a snapshot.
    ///
    /// Sets:
    /// - `task`: alarm task name
    /// - `snapshot`: the snapshot the rule was evaluated against
    AlarmRaised,

    /// The uplink's failure trial hit while connected; link is now down.
    ///
    /// Sets:
    /// - `task`: uplink task name
    /// - `delay_ms`: the fixed recovery hold before reconnecting
    LinkLost,

    /// The uplink finished its recovery hold; link is up again.
    ///
    /// Sets:
    /// - `task`: uplink task name
    LinkRestored,

    /// The uplink forwarded the latest snapshot to the (simulated) server.
    ///
    /// Sets:
    /// - `task`: uplink task name
    /// - `snapshot`: the snapshot that was sent
    DataSent,

    // === Task lifecycle events ===
    /// Task is starting an attempt.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `attempt`: attempt number (1-based, per actor)
    TaskStarting,

    /// Task has stopped (finished successfully or was cancelled gracefully).
    ///
    /// Sets:
    /// - `task`: task name
    /// - `attempt`: attempt number
    TaskStopped,

    /// Task failed with a (non-fatal) error for this attempt.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `attempt`: attempt number
    /// - `reason`: failure message
    TaskFailed,

    /// A restart was scheduled after a failed attempt.
    ///
    /// Sets:
    /// - `task`: task name
    /// - `attempt`: the failed attempt number
    /// - `delay_ms`: backoff delay before the next attempt
    /// - `reason`: last failure message
    RestartScheduled,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed or token cancelled).
    ShutdownRequested,

    /// All tasks stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not stop in time.
    GraceExceeded,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the originating task, if applicable.
    pub task: Option<Arc<str>>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u64>,
    /// The committed reading (sensor events).
    pub reading: Option<Reading>,
    /// The snapshot the event was derived from (alarm and uplink events).
    pub snapshot: Option<Snapshot>,
    /// Delay in milliseconds (recovery hold or restart backoff).
    pub delay_ms: Option<u64>,
    /// Human-readable reason (failure messages).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            attempt: None,
            reading: None,
            snapshot: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u64) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a committed reading.
    #[inline]
    pub fn with_reading(mut self, reading: Reading) -> Self {
        self.reading = Some(reading);
        self
    }

    /// Attaches a state snapshot.
    #[inline]
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u64::MAX)) as u64;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_are_strictly_increasing() {
        let a = Event::new(EventKind::ReadingProduced);
        let b = Event::new(EventKind::ReadingProduced);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_only_their_field() {
        let snap = Snapshot {
            gas_ppm: 450,
            presence: true,
            link_up: true,
        };
        let ev = Event::new(EventKind::AlarmRaised)
            .with_task("alarm")
            .with_snapshot(snap);

        assert_eq!(ev.task.as_deref(), Some("alarm"));
        assert_eq!(ev.snapshot, Some(snap));
        assert!(ev.reading.is_none());
        assert!(ev.delay_ms.is_none());
        assert!(ev.reason.is_none());
    }
}
