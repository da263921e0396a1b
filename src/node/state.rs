//! Shared node state behind a single binary lock.
//!
//! [`StateStore`] is the only shared mutable resource in the simulation. It
//! encapsulates [`NodeState`] together with the mutex guarding it, so the
//! locking discipline lives in one place instead of at every call site:
//!
//! - every read or write of any field happens under the lock;
//! - [`StateStore::snapshot`] reads **all** fields under one acquisition, so
//!   observers never see a mix of pre- and post-write values;
//! - guards never survive past the method that took them, which keeps every
//!   critical section short and free of suspension points (the `std` guard is
//!   not `Send`, so holding it across an `.await` would not compile).
//!
//! Tasks receive an `Arc<StateStore>` at construction; there are no
//! process-wide globals.
//!
//! ## Wiring
//! ```text
//!   SensorTask(gas) ──── record(Reading::Gas) ─────┐
//!   SensorTask(presence) ─ record(Reading::Presence)┤
//!   UplinkTask ────────── set_link_up(bool) ────────┼──► Mutex<NodeState>
//!   AlarmTask ─────────── snapshot() ◄──────────────┤
//!   UplinkTask ────────── snapshot() ◄──────────────┘
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

/// One committed sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Gas concentration in ppm.
    Gas(u32),
    /// Presence detector output.
    Presence(bool),
}

/// The mutable record shared by all tasks.
///
/// Created once at startup with default values and mutated for the life of
/// the process. `link_up` starts `true`: the node boots with an established
/// connection and only the uplink task ever flips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeState {
    /// Latest gas concentration in ppm.
    pub gas_ppm: u32,
    /// Latest presence detector output.
    pub presence: bool,
    /// Uplink connectivity as last mirrored by the uplink task.
    pub link_up: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            gas_ppm: 0,
            presence: false,
            link_up: true,
        }
    }
}

/// A consistent read of all fields taken under a single lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Gas concentration at snapshot time.
    pub gas_ppm: u32,
    /// Presence at snapshot time.
    pub presence: bool,
    /// Link state at snapshot time.
    pub link_up: bool,
}

/// Mutex-guarded owner of [`NodeState`].
///
/// All access, read or write, is serialized through the one internal lock.
/// No finer-grained locking is used: contention is low and every critical
/// section is a handful of plain assignments.
#[derive(Debug, Default)]
pub struct StateStore {
    inner: Mutex<NodeState>,
}

impl StateStore {
    /// Creates a store with default state (`gas_ppm=0`, `presence=false`,
    /// `link_up=true`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits one reading into the matching field.
    pub fn record(&self, reading: Reading) {
        let mut state = self.lock();
        match reading {
            Reading::Gas(ppm) => state.gas_ppm = ppm,
            Reading::Presence(present) => state.presence = present,
        }
    }

    /// Mirrors the uplink's connectivity into the shared record.
    ///
    /// Only the uplink task calls this.
    pub fn set_link_up(&self, up: bool) {
        self.lock().link_up = up;
    }

    /// Returns a consistent snapshot of all fields.
    ///
    /// Reading twice with no intervening write yields identical snapshots.
    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            gas_ppm: state.gas_ppm,
            presence: state.presence,
            link_up: state.link_up,
        }
    }

    /// Acquires the lock, recovering the data from a poisoned mutex.
    ///
    /// Nothing panics while holding this lock, but a poisoned guard would
    /// otherwise wedge every task at once.
    fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
