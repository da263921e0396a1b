//! The simulated sensor node: shared state and the three periodic task kinds.
//!
//! ## Contents
//! - [`StateStore`], [`NodeState`], [`Snapshot`], [`Reading`] the single
//!   mutex-guarded shared resource and its value types
//! - [`SensorTask`] periodic producers feeding the store
//! - [`AlarmTask`] snapshot-based threshold evaluation
//! - [`UplinkTask`] lossy link simulation and forwarding
//!
//! All three task kinds implement [`Task`](crate::tasks::Task) and run under
//! the supervisor like any other task. They share exactly one resource, the
//! store, and meet only at its lock.

mod alarm;
mod sensor;
mod state;
mod uplink;

pub use alarm::{AlarmRule, AlarmTask};
pub use sensor::{SensorChannel, SensorTask, SignalSource, UniformSource};
pub use state::{NodeState, Reading, Snapshot, StateStore};
pub use uplink::{LinkProbe, LinkState, RandomProbe, UplinkTask};
