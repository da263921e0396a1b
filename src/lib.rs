//! # envnode
//!
//! **envnode** is a concurrent simulation of an embedded environmental
//! sensor node. Independent periodic tasks generate synthetic readings, an
//! alarm task evaluates a threshold rule over consistent snapshots, and an
//! uplink task forwards the latest reading while modeling transient link
//! loss with automatic recovery. There is no real hardware and no real
//! network: the interesting part is the concurrency discipline.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐  ┌───────────────────┐  ┌──────────────┐ ┌─────────────┐
//!     │ SensorTask   │  │ SensorTask        │  │ AlarmTask    │ │ UplinkTask  │
//!     │ (gas, 2s)    │  │ (presence, 3s)    │  │ (rule, 5s)   │ │ (send, 2s)  │
//!     └──────┬───────┘  └─────────┬─────────┘  └──────┬───────┘ └──────┬──────┘
//!            │ record()           │ record()          │ snapshot()     │ snapshot()
//!            ▼                    ▼                   ▼                ▼ set_link_up()
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  StateStore (Mutex<NodeState>)                                            │
//! │  - gas_ppm / presence / link_up                                           │
//! │  - every access under one binary lock; snapshots in one acquisition       │
//! └───────────────────────────────────────────────────────────────────────────┘
//!
//!     all four tasks ── publish(Event) ──► Bus (broadcast)
//!                                           │
//!                                  Supervisor listener
//!                                  ├─► AliveTracker (stuck-task reporting)
//!                                  └─► SubscriberSet ─► ConsoleLog, custom ...
//! ```
//!
//! ## Lifecycle
//! ```text
//! Config ──► tasks + TaskSpec ──► Supervisor::run()
//!
//! per task actor:
//!   loop {
//!     ├─► publish TaskStarting{ attempt }
//!     ├─► task.run(token)       (the periodic loop; runs until shutdown)
//!     │     ├─ Ok / Canceled ──► publish TaskStopped, exit
//!     │     └─ Err(Fail) ──────► publish TaskFailed
//!     │                          ├─ RestartPolicy forbids ─► exit
//!     │                          └─ else publish RestartScheduled,
//!     │                               sleep(backoff), continue
//!   }
//!
//! shutdown: OS signal ─► cancel token ─► tasks exit at next check
//!           ─► joined within grace ─► AllStoppedWithin (exit 0)
//!           ─► otherwise ─► GraceExceeded { stuck } (exit 1)
//! ```
//!
//! ## Concurrency rules
//! - The store's lock is the only synchronization point between tasks; no
//!   task holds it across a suspension point.
//! - Readers may observe stale state, never torn state.
//! - Link recovery is one fixed hold and always succeeds; it is a modeled
//!   state transition, not an error.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use envnode::{
//!     Config, ConsoleLog, RandomProbe, SensorTask, StateStore, Subscribe, Supervisor,
//!     TaskSpec, UniformSource, UplinkTask,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleLog)];
//!     let sup = Supervisor::new(&cfg.runtime, subs);
//!
//!     let store = Arc::new(StateStore::new());
//!     let mut specs = Vec::new();
//!     for sensor in &cfg.sensors {
//!         let task = SensorTask::new(
//!             sensor.name().to_string(),
//!             sensor.period(),
//!             UniformSource::new(sensor.channel, sensor.max_ppm),
//!             Arc::clone(&store),
//!             sup.bus().clone(),
//!         );
//!         specs.push(TaskSpec::supervised(Arc::new(task)));
//!     }
//!     let uplink = UplinkTask::new(
//!         "uplink",
//!         cfg.uplink.period(),
//!         cfg.uplink.recovery(),
//!         RandomProbe::new(cfg.uplink.failure_probability),
//!         Arc::clone(&store),
//!         sup.bus().clone(),
//!     );
//!     specs.push(TaskSpec::supervised(Arc::new(uplink)));
//!
//!     sup.run(specs).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod node;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::{AlarmConfig, Config, RuntimeConfig, SensorConfig, UplinkConfig};
pub use crate::core::Supervisor;
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use node::{
    AlarmRule, AlarmTask, LinkProbe, LinkState, NodeState, RandomProbe, Reading, SensorChannel,
    SensorTask, SignalSource, Snapshot, StateStore, UniformSource, UplinkTask,
};
pub use policies::{BackoffPolicy, Jitter, RestartPolicy};
pub use subscribers::{ConsoleLog, Subscribe, SubscriberSet};
pub use tasks::{Task, TaskFn, TaskRef, TaskSpec};
