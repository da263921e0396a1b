//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the node tasks, task actors and the
//! supervisor.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `SensorTask`, `AlarmTask`, `UplinkTask`, `TaskActor`,
//!   `Supervisor`.
//! - **Consumer**: `Supervisor::subscriber_listener()`, which updates the
//!   alive tracker and fans out to the `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
