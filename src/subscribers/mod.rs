//! Event subscribers for the node runtime.
//!
//! Events published on the [`Bus`](crate::events::Bus) are fanned out by the
//! supervisor to a [`SubscriberSet`]; each [`Subscribe`] implementation gets
//! its own bounded queue and worker task.
//!
//! ```text
//!   tasks ── publish(Event) ──► Bus ──► Supervisor listener ──► SubscriberSet
//!                                                                │
//!                                                        ┌───────┴───────┐
//!                                                        ▼               ▼
//!                                                    ConsoleLog      custom ...
//! ```

mod console;
mod set;
mod subscriber;

pub use console::ConsoleLog;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
