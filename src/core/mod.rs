//! Runtime core: orchestration and lifecycle.
//!
//! The only public API from this module is [`Supervisor`], which orchestrates
//! task execution, lifecycle management, and graceful shutdown.
//!
//! Internal modules:
//! - [`actor`]: runs a single task with restart policy and backoff;
//! - [`alive`]: tracks which tasks are alive for stuck-task reporting;
//! - [`shutdown`]: cross-platform shutdown signal handling;
//! - [`supervisor`]: spawns actors, fans out events, drives shutdown.

mod actor;
mod alive;
mod shutdown;
mod supervisor;

pub use supervisor::Supervisor;
