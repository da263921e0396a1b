//! Restart and backoff policies.
//!
//! The knobs that control **if/when** a failed task is restarted and **how
//! long** to wait between attempts.
//!
//! ## Contents
//! - [`RestartPolicy`] when to restart a task (never / on-failure / always)
//! - [`BackoffPolicy`] how restart delays evolve (first / factor / max)
//! - [`Jitter`] randomization to avoid synchronized retries
//!
//! ## Defaults
//! - `RestartPolicy::OnFailure` (what the node's periodic tasks use).
//! - `BackoffPolicy::default()` is first=100ms, factor=1.0 (constant),
//!   max=30s, no jitter.

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::Jitter;
pub use restart::RestartPolicy;
