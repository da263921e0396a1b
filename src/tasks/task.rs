//! Task abstraction.
//!
//! [`Task`] is the seam between the node's domain code and the supervision
//! runtime: an async, cancelable unit with a stable name. The common handle
//! type is [`TaskRef`], an `Arc<dyn Task>` suitable for sharing across the
//! runtime.
//!
//! A task receives a [`CancellationToken`] and should check it at the top of
//! each loop iteration and inside every sleep to stop cooperatively during
//! shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Shared reference to a task.
pub type TaskRef = Arc<dyn Task>;

/// Asynchronous, cancelable unit.
///
/// Implementors should regularly check cancellation and exit promptly during
/// shutdown, returning [`TaskError::Canceled`] to signal a graceful exit.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use envnode::{Task, TaskError};
///
/// struct Demo;
///
/// #[async_trait]
/// impl Task for Demo {
///     fn name(&self) -> &str { "demo" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         // do work...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}
