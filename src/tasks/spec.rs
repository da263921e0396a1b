//! Task specification for supervised execution.
//!
//! [`TaskSpec`] bundles a task with the policies that govern its supervision:
//! when to restart ([`RestartPolicy`]) and how long to wait between attempts
//! ([`BackoffPolicy`]). The spec is passed to
//! [`Supervisor::run`](crate::Supervisor::run).

use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::tasks::task::{Task, TaskRef};

/// Specification for running a task under supervision.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use envnode::{TaskSpec, TaskFn, RestartPolicy, BackoffPolicy, TaskRef, TaskError};
///
/// let demo: TaskRef = TaskFn::arc("demo", |_ctx: CancellationToken| async move {
///     Ok::<(), TaskError>(())
/// });
///
/// let spec = TaskSpec::new(demo.clone(), RestartPolicy::Never, BackoffPolicy::default());
/// assert_eq!(spec.name(), "demo");
///
/// // The node's periodic tasks use the supervised default (restart on failure):
/// let spec2 = TaskSpec::supervised(demo);
/// assert!(matches!(spec2.restart(), RestartPolicy::OnFailure));
/// ```
#[derive(Clone)]
pub struct TaskSpec {
    task: TaskRef,
    restart: RestartPolicy,
    backoff: BackoffPolicy,
}

impl TaskSpec {
    /// Creates a new task specification with explicit policies.
    pub fn new(task: TaskRef, restart: RestartPolicy, backoff: BackoffPolicy) -> Self {
        Self {
            task,
            restart,
            backoff,
        }
    }

    /// Creates a specification with the defensive defaults used for the
    /// node's periodic tasks: restart on failure with default backoff.
    pub fn supervised(task: TaskRef) -> Self {
        Self::new(task, RestartPolicy::OnFailure, BackoffPolicy::default())
    }

    /// Returns a reference to the task.
    pub fn task(&self) -> &TaskRef {
        &self.task
    }

    /// Convenience: returns the task name.
    pub fn name(&self) -> &str {
        self.task.name()
    }

    /// Returns the restart policy.
    pub fn restart(&self) -> RestartPolicy {
        self.restart
    }

    /// Returns the backoff policy.
    pub fn backoff(&self) -> BackoffPolicy {
        self.backoff
    }

    /// Returns a new spec with an updated restart policy.
    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    /// Returns a new spec with an updated backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }
}
