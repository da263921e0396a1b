//! Error types used by the node runtime and its tasks.
//!
//! This module defines two main error enums:
//!
//! - [`RuntimeError`]: errors raised by the runtime itself (startup and shutdown).
//! - [`TaskError`]: errors raised by individual task executions.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging,
//! plus [`TaskError::is_retryable`] used by the actor restart loop.
//!
//! Simulated link loss is **not** an error: the uplink models it as a state
//! transition and keeps running. Nothing in normal operation aborts a task loop.

use std::time::Duration;
use thiserror::Error;

/// Errors produced by the node runtime.
///
/// These represent failures of the runtime itself: an invalid configuration at
/// startup (fatal, process exits non-zero) or a shutdown sequence exceeding
/// its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or failed validation at startup.
    #[error("invalid configuration: {message}")]
    Config {
        /// What was wrong with the configuration.
        message: String,
    },

    /// Shutdown grace period was exceeded; some tasks remained stuck.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of tasks that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use envnode::RuntimeError;
    ///
    /// let err = RuntimeError::Config { message: "empty sensor list".into() };
    /// assert_eq!(err.as_label(), "runtime_config");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Config { .. } => "runtime_config",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Config { message } => format!("config: {message}"),
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
        }
    }
}

/// Errors produced by task execution.
///
/// The node's own tasks never fail in normal operation (all values are
/// synthetic and there is no real I/O), so these exist for the supervision
/// layer: a failing task is restarted or retired according to its
/// [`RestartPolicy`](crate::RestartPolicy).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Non-recoverable fatal error (should not be retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task execution failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task observed cancellation and exited cooperatively.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use envnode::TaskError;
    ///
    /// let err = TaskError::Fail { error: "boom".into() };
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "context cancelled".to_string(),
        }
    }

    /// Indicates whether the error type is safe to retry.
    ///
    /// Returns `true` for [`TaskError::Fail`], `false` otherwise.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }
}
