//! TaskActor: single-task supervisor.
//!
//! Supervises execution of one [`Task`](crate::tasks::Task):
//! - restarts per [`RestartPolicy`],
//! - delays per [`BackoffPolicy`],
//! - cooperative cancellation via [`CancellationToken`].
//!
//! ## Event flow
//! For each attempt, the actor publishes:
//! ```text
//! TaskStarting → [task execution] → TaskStopped (success or graceful cancel)
//!                                 → TaskFailed  (error)
//!
//! If retry scheduled:
//!   → RestartScheduled → [sleep] → (next attempt)
//! ```
//!
//! ## Rules
//! - Attempts run sequentially within one actor, never in parallel.
//! - The attempt counter increments on each start and never resets.
//! - The consecutive-failure counter driving backoff resets on success.
//! - Cancellation is honored at safe points: before each attempt and during
//!   the backoff sleep.

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{Task, TaskSpec};

/// Supervises execution of a single task with restarts and event publishing.
pub(crate) struct TaskActor {
    bus: Bus,
    spec: TaskSpec,
}

impl TaskActor {
    /// Creates a new task actor.
    pub(crate) fn new(bus: Bus, spec: TaskSpec) -> Self {
        Self { bus, spec }
    }

    /// Runs the actor until completion, restart exhaustion, or cancellation.
    pub(crate) async fn run(self, token: CancellationToken) {
        let name = self.spec.name().to_string();
        let mut attempt: u64 = 0;
        let mut failures: u32 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }

            attempt += 1;
            self.bus.publish(
                Event::new(EventKind::TaskStarting)
                    .with_task(name.clone())
                    .with_attempt(attempt),
            );

            match self.spec.task().run(token.clone()).await {
                Ok(()) | Err(TaskError::Canceled) => {
                    failures = 0;
                    self.bus.publish(
                        Event::new(EventKind::TaskStopped)
                            .with_task(name.clone())
                            .with_attempt(attempt),
                    );
                    if token.is_cancelled() || !self.spec.restart().restarts_after_success() {
                        break;
                    }
                }
                Err(e) => {
                    self.bus.publish(
                        Event::new(EventKind::TaskFailed)
                            .with_task(name.clone())
                            .with_attempt(attempt)
                            .with_reason(e.to_string()),
                    );

                    if !e.is_retryable() || !self.spec.restart().retries_after_failure() {
                        break;
                    }

                    let delay = self.spec.backoff().delay(failures);
                    failures = failures.saturating_add(1);

                    self.bus.publish(
                        Event::new(EventKind::RestartScheduled)
                            .with_task(name.clone())
                            .with_attempt(attempt)
                            .with_delay(delay)
                            .with_reason(e.to_string()),
                    );

                    tokio::select! {
                        _ = time::sleep(delay) => {}
                        _ = token.cancelled() => break,
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::{BackoffPolicy, Jitter, RestartPolicy};
    use crate::tasks::{TaskFn, TaskRef};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast_backoff() -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(1),
            max: Duration::from_millis(5),
            factor: 1.0,
            jitter: Jitter::None,
        }
    }

    /// Fails twice, then succeeds.
    fn flaky(attempts: Arc<AtomicU32>) -> TaskRef {
        TaskFn::arc("flaky", move |_ctx: CancellationToken| {
            let attempts = attempts.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= 2 {
                    Err(TaskError::Fail {
                        error: format!("transient #{n}"),
                    })
                } else {
                    Ok(())
                }
            }
        })
    }

    #[tokio::test]
    async fn on_failure_retries_until_success() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let attempts = Arc::new(AtomicU32::new(0));

        let spec = TaskSpec::new(
            flaky(attempts.clone()),
            RestartPolicy::OnFailure,
            fast_backoff(),
        );
        TaskActor::new(bus.clone(), spec)
            .run(CancellationToken::new())
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::TaskStarting,
                EventKind::TaskFailed,
                EventKind::RestartScheduled,
                EventKind::TaskStarting,
                EventKind::TaskFailed,
                EventKind::RestartScheduled,
                EventKind::TaskStarting,
                EventKind::TaskStopped,
            ]
        );
    }

    #[tokio::test]
    async fn never_policy_stops_after_first_failure() {
        let bus = Bus::new(64);
        let attempts = Arc::new(AtomicU32::new(0));

        let spec = TaskSpec::new(flaky(attempts.clone()), RestartPolicy::Never, fast_backoff());
        TaskActor::new(bus, spec).run(CancellationToken::new()).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fatal_error_is_never_retried() {
        let bus = Bus::new(64);
        let attempts = Arc::new(AtomicU32::new(0));

        let task: TaskRef = {
            let attempts = attempts.clone();
            TaskFn::arc("doomed", move |_ctx: CancellationToken| {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), TaskError>(TaskError::Fatal {
                        error: "bad wiring".into(),
                    })
                }
            })
        };

        let spec = TaskSpec::new(task, RestartPolicy::OnFailure, fast_backoff());
        TaskActor::new(bus, spec).run(CancellationToken::new()).await;

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancellation_during_run_is_a_graceful_stop() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let task: TaskRef = TaskFn::arc("looper", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<(), TaskError>(TaskError::Canceled)
        });

        let token = CancellationToken::new();
        let handle = tokio::spawn(
            TaskActor::new(
                bus.clone(),
                TaskSpec::new(task, RestartPolicy::Always, fast_backoff()),
            )
            .run(token.clone()),
        );

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TaskStarting);
        token.cancel();
        handle.await.unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TaskStopped);
        assert!(rx.try_recv().is_err(), "no restart after graceful cancel");
    }
}
