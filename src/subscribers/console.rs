//! Console subscriber rendering the node's event stream.
//!
//! [`ConsoleLog`] prints one human-readable line per event, tagged by the
//! originating task:
//!
//! ```text
//! [sensor:gas] reading: 312 ppm
//! [sensor:presence] presence: yes
//! [alarm] status: gas=312 ppm presence=yes
//! [alarm] ALERT: gas=450 ppm presence=yes
//! [uplink] connection lost, reconnecting in 2000 ms
//! [uplink] reconnected
//! [uplink] sent: gas=312 ppm presence=yes
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::node::Reading;
use crate::subscribers::Subscribe;

/// Stdout subscriber for the observable event stream.
pub struct ConsoleLog;

impl ConsoleLog {
    fn task<'a>(e: &'a Event) -> &'a str {
        e.task.as_deref().unwrap_or("?")
    }

    fn yes_no(v: bool) -> &'static str {
        if v { "yes" } else { "no" }
    }
}

#[async_trait]
impl Subscribe for ConsoleLog {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ReadingProduced => match e.reading {
                Some(Reading::Gas(ppm)) => {
                    println!("[{}] reading: {ppm} ppm", Self::task(e));
                }
                Some(Reading::Presence(p)) => {
                    println!("[{}] presence: {}", Self::task(e), Self::yes_no(p));
                }
                None => {}
            },
            EventKind::RoutineStatus => {
                if let Some(s) = e.snapshot {
                    println!(
                        "[{}] status: gas={} ppm presence={}",
                        Self::task(e),
                        s.gas_ppm,
                        Self::yes_no(s.presence)
                    );
                }
            }
            EventKind::AlarmRaised => {
                if let Some(s) = e.snapshot {
                    println!(
                        "[{}] ALERT: gas={} ppm presence={}",
                        Self::task(e),
                        s.gas_ppm,
                        Self::yes_no(s.presence)
                    );
                }
            }
            EventKind::LinkLost => {
                println!(
                    "[{}] connection lost, reconnecting in {} ms",
                    Self::task(e),
                    e.delay_ms.unwrap_or(0)
                );
            }
            EventKind::LinkRestored => {
                println!("[{}] reconnected", Self::task(e));
            }
            EventKind::DataSent => {
                if let Some(s) = e.snapshot {
                    println!(
                        "[{}] sent: gas={} ppm presence={}",
                        Self::task(e),
                        s.gas_ppm,
                        Self::yes_no(s.presence)
                    );
                }
            }
            EventKind::TaskStarting => {
                println!(
                    "[starting] task={} attempt={}",
                    Self::task(e),
                    e.attempt.unwrap_or(0)
                );
            }
            EventKind::TaskStopped => {
                println!("[stopped] task={}", Self::task(e));
            }
            EventKind::TaskFailed => {
                println!(
                    "[failed] task={} err={:?} attempt={}",
                    Self::task(e),
                    e.reason,
                    e.attempt.unwrap_or(0)
                );
            }
            EventKind::RestartScheduled => {
                println!(
                    "[restart] task={} delay={} ms err={:?}",
                    Self::task(e),
                    e.delay_ms.unwrap_or(0),
                    e.reason
                );
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
