//! Periodic sensor producers.
//!
//! A [`SensorTask`] owns one [`SignalSource`] and, on a fixed period, draws a
//! synthetic reading, commits it to the [`StateStore`] under the lock, and
//! publishes a [`ReadingProduced`](crate::EventKind::ReadingProduced) event
//! carrying exactly the committed value. The event is built from the local
//! value, never re-read from the store, so the observable stream can never
//! disagree with what was committed.
//!
//! Sensors do not coordinate with each other; they interleave freely and only
//! meet at the store's lock.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::node::state::{Reading, StateStore};
use crate::tasks::Task;

/// Which field of the shared state a sensor feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorChannel {
    /// Gas concentration, uniform integer ppm.
    Gas,
    /// Presence detector, fair boolean.
    Presence,
}

impl SensorChannel {
    /// Default task name for this channel.
    pub fn task_name(&self) -> &'static str {
        match self {
            SensorChannel::Gas => "sensor:gas",
            SensorChannel::Presence => "sensor:presence",
        }
    }
}

/// Source of synthetic readings.
///
/// The seam exists so tests can script exact values; production code uses
/// [`UniformSource`].
pub trait SignalSource: Send + 'static {
    /// Draws the next reading.
    fn next_reading(&mut self) -> Reading;
}

/// Pseudo-random source drawing uniformly over the channel's range.
///
/// Gas readings are uniform in `[0, max_ppm)`, mirroring a raw ADC scaled to
/// ppm; presence is a fair coin.
#[derive(Debug, Clone, Copy)]
pub struct UniformSource {
    channel: SensorChannel,
    max_ppm: u32,
}

impl UniformSource {
    /// Creates a source for the given channel. `max_ppm` applies to gas only.
    pub fn new(channel: SensorChannel, max_ppm: u32) -> Self {
        Self { channel, max_ppm }
    }
}

impl SignalSource for UniformSource {
    fn next_reading(&mut self) -> Reading {
        let mut rng = rand::rng();
        match self.channel {
            SensorChannel::Gas => Reading::Gas(rng.random_range(0..self.max_ppm.max(1))),
            SensorChannel::Presence => Reading::Presence(rng.random_bool(0.5)),
        }
    }
}

/// Periodic task that generates readings and publishes them into the store.
pub struct SensorTask {
    name: String,
    period: Duration,
    source: Mutex<Box<dyn SignalSource>>,
    store: Arc<StateStore>,
    bus: Bus,
}

impl SensorTask {
    /// Creates a sensor task.
    ///
    /// `name` must be unique across the task set; it tags every event the
    /// sensor emits.
    pub fn new(
        name: impl Into<String>,
        period: Duration,
        source: impl SignalSource,
        store: Arc<StateStore>,
        bus: Bus,
    ) -> Self {
        Self {
            name: name.into(),
            period,
            source: Mutex::new(Box::new(source)),
            store,
            bus,
        }
    }

    /// Draws one reading from the source.
    fn draw(&self) -> Reading {
        self.source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_reading()
    }
}

#[async_trait]
impl Task for SensorTask {
    fn name(&self) -> &str {
        &self.name
    }

    /// Commit-then-sleep loop: each iteration draws a reading, commits it
    /// under the store's lock, publishes the event outside the critical
    /// section, then sleeps for one period (cancellable).
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        loop {
            if ctx.is_cancelled() {
                return Err(TaskError::Canceled);
            }

            let reading = self.draw();
            self.store.record(reading);
            self.bus.publish(
                Event::new(EventKind::ReadingProduced)
                    .with_task(self.name.clone())
                    .with_reading(reading),
            );

            tokio::select! {
                _ = time::sleep(self.period) => {}
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed script of readings, then repeats the last one.
    struct ScriptedSource {
        script: Vec<Reading>,
        next: usize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Reading>) -> Self {
            Self { script, next: 0 }
        }
    }

    impl SignalSource for ScriptedSource {
        fn next_reading(&mut self) -> Reading {
            let i = self.next.min(self.script.len() - 1);
            self.next += 1;
            self.script[i]
        }
    }

    #[test]
    fn uniform_source_respects_channel_range() {
        let mut gas = UniformSource::new(SensorChannel::Gas, 600);
        for _ in 0..200 {
            match gas.next_reading() {
                Reading::Gas(ppm) => assert!(ppm < 600),
                other => panic!("gas source produced {other:?}"),
            }
        }

        let mut presence = UniformSource::new(SensorChannel::Presence, 0);
        assert!(matches!(presence.next_reading(), Reading::Presence(_)));
    }

    #[tokio::test]
    async fn published_event_carries_the_committed_value() {
        let store = Arc::new(StateStore::new());
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        let task = SensorTask::new(
            "sensor:gas",
            Duration::from_millis(5),
            ScriptedSource::new(vec![Reading::Gas(417)]),
            Arc::clone(&store),
            bus.clone(),
        );

        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let token = token.clone();
            async move { task.run(token).await }
        });

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::ReadingProduced);
        assert_eq!(ev.task.as_deref(), Some("sensor:gas"));
        assert_eq!(ev.reading, Some(Reading::Gas(417)));
        assert_eq!(store.snapshot().gas_ppm, 417);

        token.cancel();
        assert!(matches!(handle.await.unwrap(), Err(TaskError::Canceled)));
    }

    #[tokio::test]
    async fn presence_sensor_writes_its_own_field() {
        let store = Arc::new(StateStore::new());
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();

        let task = SensorTask::new(
            "sensor:presence",
            Duration::from_millis(5),
            ScriptedSource::new(vec![Reading::Presence(true)]),
            Arc::clone(&store),
            bus.clone(),
        );

        let token = CancellationToken::new();
        let handle = tokio::spawn({
            let token = token.clone();
            async move { task.run(token).await }
        });

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.reading, Some(Reading::Presence(true)));

        let snap = store.snapshot();
        assert!(snap.presence);
        assert_eq!(snap.gas_ppm, 0, "presence sensor must not touch gas_ppm");

        token.cancel();
        let _ = handle.await.unwrap();
    }
}
