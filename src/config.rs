//! Node configuration.
//!
//! [`Config`] externalizes everything a firmware build would hard-code:
//! per-sensor value ranges and periods, the alarm rule and its thresholds,
//! the uplink period, failure probability and recovery delay, plus runtime
//! settings (shutdown grace, event bus capacity).
//!
//! Defaults reproduce the reference node: gas sampled every 2s in
//! `[0, 600)` ppm, presence every 3s, alarm every 5s tripping above 400 ppm
//! with presence, uplink every 2s with a 30% failure trial and a 2s recovery
//! hold.
//!
//! Configuration loads from TOML:
//!
//! ```toml
//! [runtime]
//! grace_ms = 5000
//!
//! [[sensors]]
//! channel = "gas"
//! period_ms = 2000
//! max_ppm = 600
//!
//! [[sensors]]
//! channel = "presence"
//! period_ms = 3000
//!
//! [alarm]
//! period_ms = 5000
//! gas_threshold_ppm = 400
//! require_presence = true
//!
//! [uplink]
//! period_ms = 2000
//! failure_probability = 0.3
//! recovery_ms = 2000
//! ```
//!
//! Durations are plain millisecond fields so a test harness can compress all
//! timing without special syntax.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::RuntimeError;
use crate::node::{AlarmRule, SensorChannel};

/// Full node configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Runtime settings (shutdown, event bus).
    pub runtime: RuntimeConfig,
    /// One entry per sensor producer.
    pub sensors: Vec<SensorConfig>,
    /// Alarm evaluation settings.
    pub alarm: AlarmConfig,
    /// Uplink reporter settings.
    pub uplink: UplinkConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            sensors: vec![
                SensorConfig {
                    channel: SensorChannel::Gas,
                    name: None,
                    period_ms: 2000,
                    max_ppm: 600,
                },
                SensorConfig {
                    channel: SensorChannel::Presence,
                    name: None,
                    period_ms: 3000,
                    max_ppm: default_max_ppm(),
                },
            ],
            alarm: AlarmConfig::default(),
            uplink: UplinkConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, RuntimeError> {
        let raw = std::fs::read_to_string(path).map_err(|e| RuntimeError::Config {
            message: format!("read {}: {e}", path.display()),
        })?;
        Self::from_toml(&raw)
    }

    /// Parses and validates configuration from a TOML string.
    pub fn from_toml(raw: &str) -> Result<Self, RuntimeError> {
        let cfg: Config = toml::from_str(raw).map_err(|e| RuntimeError::Config {
            message: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks cross-field invariants.
    ///
    /// Rejects empty sensor lists, zero periods, duplicate task names,
    /// out-of-range failure probabilities and a zero-capacity bus.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        fn fail(message: impl Into<String>) -> Result<(), RuntimeError> {
            Err(RuntimeError::Config {
                message: message.into(),
            })
        }

        if self.sensors.is_empty() {
            return fail("at least one sensor is required");
        }
        if self.runtime.bus_capacity == 0 {
            return fail("runtime.bus_capacity must be at least 1");
        }

        let mut names: HashSet<&str> = ["alarm", "uplink"].into_iter().collect();
        for sensor in &self.sensors {
            if sensor.period_ms == 0 {
                return fail(format!("sensor {}: period_ms must be > 0", sensor.name()));
            }
            if sensor.channel == SensorChannel::Gas && sensor.max_ppm == 0 {
                return fail(format!("sensor {}: max_ppm must be > 0", sensor.name()));
            }
            if !names.insert(sensor.name()) {
                return fail(format!("duplicate task name: {}", sensor.name()));
            }
        }

        if self.alarm.period_ms == 0 {
            return fail("alarm.period_ms must be > 0");
        }
        if self.uplink.period_ms == 0 {
            return fail("uplink.period_ms must be > 0");
        }
        let p = self.uplink.failure_probability;
        if !p.is_finite() || !(0.0..=1.0).contains(&p) {
            return fail("uplink.failure_probability must be within [0, 1]");
        }

        Ok(())
    }
}

/// Runtime settings shared by the supervisor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Maximum wait for tasks to stop after a shutdown signal, in ms.
    pub grace_ms: u64,
    /// Capacity of the event bus ring buffer.
    pub bus_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            grace_ms: 5000,
            bus_capacity: 1024,
        }
    }
}

impl RuntimeConfig {
    /// Shutdown grace as a duration.
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

/// One sensor producer.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SensorConfig {
    /// Which state field this sensor feeds.
    pub channel: SensorChannel,
    /// Task name override; defaults to `sensor:<channel>`.
    #[serde(default)]
    pub name: Option<String>,
    /// Sampling period in ms.
    #[serde(default = "default_sensor_period_ms")]
    pub period_ms: u64,
    /// Exclusive upper bound for gas readings (ignored for presence).
    #[serde(default = "default_max_ppm")]
    pub max_ppm: u32,
}

impl SensorConfig {
    /// Effective task name.
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.channel.task_name())
    }

    /// Sampling period as a duration.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

fn default_sensor_period_ms() -> u64 {
    2000
}

fn default_max_ppm() -> u32 {
    600
}

/// Alarm evaluation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlarmConfig {
    /// Evaluation period in ms.
    pub period_ms: u64,
    /// Gas concentration strictly above this trips the alarm.
    pub gas_threshold_ppm: u32,
    /// Whether the alarm additionally requires presence.
    pub require_presence: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            period_ms: 5000,
            gas_threshold_ppm: 400,
            require_presence: true,
        }
    }
}

impl AlarmConfig {
    /// Evaluation period as a duration.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// The rule the alarm task evaluates.
    pub fn rule(&self) -> AlarmRule {
        AlarmRule {
            gas_threshold_ppm: self.gas_threshold_ppm,
            require_presence: self.require_presence,
        }
    }
}

/// Uplink reporter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UplinkConfig {
    /// Send period in ms.
    pub period_ms: u64,
    /// Probability that one tick's trial drops the link, in [0, 1].
    pub failure_probability: f64,
    /// Fixed recovery hold in ms.
    pub recovery_ms: u64,
}

impl Default for UplinkConfig {
    fn default() -> Self {
        Self {
            period_ms: 2000,
            failure_probability: 0.3,
            recovery_ms: 2000,
        }
    }
}

impl UplinkConfig {
    /// Send period as a duration.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Recovery hold as a duration.
    pub fn recovery(&self) -> Duration {
        Duration::from_millis(self.recovery_ms)
    }
}
