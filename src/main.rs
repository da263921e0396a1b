//! envnode binary: wires config, tasks and supervisor together.
//!
//! Exit codes: 0 after a clean shutdown (signal received, all tasks stopped
//! within grace), 1 on startup failure or when tasks overran the grace
//! period.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use envnode::{
    AlarmTask, Config, ConsoleLog, RandomProbe, SensorTask, StateStore, Subscribe, Supervisor,
    TaskSpec, UniformSource, UplinkTask,
};

/// Simulated environmental sensor node.
#[derive(Debug, Parser)]
#[command(name = "envnode", version, about)]
struct Cli {
    /// Path to a TOML configuration file (defaults built in).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = match load_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(ConsoleLog)];
    let supervisor = Supervisor::new(&cfg.runtime, subscribers);
    let store = Arc::new(StateStore::new());
    let specs = build_specs(&cfg, &store, &supervisor);

    info!(
        sensors = cfg.sensors.len(),
        failure_probability = cfg.uplink.failure_probability,
        "node starting"
    );

    match supervisor.run(specs).await {
        Ok(()) => {
            info!("node stopped gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "node stopped with error");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config, envnode::RuntimeError> {
    match &cli.config {
        Some(path) => Config::from_path(path),
        None => {
            let cfg = Config::default();
            cfg.validate()?;
            Ok(cfg)
        }
    }
}

fn build_specs(cfg: &Config, store: &Arc<StateStore>, supervisor: &Supervisor) -> Vec<TaskSpec> {
    let bus = supervisor.bus().clone();
    let mut specs = Vec::with_capacity(cfg.sensors.len() + 2);

    for sensor in &cfg.sensors {
        let task = SensorTask::new(
            sensor.name().to_string(),
            sensor.period(),
            UniformSource::new(sensor.channel, sensor.max_ppm),
            Arc::clone(store),
            bus.clone(),
        );
        specs.push(TaskSpec::supervised(Arc::new(task)));
    }

    let alarm = AlarmTask::new(
        "alarm",
        cfg.alarm.period(),
        cfg.alarm.rule(),
        Arc::clone(store),
        bus.clone(),
    );
    specs.push(TaskSpec::supervised(Arc::new(alarm)));

    let uplink = UplinkTask::new(
        "uplink",
        cfg.uplink.period(),
        cfg.uplink.recovery(),
        RandomProbe::new(cfg.uplink.failure_probability),
        Arc::clone(store),
        bus,
    );
    specs.push(TaskSpec::supervised(Arc::new(uplink)));

    specs
}
