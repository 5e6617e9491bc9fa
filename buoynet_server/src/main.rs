//! buoynet simulation service CLI
//!
//! Runs the tick loop against a durable (or in-memory) fleet store, fans
//! updates out to observers and accepts thruster commands on stdin.

use anyhow::{Context, Result};
use buoynet_core::{Axis, EngineConfig, SimSettings, SimulationEngine};
use buoynet_env::{RuntimeContext, SensorStore, TokioContext};
use buoynet_server::control::{ControlError, ControlInterface, ThrusterCommand};
use buoynet_server::{bootstrap, ChannelBroadcast, MemoryStore, SledStore, TickScheduler};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Underwater sensor fleet simulation service
#[derive(Parser, Debug)]
#[command(name = "buoynet-server")]
#[command(about = "Simulate a fleet of drifting underwater sensor buoys", long_about = None)]
struct Args {
    /// Path of the sled database holding the fleet
    #[arg(long, default_value = "buoynet.db")]
    db: PathBuf,

    /// Keep the fleet in memory instead of on disk
    #[arg(long)]
    memory: bool,

    /// Master seed for placement and drift (0 = seed from entropy)
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Override the TICK_INTERVAL environment setting, in milliseconds
    #[arg(long)]
    tick_interval: Option<u64>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    let mut settings = SimSettings::from_env().context("reading settings from environment")?;
    if let Some(interval) = args.tick_interval {
        settings.tick_interval_ms = interval;
    }

    info!("buoynet server v0.1.0");
    info!(
        "Safe area {}mm, tick every {}ms",
        settings.safe_area_size, settings.tick_interval_ms
    );

    if args.memory {
        info!("Using in-memory store (fleet is lost on exit)");
        run_service(Arc::new(MemoryStore::new()), settings, args.seed).await
    } else {
        let store = SledStore::open(&args.db)
            .with_context(|| format!("opening fleet store at {}", args.db.display()))?;
        info!("Using sled store at {}", args.db.display());
        run_service(Arc::new(store), settings, args.seed).await
    }
}

async fn run_service<S: SensorStore>(store: Arc<S>, settings: SimSettings, seed: u64) -> Result<()> {
    // Placement and drift get independent seed streams, so replaying a run
    // with a different roster does not perturb the drift sequence.
    let (mut placement_rng, engine) = if seed == 0 {
        (
            ChaCha8Rng::from_entropy(),
            SimulationEngine::from_entropy(EngineConfig::default()),
        )
    } else {
        let drift_seed = seed.wrapping_mul(0x9e3779b97f4a7c15);
        (
            ChaCha8Rng::seed_from_u64(seed),
            SimulationEngine::new(EngineConfig::default(), drift_seed),
        )
    };

    let fleet = bootstrap::ensure_fleet(store.as_ref(), &settings, &mut placement_rng)
        .await
        .context("seeding the fleet store")?;
    for sensor in &fleet {
        debug!(
            "  {} at [{:.0}, {:.0}, {:.0}]{}",
            sensor.name,
            sensor.position.x,
            sensor.position.y,
            sensor.position.z,
            if sensor.lost { " (lost)" } else { "" }
        );
    }

    let ctx = TokioContext::shared();
    let broadcaster = Arc::new(ChannelBroadcast::new(32));
    spawn_update_logger(&ctx, &broadcaster);

    let control = ControlInterface::new(store.clone());
    ctx.spawn("control-console", control_console(control));

    let scheduler = TickScheduler::new(
        ctx.clone(),
        store,
        broadcaster,
        engine,
        settings,
    );
    let handle = scheduler.start();

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutting down, letting the in-flight tick finish");

    let stats = handle.stop().await;
    info!(
        "Final stats: {} ticks, {} lost sensors, {} store failures, {} dropped broadcasts",
        stats.ticks, stats.sensors_lost, stats.store_failures, stats.broadcast_failures
    );
    Ok(())
}

/// Subscribes a debug observer that traces every published update.
fn spawn_update_logger(ctx: &Arc<TokioContext>, broadcaster: &Arc<ChannelBroadcast>) {
    let mut rx = broadcaster.subscribe();
    ctx.spawn("update-logger", async move {
        loop {
            match rx.recv().await {
                Ok(update) => {
                    let lost = update.sensors.iter().filter(|s| s.sensor.lost).count();
                    debug!(
                        "{} tick={} sensors={} lost={}",
                        update.event,
                        update.tick,
                        update.sensors.len(),
                        lost
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("Update logger lagged, missed {} updates", missed);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Line-oriented control surface on stdin, standing in for the external
/// command transport: `thruster <name> <axis> <value>`.
async fn control_console<S: SensorStore>(control: ControlInterface<S>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Control console ready: thruster <name> <x|y|z> <value>");

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Ok((name, command)) => match control.set_thruster_speed(&name, command).await {
                Ok(sensor) => info!(
                    "{} thrusters now [{}, {}, {}]",
                    sensor.name,
                    sensor.thruster_speed.x,
                    sensor.thruster_speed.y,
                    sensor.thruster_speed.z
                ),
                Err(e @ ControlError::NotFound(_)) => warn!("{}", e),
                Err(e @ ControlError::Validation(_)) => warn!("{}", e),
                Err(ControlError::Store(e)) => warn!("Command not applied: {}", e),
            },
            Err(reason) => warn!("Unrecognized command ({reason}), expected: thruster <name> <x|y|z> <value>"),
        }
    }
}

fn parse_command(line: &str) -> Result<(String, ThrusterCommand), String> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("thruster"), Some(name), Some(axis), Some(value), None) => {
            let axis: Axis = axis.parse()?;
            let value: f64 = value
                .parse()
                .map_err(|_| format!("not a number: {value}"))?;
            Ok((name.to_string(), ThrusterCommand::axis(axis, value)))
        }
        _ => Err("wrong shape".to_string()),
    }
}
