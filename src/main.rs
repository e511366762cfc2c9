use clap::Parser;
use std::path::PathBuf;
use tick_jitter::{JitterConfig, LoopReport, SimulatedLoop};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tick-jitter", version, about = "Runs simulated game loops and reports their tick jitter")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of frames each loop runs
    #[arg(short, long)]
    frames: Option<u64>,

    /// Write the default configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    write_default_config: Option<PathBuf>,
}

fn init_tracing(fallback_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(path) = args.write_default_config {
        JitterConfig::default().save_to_file(&path)?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => JitterConfig::load_from_file(path)?,
        None => JitterConfig::default(),
    };
    if let Some(frames) = args.frames {
        config.frames = frames;
    }
    config.validate()?;

    init_tracing(&config.log_filter);
    info!("Starting {} v{}", tick_jitter::NAME, tick_jitter::VERSION);

    game_tick::sync_global_tick();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut handles = Vec::with_capacity(config.loops.len());
    for loop_config in config.loops.iter().cloned() {
        info!(
            "Starting loop {} at {}ms per frame",
            loop_config.name, loop_config.frame_interval_ms
        );
        let sim = SimulatedLoop::new(loop_config);
        let rx = shutdown_rx.clone();
        let frames = config.frames;
        let report_every = config.report_every;
        handles.push(tokio::spawn(async move { sim.run(frames, report_every, rx).await }));
    }

    let ctrl_c = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping loops...");
                let _ = shutdown_tx.send(true);
            }
            Err(err) => {
                // Dropping the sender would wake every loop, so hold it.
                warn!("Unable to listen for interrupts: {}", err);
                std::future::pending::<()>().await;
            }
        }
    });

    let mut reports: Vec<LoopReport> = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(err) => warn!("Loop task failed: {}", err),
        }
    }
    ctrl_c.abort();

    info!("=== Tick Jitter Summary ===");
    for report in &reports {
        info!("{} ({} of {} frames)", report.summary, report.frames, config.frames);
    }

    Ok(())
}
