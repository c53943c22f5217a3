use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use usched::config::{Config, QUANTUM_ENV_VAR};
use usched::input;
use usched::launcher;
use usched::scheduler::Dispatcher;
use usched::shutdown;

#[derive(Parser, Debug)]
#[command(name = "usched")]
#[command(version)]
#[command(about = "A userspace round-robin process scheduler")]
struct Args {
    /// Quantum length in milliseconds (falls back to USPS_QUANTUM_MSEC)
    #[arg(short, long, value_name = "MS")]
    quantum: Option<u64>,

    /// Commands file, one job per line; reads stdin when omitted
    file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let env_quantum = std::env::var(QUANTUM_ENV_VAR).ok();
    let config = Config::resolve(args.quantum, env_quantum.as_deref(), args.file)?;

    let specs = input::read_input(&config.input).await?;
    if specs.is_empty() {
        tracing::info!("no jobs to schedule");
        return Ok(());
    }

    let shutdown = shutdown::install_shutdown_handler()?;
    let jobs = launcher::launch_all(&specs)?;
    tracing::info!(
        jobs = jobs.len(),
        quantum_ms = config.quantum.as_millis() as u64,
        "starting dispatch"
    );

    let dispatcher = Dispatcher::new(config.quantum, shutdown)?;
    let summary = dispatcher.run(jobs).await?;

    let failed = summary.retired.iter().filter(|j| !j.exit.success()).count();
    tracing::info!(
        jobs = summary.retired.len(),
        cycles = summary.cycles,
        failed,
        "all jobs completed"
    );
    Ok(())
}
