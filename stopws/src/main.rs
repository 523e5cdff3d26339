use std::process::ExitCode;

use clap::Parser as _;
use stopws_reclaimer::{PassReport, ReclaimError, Reclaimer};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

mod cli;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    tracing::info!(
        namespace = %config.namespace,
        selector = %config.label_selector,
        "Starting stopws"
    );

    let reclaimer = Reclaimer::new(config).await?;
    let success = tokio::time::timeout(cli.timeout, run(&reclaimer, cli.command)).await??;

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Runs one command; `Ok(false)` means some pods could not be reclaimed.
async fn run(reclaimer: &Reclaimer, command: Command) -> Result<bool, ReclaimError> {
    let report = match command {
        Command::List { prune } => {
            let mode = Command::list_mode(prune);
            for pod in reclaimer.list_candidates(mode).await? {
                println!("{pod}");
            }
            return Ok(true);
        }
        Command::All { force } => reclaimer.stop_all(Command::stop_action(force)).await?,
        Command::Single { pod } => reclaimer.stop_single(&pod).await?,
        Command::Prune => reclaimer.prune().await?,
    };

    Ok(summarize(&report))
}

fn summarize(report: &PassReport) -> bool {
    for pod in &report.reclaimed {
        println!("{pod}");
    }
    tracing::info!(
        selected = report.selected,
        reclaimed = report.reclaimed.len(),
        failed = report.failures.len(),
        deferred = report.deferred(),
        "Pass complete"
    );
    report.is_success()
}
