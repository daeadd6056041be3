use anyhow::Result;
use clap::Parser;
use spectre_scan::cli::Cli;
use spectre_scan::coordinator::ScanCoordinator;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_logging() {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    println!(
        "Before scanning starts: confirm the known-open reference accepts \
         and closes the connection, and the known-closed reference refuses \
         it. A misconfigured reference pair makes every proxy verdict wrong."
    );

    let config = match cli.into_config().await {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "configuration failed");
            return Err(e);
        }
    };

    info!(
        targets = config.targets.len(),
        candidates = config.candidates.len(),
        "configuration loaded"
    );

    let coordinator = ScanCoordinator::new(config.candidates, config.refs);
    let summary = coordinator.run(config.targets).await;

    println!("\n--- Summary ---");
    for target in &summary.opened {
        println!("Open {}", target);
    }
    println!(
        "{} open, {} closed ({} total)",
        summary.open(),
        summary.closed,
        summary.total()
    );

    Ok(())
}
