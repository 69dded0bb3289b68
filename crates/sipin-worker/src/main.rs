//! SIP creator worker - main entry point

use anyhow::Context;
use clap::Parser;
use sipin_common::logging::{init_logging, LogConfig};
use sipin_core::PackageAssembler;
use sipin_worker::config::Settings;
use sipin_worker::org_api::OrgApiClient;
use sipin_worker::publisher::JsonLinesPublisher;
use sipin_worker::{commands, Cli, Commands};
use std::process;
use std::sync::Arc;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env()
        .unwrap_or_else(|e| {
            eprintln!("Warning: ignoring LOG_* settings: {:#}", e);
            LogConfig::default()
        })
        .into_builder()
        .verbose(cli.verbose)
        .directive("hyper_util=info")
        .build();
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        },
    };

    if let Err(e) = run(&cli) {
        error!(error = %e, "Command failed");
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    info!(host = %settings.host, org_api = %settings.org_api.url, "Settings loaded");

    // The blocking HTTP client must live outside the async runtime
    let lookup = OrgApiClient::new(&settings.org_api)?;
    let assembler = Arc::new(PackageAssembler::new(
        settings.assembler_config(),
        Arc::new(lookup),
    ));
    let publisher = JsonLinesPublisher::from_output(&settings.events.output)
        .with_context(|| format!("Failed to open event output '{}'", settings.events.output))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    let summary = runtime.block_on(async {
        match &cli.command {
            Commands::Create { message } => {
                commands::create(message, assembler, &settings.host, &publisher).await
            },
            Commands::Drain { inbox } => {
                commands::drain(
                    inbox,
                    assembler,
                    &settings.host,
                    settings.worker.max_in_flight,
                    &publisher,
                )
                .await
            },
        }
    })?;

    if summary.failed + summary.invalid > 0 {
        anyhow::bail!(
            "{} of {} messages failed",
            summary.failed + summary.invalid,
            summary.created + summary.failed + summary.requeued + summary.invalid + summary.skipped
        );
    }
    Ok(())
}
