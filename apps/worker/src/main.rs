mod alerts;
mod cli;
mod config;
mod error;
mod logs;
mod monitoring;
mod store;
#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::join_all;
use tokio::signal;
use tracing::{error, info};

use crate::alerts::{AlertDispatcher, HttpGateway, LogGateway, NotificationGateway};
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::logs::{FileLogSink, LogRotator, LogSink, OutcomeLogger};
use crate::monitoring::{HttpProber, MonitoringScheduler, WorkerContext};
use crate::store::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_config(cli.config.as_ref())?;

    logger::init(&config.logging.level, config.logging.log_format());

    let sink: Arc<dyn LogSink> = Arc::new(FileLogSink::new(&config.storage.logs_dir));

    match cli.command.unwrap_or(Command::Run) {
        Command::Config => {
            println!("{config}");
        }
        Command::Decompress { archive_id } => {
            let contents = sink
                .decompress(&archive_id)
                .await
                .with_context(|| format!("could not read archive {archive_id}"))?;
            print!("{contents}");
        }
        Command::Rotate => {
            let rotator = LogRotator::new(sink);
            let report = rotator.rotate_logs().await?;
            info!(
                "Rotated {} logs, {} empty, {} failed",
                report.archived.len(),
                report.skipped,
                report.failures.len()
            );
        }
        Command::Tick => {
            let scheduler = build_scheduler(&config, sink)?;
            let results = join_all(scheduler.probe_tick().await).await;
            let failed = results.iter().filter(|r| !matches!(r, Ok(Ok(_)))).count();
            info!("Probing pass finished: {} checks, {} failed", results.len(), failed);
        }
        Command::Run => {
            let scheduler = Arc::new(build_scheduler(&config, sink)?);
            let handle = scheduler.start();

            match signal::ctrl_c().await {
                Ok(()) => info!("Ctrl+C received, shutting down worker."),
                Err(e) => error!("could not listen for shutdown signal: {}", e),
            }
            handle.shutdown().await;
        }
    }

    Ok(())
}

fn build_scheduler(config: &Config, sink: Arc<dyn LogSink>) -> Result<MonitoringScheduler> {
    let gateway: Arc<dyn NotificationGateway> = match &config.gateway.url {
        Some(url) => Arc::new(HttpGateway::new(
            url.clone(),
            config.gateway.auth_token.clone(),
            config.gateway.timeout_seconds,
        )?),
        None => {
            info!("No notification gateway configured, alerts will only be logged");
            Arc::new(LogGateway)
        }
    };

    let context = Arc::new(WorkerContext {
        store: Arc::new(FileStore::new(&config.storage.data_dir)),
        prober: Arc::new(HttpProber::new().context("could not build HTTP client")?),
        alerts: AlertDispatcher::new(gateway),
        outcomes: OutcomeLogger::new(Arc::clone(&sink)),
    });

    Ok(MonitoringScheduler::new(
        context,
        Arc::new(LogRotator::new(sink)),
        Duration::from_secs(config.worker.check_interval_seconds),
        config.worker.skip_in_flight,
    ))
}
