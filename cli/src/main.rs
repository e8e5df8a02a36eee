//! Network connection check - binary entry point.
//!
//! ```text
//! main() -> CheckConfig::from_env() --error--> report failure, exit non-zero
//!              |
//!              v
//!        ReportClient -> wait_for_kuberhealthy() -> Checker::run_and_report()
//! ```
//!
//! SIGINT and SIGTERM cancel the shared token, which the checker observes as
//! an interrupt. The checker cancels the same token when it finishes, which
//! also retires the signal watcher.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::time::Instant;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use netcheck_config::{CheckConfig, ConfigError, ReportingConfig};
use netcheck_engine::{CancellationToken, Checker};
use netcheck_reporting::ReportClient;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let mut config = match CheckConfig::from_env() {
        Ok(config) => config,
        Err(err) => return report_config_failure(err).await,
    };

    let reporting = ReportingConfig::from_env().context("loading reporting configuration")?;
    let reporter = ReportClient::new(&reporting).context("creating report client")?;

    let cancel = CancellationToken::new();
    let sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    tokio::spawn(watch_interrupts(cancel.clone(), sigint, sigterm));

    let started = Instant::now();
    wait_for_kuberhealthy(&reporter, &cancel, config.check_timeout).await;
    config.check_timeout = config.check_timeout.saturating_sub(started.elapsed());

    let checker = Checker::from_config(&config);
    let verdict = checker
        .run_and_report(&cancel, &reporter)
        .await
        .inspect_err(|e| {
            tracing::error!(
                connection_target = %config.connection_target,
                "Error running network connection check: {e:#}"
            );
        })?;

    tracing::info!(
        connection_target = %config.connection_target,
        verdict = %verdict,
        "Done running network connection check"
    );
    Ok(())
}

/// Configuration errors end the run before any probing.
async fn report_config_failure(err: ConfigError) -> Result<()> {
    tracing::error!("{err}");

    match ReportingConfig::from_env() {
        Ok(reporting) => match ReportClient::new(&reporting) {
            Ok(reporter) => {
                if let Err(e) = reporter.report_failure(vec![err.to_string()]).await {
                    tracing::error!("Failed to report configuration error: {e}");
                }
            }
            Err(e) => tracing::error!("Failed to report configuration error: {e}"),
        },
        Err(e) => tracing::error!("Cannot report configuration error: {e}"),
    }

    Err(anyhow::Error::new(err).context("loading check configuration"))
}

async fn wait_for_kuberhealthy(reporter: &ReportClient, cancel: &CancellationToken, limit: Duration) {
    match tokio::time::timeout(limit, reporter.wait_for_kuberhealthy(cancel)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Failed to reach Kuberhealthy: {e}"),
        Err(_) => tracing::error!(
            limit = ?limit,
            "Failed to reach Kuberhealthy before the check time limit"
        ),
    }
}

async fn watch_interrupts(cancel: CancellationToken, mut sigint: Signal, mut sigterm: Signal) {
    tokio::select! {
        () = cancel.cancelled() => {}
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT");
            cancel.cancel();
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
            cancel.cancel();
        }
    }
}
