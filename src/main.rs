//! Tech Trend Notifier: binary entrypoint.
//! One collection by default; `--test`, `--health` or `--daemon` otherwise.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tech_trend_notifier::config::{Profile, Settings};
use tech_trend_notifier::metrics::install_prometheus;
use tech_trend_notifier::pipeline::Pipeline;
use tech_trend_notifier::scheduler::{spawn_scheduler, DEFAULT_INTERVAL_HOURS};

#[derive(Debug, Parser)]
#[command(name = "tech-trend-notifier", version, about)]
struct Cli {
    /// Small test run: two queries, web search only, nothing sent
    #[arg(long, conflicts_with_all = ["health", "daemon"])]
    test: bool,

    /// Check Slack and every enabled collector
    #[arg(long, conflicts_with = "daemon")]
    health: bool,

    /// Keep running and collect on a fixed interval
    #[arg(long)]
    daemon: bool,

    /// Hours between scheduled runs in daemon mode
    #[arg(long, default_value_t = DEFAULT_INTERVAL_HOURS, value_parser = clap::value_parser!(u64).range(1..))]
    interval_hours: u64,

    /// Serve Prometheus metrics on this address in daemon mode
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

/// RUST_LOG wins; otherwise LOG_LEVEL from settings.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_ascii_lowercase()));

    let registry = tracing_subscriber::registry().with(filter);
    if settings.log_format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let settings = Settings::from_env();
    init_tracing(&settings);

    match run(cli, settings).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = ?e, "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, settings: Settings) -> Result<bool> {
    let profile = Profile::load_default().context("loading user profile")?;
    tracing::info!(profile = %profile.name, interests = profile.interests.len(), "profile loaded");

    let pipeline = Pipeline::from_config(&settings, profile)?;
    tracing::info!(collectors = ?pipeline.collector_names(), "pipeline ready");

    if cli.health {
        return Ok(pipeline.health_check().await);
    }
    if cli.test {
        return pipeline.test_run().await;
    }
    if cli.daemon {
        if let Some(addr) = cli.metrics_addr {
            install_prometheus(addr)?;
        }
        let interval = Duration::from_secs(cli.interval_hours * 3600);
        tracing::info!(hours = cli.interval_hours, "daemon mode");
        let handle = spawn_scheduler(Arc::new(pipeline), interval);
        tokio::select! {
            res = handle => {
                res.context("scheduler task ended")?;
                return Ok(false);
            }
            sig = tokio::signal::ctrl_c() => {
                sig.context("waiting for ctrl-c")?;
                tracing::info!("shutdown requested");
                return Ok(true);
            }
        }
    }

    let report = pipeline.run_collection().await?;
    Ok(report.succeeded())
}
