use std::path::PathBuf;
use std::sync::Arc;

use alarmwatch::{Overrides, Settings, TerminalSink};
use alarmwatch_adapters::HttpBackend;
use alarmwatch_engine::{AlarmWatch, InstallStatus};
use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "alarmwatch")]
#[command(about = "Poll an installation/alarm backend and print each new alarm once")]
struct Args {
    /// Path to a config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (e.g. http://localhost:8000)
    #[arg(long)]
    base_url: Option<String>,

    /// Alarm endpoint path
    #[arg(long)]
    alarm_endpoint: Option<String>,

    /// Alarm poll interval in milliseconds (minimum 500)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Install-state endpoint path
    #[arg(long)]
    install_endpoint: Option<String>,

    /// Install-state check interval in milliseconds (minimum 2000)
    #[arg(long)]
    sync_interval_ms: Option<u64>,

    /// HTTP request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Run the install check and at most one alarm poll, then exit
    #[arg(long)]
    once: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            alarm_endpoint: self.alarm_endpoint.clone(),
            interval_ms: self.interval_ms,
            install_endpoint: self.install_endpoint.clone(),
            sync_interval_ms: self.sync_interval_ms,
            timeout_ms: self.timeout_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alarmwatch=info,alarmwatch_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load(args.config.as_deref())?
        .with_overrides(args.overrides())
        .validate()?;

    let backend = HttpBackend::builder()
        .base_url(&settings.base_url)
        .timeout(settings.timeout())
        .build()?;

    let watch = AlarmWatch::builder(Arc::new(backend), Arc::new(TerminalSink::stdout()))
        .alarm_endpoint(&settings.alarm_endpoint)
        .poll_interval(settings.interval())
        .install_endpoint(&settings.install_endpoint)
        .sync_interval(settings.sync_interval())
        .detail_hint(&settings.detail_hint)
        .build();

    info!(
        "Watching {} (alarms every {}ms, install state every {}ms)",
        settings.base_url, settings.interval_ms, settings.sync_interval_ms
    );

    if args.once {
        match watch.boot().await {
            Some(InstallStatus::Install) => {
                info!("Installed, {} alarm(s) seen", watch.service().seen_count())
            }
            Some(InstallStatus::Uninstall) => info!("Not installed, nothing to poll"),
            None => info!("Install state unavailable, nothing polled"),
        }
        watch.service().stop();
        return Ok(());
    }

    let handle = watch.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    handle.stop().await;

    Ok(())
}
