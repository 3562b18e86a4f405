use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use twitch_srec::config::{AppConfig, Args};
use twitch_srec::{app, logging, panic_hook};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(args).context("loading configuration")?;

    let _log_guard = logging::init_logging(config.verbose, config.log_dir.as_deref())?;
    panic_hook::install();

    println!("{}", app::banner(&config));
    for warning in &config.warnings {
        warn!("{}", warning);
    }
    if let Some(source) = &config.source {
        info!("Using config file {}", source.display());
    }
    debug!("Resolved configuration: {:#?}", config);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            shutdown.cancel();
        }
    });

    app::run(config, cancel).await?;
    Ok(())
}
