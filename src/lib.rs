pub mod bootstrap;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod disk;

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use clap::Parser as _;
use cmd::IntoCommand as _;
use shadow_rs::shadow;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

shadow!(build);

pub async fn run() -> Result<()> {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let (filter, reload_handle) = tracing_subscriber::reload::Layer::new(filter);
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    tracing_log::LogTracer::init().ok();

    let args = cli::Cli::parse();

    if let cli::GlobalSubcommand::Daemon(_) = &args.command {
        tracing::info!(
            "volumed version: v{}  commit: {}  buildtime: {}",
            build::PKG_VERSION,
            build::COMMIT_HASH,
            build::BUILD_TIME
        );
    }

    // Handle config dir
    if let Some(config_dir) = args.config_dir {
        if !Path::new(&config_dir).exists() || !Path::new(&config_dir).is_dir() {
            bail!("Config dir {config_dir} does not exist or not a directory")
        }

        config::set_config_dir(config_dir).await;
    }

    tracing::debug!("Using config dir: {:?}", config::get_config_dir().await);

    // Check verbose option from config file, if is running as daemon.
    if let cli::GlobalSubcommand::Daemon(_) = &args.command {
        let global_config = config::effective_global_config().await?;
        if global_config.verbose() {
            reload_handle
                .modify(|filter| {
                    *filter = tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| "debug".into())
                })
                .context("Failed to update log level to DEBUG")?;

            tracing::info!("Log level set to DEBUG");
        }
    }

    // Handle the command
    args.command.into_command().run().await?;

    Ok(())
}
