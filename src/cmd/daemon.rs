use anyhow::{Context as _, Result};
use async_trait::async_trait;
use tokio::signal::unix::{signal, SignalKind};

use super::Command;
use crate::bootstrap::{self, BootstrapPaths};
use crate::cli::DaemonOptions;
use crate::disk::DiskSourceRegistry;

/// Security-context labels for the blkid and fsck helper tools, one per
/// trust tier. Handed to the volume operations when they shell out; not
/// consumed by the bootstrap itself.
#[derive(Debug, Clone)]
pub struct HelperContexts {
    pub blkid: String,
    pub blkid_untrusted: String,
    pub fsck: String,
    pub fsck_untrusted: String,
}

impl From<&DaemonOptions> for HelperContexts {
    fn from(options: &DaemonOptions) -> Self {
        Self {
            blkid: options.blkid_context.clone(),
            blkid_untrusted: options.blkid_untrusted_context.clone(),
            fsck: options.fsck_context.clone(),
            fsck_untrusted: options.fsck_untrusted_context.clone(),
        }
    }
}

pub struct DaemonCommand {
    pub daemon_options: DaemonOptions,
}

#[async_trait]
impl Command for DaemonCommand {
    async fn run(&self) -> Result<()> {
        let helper_contexts = HelperContexts::from(&self.daemon_options);
        tracing::debug!("Helper contexts: {helper_contexts:?}");

        let global_config = crate::config::effective_global_config().await?;

        // Rule registration must complete before the coldboot trigger fires,
        // and both before any listener starts, so that no redelivered event
        // can arrive ahead of its matching rule.
        let paths = BootstrapPaths::from(&self.daemon_options.paths);
        let mut registry = DiskSourceRegistry::default();
        let summary =
            bootstrap::run(&paths, global_config.force_default_primary(), &mut registry).await;

        tracing::info!(
            "Bootstrap complete: {} disk sources, has_adoptable={}, {} devices re-announced",
            registry.len(),
            registry.has_adoptable(),
            summary.triggered.len()
        );

        // The netlink listener and the command listeners take the registry
        // from here. Until then the daemon itself only has to stay up.
        wait_for_shutdown().await
    }
}

async fn wait_for_shutdown() -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received SIGINT, exiting");
        }
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, exiting");
        }
    }

    Ok(())
}
