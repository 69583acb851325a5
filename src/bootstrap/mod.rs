//! Device-discovery bootstrap.
//!
//! Runs once at daemon startup, strictly in this order: disk source rules are
//! derived from the fstab and from the kernel command line and registered
//! first, and only then is the coldboot trigger fired. Every device the
//! kernel re-announces can therefore be matched against a complete rule set.

pub mod cmdline;
pub mod coldboot;
pub mod fstab_rules;

use std::path::PathBuf;

use coldboot::ColdbootSummary;

use crate::config::fstab::Fstab;
use crate::disk::DiskSourceRegistry;

/// The external interfaces the bootstrap reads from, overridable for tests
/// and via the CLI.
#[derive(Debug, Clone)]
pub struct BootstrapPaths {
    pub fstab: PathBuf,
    pub cmdline: PathBuf,
    pub sysfs_block: PathBuf,
}

impl Default for BootstrapPaths {
    fn default() -> Self {
        Self {
            fstab: PathBuf::from("/etc/volumed/fstab"),
            cmdline: PathBuf::from("/proc/cmdline"),
            sysfs_block: PathBuf::from("/sys/block"),
        }
    }
}

/// Populate `registry` from the fstab and the kernel command line.
///
/// A missing or unparseable fstab degrades to an empty rule set: the daemon
/// must still come up and accept commands with broken configuration. Failure
/// to read the kernel command line is tolerated the same way.
pub async fn populate_disk_sources(
    paths: &BootstrapPaths,
    force_default_primary: bool,
    registry: &mut DiskSourceRegistry,
) {
    match Fstab::load(&paths.fstab).await {
        Ok(fstab) => {
            let (rules, _) = fstab_rules::build_rules(&fstab, force_default_primary);
            for rule in rules {
                registry.add_source(rule);
            }
        }
        Err(e) => {
            tracing::error!("Error reading configuration, continuing anyways: {e:#}");
        }
    }

    match tokio::fs::read_to_string(&paths.cmdline).await {
        Ok(cmdline) => {
            let probe = cmdline::SysfsBlockProbe::new(&paths.sysfs_block);
            if let Some(rule) = cmdline::scan(&cmdline, &probe).await {
                registry.add_source(rule);
            }
        }
        Err(e) => {
            tracing::debug!("Kernel command line {:?} not readable: {e}", paths.cmdline);
        }
    }
}

/// Run the full bootstrap: register all disk sources, then force uevent
/// redelivery so the already-started listener sees every present device.
pub async fn run(
    paths: &BootstrapPaths,
    force_default_primary: bool,
    registry: &mut DiskSourceRegistry,
) -> ColdbootSummary {
    populate_disk_sources(paths, force_default_primary, registry).await;

    let summary = coldboot::trigger(&paths.sysfs_block).await;
    tracing::info!(
        "Coldboot triggered {} devices ({} write failures)",
        summary.triggered.len(),
        summary.write_failures
    );

    summary
}
