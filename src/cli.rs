use std::path::PathBuf;

use clap::Parser;

use crate::build::CLAP_LONG_VERSION;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[clap(long_version = CLAP_LONG_VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: GlobalSubcommand,

    #[clap(long, short = 'd')]
    /// Path to the root directory where to load configuration files. Default value is /etc/volumed.
    pub config_dir: Option<String>,
}

#[derive(Parser, Debug)]
pub enum GlobalSubcommand {
    /// Run the volume management daemon.
    #[command(name = "daemon")]
    Daemon(DaemonOptions),

    /// Build the disk source rules exactly as the daemon would and print
    /// them, without triggering device rediscovery.
    #[command(name = "sources")]
    Sources(SourcesOptions),
}

#[derive(Parser, Debug)]
pub struct DaemonOptions {
    /// SELinux context for the trusted blkid helper.
    #[clap(long)]
    pub blkid_context: String,

    /// SELinux context for the untrusted blkid helper.
    #[clap(long)]
    pub blkid_untrusted_context: String,

    /// SELinux context for the trusted fsck helper.
    #[clap(long)]
    pub fsck_context: String,

    /// SELinux context for the untrusted fsck helper.
    #[clap(long)]
    pub fsck_untrusted_context: String,

    #[clap(flatten)]
    pub paths: BootstrapPathOptions,
}

#[derive(Parser, Debug)]
pub struct SourcesOptions {
    #[clap(flatten)]
    pub paths: BootstrapPathOptions,
}

#[derive(Parser, Debug, Clone)]
pub struct BootstrapPathOptions {
    /// Path to the fstab describing the managed partitions.
    #[clap(long, default_value = "/etc/volumed/fstab")]
    pub fstab: PathBuf,

    /// Path to the kernel command line.
    #[clap(long, default_value = "/proc/cmdline")]
    pub cmdline: PathBuf,

    /// Root of the sysfs block device tree.
    #[clap(long, default_value = "/sys/block")]
    pub sysfs_root: PathBuf,
}

impl From<&BootstrapPathOptions> for crate::bootstrap::BootstrapPaths {
    fn from(options: &BootstrapPathOptions) -> Self {
        Self {
            fstab: options.fstab.clone(),
            cmdline: options.cmdline.clone(),
            sysfs_block: options.sysfs_root.clone(),
        }
    }
}
