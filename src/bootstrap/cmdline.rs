//! Kernel command line scanning: an `SDCARD=<device>` token lets the boot
//! loader hand volumed a removable disk to manage without an fstab entry.

use std::path::PathBuf;

use async_trait::async_trait;
use nix::unistd::{access, AccessFlags};

use crate::disk::{DiskFlags, DiskSourceRule, PARTNUM_WHOLE_DISK};

pub const SDCARD_TOKEN: &str = "SDCARD=";

/// Answers whether a raw device token names a whole disk, i.e. whether an
/// accessible block entry exists for it in sysfs. Seam for tests; the
/// production impl is [`SysfsBlockProbe`].
#[async_trait]
pub trait BlockDeviceProbe: Send + Sync {
    async fn is_whole_disk(&self, name: &str) -> bool;
}

pub struct SysfsBlockProbe {
    sysfs_block: PathBuf,
}

impl SysfsBlockProbe {
    pub fn new(sysfs_block: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_block: sysfs_block.into(),
        }
    }
}

#[async_trait]
impl BlockDeviceProbe for SysfsBlockProbe {
    async fn is_whole_disk(&self, name: &str) -> bool {
        access(&self.sysfs_block.join(name), AccessFlags::X_OK).is_ok()
    }
}

/// Split a raw device token into a device name and partition number.
///
/// The trailing decimal digit run is the partition number and is stripped
/// from the name. Names following the `mmcblk`/`nvme` convention carry a `p`
/// separator before the partition digits, which is stripped as well. A token
/// with no trailing digits is a whole disk and comes back unchanged.
///
/// Pure string surgery, no filesystem access. Callers are expected to have
/// already ruled out the whole-disk case via a [`BlockDeviceProbe`].
pub fn normalize_device_name(raw: &str) -> (String, i32) {
    let name = raw.trim_end_matches(|c: char| c.is_ascii_digit());
    if name.len() == raw.len() {
        return (raw.to_owned(), PARTNUM_WHOLE_DISK);
    }

    let Ok(partnum) = raw[name.len()..].parse::<i32>() else {
        // Digit run too long to be a partition number.
        return (raw.to_owned(), PARTNUM_WHOLE_DISK);
    };

    let mut name = name.to_owned();
    if name.contains("mmcblk") || name.contains("nvme") {
        // Drop the 'p' separator. Assumes it is always a single character;
        // names merely containing these substrings get mis-stripped.
        name.pop();
    }

    (name, partnum)
}

/// Extract the `SDCARD=` disk source from the kernel command line, if any.
pub async fn scan(cmdline: &str, probe: &dyn BlockDeviceProbe) -> Option<DiskSourceRule> {
    let pos = cmdline.find(SDCARD_TOKEN)?;
    let rest = &cmdline[pos + SDCARD_TOKEN.len()..];
    let raw = rest.split([' ', '\n']).next().unwrap_or("");
    if raw.is_empty() {
        return None;
    }

    let (name, partnum) = if probe.is_whole_disk(raw).await {
        (raw.to_owned(), PARTNUM_WHOLE_DISK)
    } else {
        normalize_device_name(raw)
    };

    tracing::info!("Found SDCARD={name} partnum={partnum} on kernel command line");

    Some(DiskSourceRule {
        sys_pattern: format!("/devices/*/{name}"),
        nickname: name,
        partnum,
        flags: DiskFlags {
            adoptable: true,
            ..Default::default()
        },
        fs_type: "auto".to_owned(),
        mount_opts: String::new(),
    })
}
