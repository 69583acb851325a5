use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::disk::PARTNUM_WHOLE_DISK;

/// One line of the platform fstab.
///
/// The format is five whitespace-separated columns:
///
/// ```text
/// <block device> <mount point> <fs type> <mount options> <mgr flags>
/// ```
///
/// `mgr flags` is a comma-separated list. The flags consumed here are
/// `managed=<label>:<partnum|auto>` (the entry is discovered and mounted by
/// volumed rather than early init), `encryptable`, `noemulatedstorage` and
/// `nonremovable`. `defaults` and unrecognized flags are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabEntry {
    /// Block device path or sysfs glob pattern, e.g. `/devices/*/mmcblk1`.
    pub blk_device: String,

    pub mount_point: String,

    /// Filesystem type, `auto` meaning auto-detect.
    pub fs_type: String,

    /// Mount options, empty if the column was `defaults`.
    pub mount_opts: String,

    /// Label from the `managed=` flag. Present iff the entry is managed by
    /// volumed.
    pub managed_label: Option<String>,

    /// Partition number from the `managed=` flag, [`PARTNUM_WHOLE_DISK`] if
    /// it was `auto`.
    pub partnum: i32,

    pub encryptable: bool,
    pub no_emulated_storage: bool,
    pub non_removable: bool,
}

impl FstabEntry {
    pub fn is_managed(&self) -> bool {
        self.managed_label.is_some()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Fstab {
    pub entries: Vec<FstabEntry>,
}

impl Fstab {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fstab from: {path:?}"))?;
        Self::parse(&content).with_context(|| format!("Failed to parse fstab: {path:?}"))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            entries.push(
                parse_entry(line).with_context(|| format!("At fstab line {}", lineno + 1))?,
            );
        }

        Ok(Self { entries })
    }
}

fn parse_entry(line: &str) -> Result<FstabEntry> {
    let mut columns = line.split_whitespace();
    let (Some(blk_device), Some(mount_point), Some(fs_type), Some(mount_opts), Some(mgr_flags)) = (
        columns.next(),
        columns.next(),
        columns.next(),
        columns.next(),
        columns.next(),
    ) else {
        bail!("Expected 5 columns: <block device> <mount point> <fs type> <mount options> <mgr flags>")
    };

    let mut entry = FstabEntry {
        blk_device: blk_device.to_owned(),
        mount_point: mount_point.to_owned(),
        fs_type: fs_type.to_owned(),
        mount_opts: if mount_opts == "defaults" {
            String::new()
        } else {
            mount_opts.to_owned()
        },
        managed_label: None,
        partnum: PARTNUM_WHOLE_DISK,
        encryptable: false,
        no_emulated_storage: false,
        non_removable: false,
    };

    for flag in mgr_flags.split(',') {
        match flag {
            "defaults" => {}
            "encryptable" => entry.encryptable = true,
            "noemulatedstorage" => entry.no_emulated_storage = true,
            "nonremovable" => entry.non_removable = true,
            _ => {
                if let Some(value) = flag.strip_prefix("managed=") {
                    let (label, partnum) = value
                        .split_once(':')
                        .context("Expected managed=<label>:<partnum|auto>")?;
                    if label.is_empty() {
                        bail!("Empty label in managed= flag")
                    }
                    entry.managed_label = Some(label.to_owned());
                    entry.partnum = if partnum == "auto" {
                        PARTNUM_WHOLE_DISK
                    } else {
                        let partnum: i32 = partnum
                            .parse()
                            .with_context(|| format!("Bad partition number: {partnum}"))?;
                        // Whole-disk entries must say `auto`, never a
                        // negative number.
                        if partnum < 0 {
                            bail!("Negative partition number: {partnum}")
                        }
                        partnum
                    };
                } else {
                    tracing::debug!(flag, "Ignoring unknown fstab flag");
                }
            }
        }
    }

    Ok(entry)
}
