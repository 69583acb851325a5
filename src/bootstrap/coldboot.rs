//! Coldboot trigger: forces the kernel to redeliver an "add" uevent for every
//! block device that was already present before the netlink listener started.
//!
//! The walk mirrors the layout of sysfs. The top level of a class directory
//! mixes device directories with symlinks into the device tree, so at depth 0
//! we try to descend into every entry; below that only plain directories are
//! nested devices and everything else is skipped.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt as _;

const UEVENT_TRIGGER_PAYLOAD: &[u8] = b"add\n";

/// Outcome of one uevent write attempt. Both failure variants are tolerated
/// by the walk; the distinction only feeds the summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UeventOutcome {
    /// `add\n` was written.
    Triggered,
    /// The directory exposes no writable `uevent` entry. Normal for
    /// non-device nodes.
    NotApplicable,
    /// The `uevent` entry opened but the write failed.
    WriteFailed,
}

#[derive(Debug, Default)]
pub struct ColdbootSummary {
    /// Every `uevent` file that was successfully written. Stable across
    /// repeated runs on an unchanged tree, up to enumeration order.
    pub triggered: Vec<PathBuf>,
    pub write_failures: usize,
}

/// Walk the device tree under `root` depth-first and write `add\n` into every
/// `uevent` control file found along the way.
///
/// Nothing here is fatal: an unopenable root degrades to a no-op, an
/// unreadable directory aborts only its own subtree, and per-device write
/// failures are counted but never stop the walk.
pub async fn trigger(root: impl AsRef<Path>) -> ColdbootSummary {
    let root = root.as_ref();
    let mut summary = ColdbootSummary::default();

    let mut stack = vec![(root.to_path_buf(), 0usize)];
    while let Some((dir, depth)) = stack.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                if depth == 0 {
                    tracing::debug!("Coldboot root {dir:?} not accessible, skipping: {e}");
                }
                continue;
            }
        };

        match write_uevent(&dir).await {
            UeventOutcome::Triggered => summary.triggered.push(dir.join("uevent")),
            UeventOutcome::NotApplicable => {}
            UeventOutcome::WriteFailed => summary.write_failures += 1,
        }

        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            if depth > 0 {
                // Below the root level only plain directories nest further
                // devices; symlinks are not followed.
                let is_dir = entry.file_type().await.map_or(false, |ft| ft.is_dir());
                if !is_dir {
                    continue;
                }
            }

            stack.push((entry.path(), depth + 1));
        }
    }

    summary
}

async fn write_uevent(dir: &Path) -> UeventOutcome {
    let path = dir.join("uevent");
    let mut file = match OpenOptions::new().write(true).open(&path).await {
        Ok(file) => file,
        Err(_) => return UeventOutcome::NotApplicable,
    };

    match file.write_all(UEVENT_TRIGGER_PAYLOAD).await {
        Ok(()) => UeventOutcome::Triggered,
        Err(_) => UeventOutcome::WriteFailed,
    }
}

#[cfg(test)]
pub mod tests {

    use super::*;

    use std::collections::BTreeSet;
    use std::os::unix::fs::symlink;

    use anyhow::Result;

    async fn make_device_dir(path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path).await?;
        tokio::fs::write(path.join("uevent"), b"").await?;
        Ok(())
    }

    fn triggered_set(summary: &ColdbootSummary) -> BTreeSet<PathBuf> {
        summary.triggered.iter().cloned().collect()
    }

    #[tokio::test]
    async fn test_trigger_writes_add_to_every_uevent() -> Result<()> {
        let root = tempfile::tempdir()?;
        make_device_dir(&root.path().join("sda")).await?;
        make_device_dir(&root.path().join("sda/sda1")).await?;
        make_device_dir(&root.path().join("mmcblk0")).await?;
        // No uevent here, must be skipped without error.
        tokio::fs::create_dir(root.path().join("loop-control")).await?;

        let summary = trigger(root.path()).await;

        let expected: BTreeSet<PathBuf> = [
            root.path().join("sda/uevent"),
            root.path().join("sda/sda1/uevent"),
            root.path().join("mmcblk0/uevent"),
        ]
        .into_iter()
        .collect();
        assert_eq!(triggered_set(&summary), expected);
        assert_eq!(summary.write_failures, 0);

        let content = tokio::fs::read(root.path().join("sda/sda1/uevent")).await?;
        assert_eq!(content, b"add\n");

        Ok(())
    }

    #[tokio::test]
    async fn test_trigger_is_idempotent() -> Result<()> {
        let root = tempfile::tempdir()?;
        make_device_dir(&root.path().join("sda")).await?;
        make_device_dir(&root.path().join("sdb")).await?;
        make_device_dir(&root.path().join("sdb/sdb1")).await?;

        let first = trigger(root.path()).await;
        let second = trigger(root.path()).await;

        assert_eq!(triggered_set(&first), triggered_set(&second));
        assert_eq!(first.triggered.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_root_is_a_noop() {
        let summary = trigger("/nonexistent/coldboot/root").await;
        assert!(summary.triggered.is_empty());
        assert_eq!(summary.write_failures, 0);
    }

    #[tokio::test]
    async fn test_symlink_descended_only_at_root_level() -> Result<()> {
        let root = tempfile::tempdir()?;
        let target = tempfile::tempdir()?;
        make_device_dir(&target.path().join("dev")).await?;

        // Top level of sysfs mixes symlinks with directories; a symlink at
        // depth 0 is descended into.
        symlink(target.path(), root.path().join("linked"))?;
        // The same symlink one level down is not.
        tokio::fs::create_dir(root.path().join("sub")).await?;
        symlink(target.path(), root.path().join("sub/linked"))?;

        let summary = trigger(root.path()).await;

        // Only target/dev has a uevent, and only the depth-0 symlink leads
        // there.
        let expected: BTreeSet<PathBuf> =
            [root.path().join("linked/dev/uevent")].into_iter().collect();
        assert_eq!(
            triggered_set(&summary),
            expected,
            "symlink below the root level must not be followed"
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_uevent_that_is_a_directory_is_not_applicable() -> Result<()> {
        let root = tempfile::tempdir()?;
        make_device_dir(&root.path().join("sda")).await?;
        // A directory named uevent cannot be opened for writing; the walk
        // still descends past it.
        tokio::fs::create_dir_all(root.path().join("queue/uevent")).await?;
        make_device_dir(&root.path().join("queue/uevent/dev")).await?;

        let summary = trigger(root.path()).await;

        assert!(summary
            .triggered
            .contains(&root.path().join("sda/uevent")));
        assert!(summary
            .triggered
            .contains(&root.path().join("queue/uevent/dev/uevent")));
        assert_eq!(summary.write_failures, 0);

        Ok(())
    }
}
