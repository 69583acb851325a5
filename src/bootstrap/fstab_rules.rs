//! Derives disk source rules from the platform fstab.

use crate::config::fstab::Fstab;
use crate::disk::{DiskFlags, DiskSourceRule};

/// Build one rule per managed fstab entry, in table order.
///
/// Returns the rules together with whether any of them is adoptable.
/// `force_default_primary` is the debug override that marks every managed
/// disk as default-primary regardless of its flags.
pub fn build_rules(fstab: &Fstab, force_default_primary: bool) -> (Vec<DiskSourceRule>, bool) {
    let mut rules = Vec::new();
    let mut has_adoptable = false;

    for entry in &fstab.entries {
        let Some(label) = &entry.managed_label else {
            continue;
        };

        let flags = DiskFlags {
            adoptable: entry.encryptable,
            default_primary: entry.no_emulated_storage || force_default_primary,
            non_removable: entry.non_removable,
        };
        has_adoptable |= entry.encryptable;

        rules.push(DiskSourceRule {
            sys_pattern: entry.blk_device.clone(),
            nickname: label.clone(),
            partnum: entry.partnum,
            flags,
            fs_type: entry.fs_type.clone(),
            mount_opts: entry.mount_opts.clone(),
        });
    }

    (rules, has_adoptable)
}

#[cfg(test)]
pub mod tests {

    use super::*;

    use anyhow::Result;

    use crate::disk::PARTNUM_WHOLE_DISK;

    #[test]
    fn test_unmanaged_entries_produce_no_rules() -> Result<()> {
        let fstab = Fstab::parse(
            "/dev/block/sda1 /data ext4 rw,noatime defaults\n\
             /dev/block/sda2 /cache ext4 defaults wait,check",
        )?;

        let (rules, has_adoptable) = build_rules(&fstab, false);
        assert!(rules.is_empty());
        assert!(!has_adoptable);

        Ok(())
    }

    #[test]
    fn test_managed_entry_becomes_rule() -> Result<()> {
        let fstab = Fstab::parse(
            "/devices/*/mmc_host/mmc1 auto auto defaults managed=sdcard1:auto,encryptable",
        )?;

        let (rules, has_adoptable) = build_rules(&fstab, false);
        assert!(has_adoptable);
        assert_eq!(rules.len(), 1);

        let rule = &rules[0];
        assert_eq!(rule.sys_pattern, "/devices/*/mmc_host/mmc1");
        assert_eq!(rule.nickname, "sdcard1");
        assert_eq!(rule.partnum, PARTNUM_WHOLE_DISK);
        assert_eq!(rule.fs_type, "auto");
        assert_eq!(rule.mount_opts, "");
        assert!(rule.flags.adoptable);
        assert!(!rule.flags.default_primary);
        assert!(!rule.flags.non_removable);

        Ok(())
    }

    #[test]
    fn test_flag_derivation() -> Result<()> {
        let fstab = Fstab::parse(
            "/devices/*/sdhci.1 auto vfat defaults managed=external:1,noemulatedstorage,nonremovable",
        )?;

        let (rules, has_adoptable) = build_rules(&fstab, false);
        assert!(!has_adoptable, "non-encryptable entry is not adoptable");
        assert!(!rules[0].flags.adoptable);
        assert!(rules[0].flags.default_primary);
        assert!(rules[0].flags.non_removable);
        assert_eq!(rules[0].partnum, 1);

        Ok(())
    }

    #[test]
    fn test_force_default_primary_override() -> Result<()> {
        let fstab =
            Fstab::parse("/devices/*/mmc_host/mmc1 auto auto defaults managed=sdcard1:auto")?;

        let (rules, _) = build_rules(&fstab, false);
        assert!(!rules[0].flags.default_primary);

        let (rules, _) = build_rules(&fstab, true);
        assert!(rules[0].flags.default_primary);

        Ok(())
    }

    #[test]
    fn test_rules_follow_table_order() -> Result<()> {
        let fstab = Fstab::parse(
            "/devices/*/mmc1 auto auto defaults managed=first:auto\n\
             /dev/block/sda1 /data ext4 defaults defaults\n\
             /devices/*/usb* auto auto defaults managed=second:auto",
        )?;

        let (rules, _) = build_rules(&fstab, false);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].nickname, "first");
        assert_eq!(rules[1].nickname, "second");

        Ok(())
    }
}
