use std::fmt::Display;

/// Attributes attached to a disk source, derived from the fstab entry or the
/// kernel command line that produced it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskFlags {
    /// The volume may be reformatted and bound to the device's lifecycle,
    /// e.g. portable storage promoted to private storage.
    pub adoptable: bool,

    /// Prefer this disk as the primary shared storage.
    pub default_primary: bool,

    /// The disk cannot be physically removed at runtime.
    pub non_removable: bool,
}

impl DiskFlags {
    pub fn is_empty(&self) -> bool {
        !(self.adoptable || self.default_primary || self.non_removable)
    }
}

impl Display for DiskFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.adoptable {
            names.push("adoptable");
        }
        if self.default_primary {
            names.push("default-primary");
        }
        if self.non_removable {
            names.push("non-removable");
        }
        if names.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", names.join(","))
        }
    }
}

/// Partition number of a [`DiskSourceRule`] that refers to a whole disk
/// rather than a specific partition.
pub const PARTNUM_WHOLE_DISK: i32 = -1;

/// A pattern plus metadata used to decide whether an incoming device event
/// belongs to a volume the daemon should manage.
///
/// Rules are built once during bootstrap and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskSourceRule {
    /// Glob matched against the sysfs path of an incoming device,
    /// e.g. `/devices/*/mmcblk1`. Never empty.
    pub sys_pattern: String,

    /// Human-readable label shown to users.
    pub nickname: String,

    /// Partition number, or [`PARTNUM_WHOLE_DISK`] for the whole disk. When
    /// set, any trailing partition suffix has already been stripped from the
    /// device name inside `sys_pattern`.
    pub partnum: i32,

    pub flags: DiskFlags,

    /// Filesystem type, empty meaning auto-detect.
    pub fs_type: String,

    /// Mount options, empty meaning none.
    pub mount_opts: String,
}

impl DiskSourceRule {
    /// Whether the sysfs path of an incoming device event matches this rule.
    /// An invalid glob pattern matches nothing.
    pub fn matches(&self, sys_path: &str) -> bool {
        glob::Pattern::new(&self.sys_pattern)
            .map(|pattern| pattern.matches(sys_path))
            .unwrap_or(false)
    }
}

/// Append-only list of disk sources, populated during bootstrap and handed to
/// the volume manager before its event listener starts. The listener matches
/// live netlink device events against it for the rest of the process
/// lifetime.
#[derive(Debug, Default)]
pub struct DiskSourceRegistry {
    sources: Vec<DiskSourceRule>,
    has_adoptable: bool,
}

impl DiskSourceRegistry {
    pub fn add_source(&mut self, rule: DiskSourceRule) {
        tracing::debug!(
            "Adding disk source {} ({}, partnum={})",
            rule.sys_pattern,
            rule.nickname,
            rule.partnum
        );
        self.has_adoptable |= rule.flags.adoptable;
        self.sources.push(rule);
    }

    pub fn sources(&self) -> &[DiskSourceRule] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Whether any registered source is adoptable. The daemon publishes this
    /// once after the listeners are up.
    pub fn has_adoptable(&self) -> bool {
        self.has_adoptable
    }

    /// First rule matching the sysfs path of an incoming device event.
    pub fn match_sys_path(&self, sys_path: &str) -> Option<&DiskSourceRule> {
        self.sources.iter().find(|rule| rule.matches(sys_path))
    }
}
