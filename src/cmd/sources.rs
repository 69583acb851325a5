use anyhow::Result;
use async_trait::async_trait;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::*;

use super::Command;
use crate::bootstrap::{self, BootstrapPaths};
use crate::cli::SourcesOptions;
use crate::disk::{DiskSourceRegistry, PARTNUM_WHOLE_DISK};

pub struct SourcesCommand {
    pub sources_options: SourcesOptions,
}

#[async_trait]
impl Command for SourcesCommand {
    async fn run(&self) -> Result<()> {
        let global_config = crate::config::effective_global_config().await?;

        let paths = BootstrapPaths::from(&self.sources_options.paths);
        let mut registry = DiskSourceRegistry::default();
        bootstrap::populate_disk_sources(
            &paths,
            global_config.force_default_primary(),
            &mut registry,
        )
        .await;

        print_disk_sources_as_table(&registry);

        Ok(())
    }
}

fn print_disk_sources_as_table(registry: &DiskSourceRegistry) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Nickname",
            "Sysfs Pattern",
            "Partition",
            "Filesystem",
            "Mount Options",
            "Flags",
        ]);

    for rule in registry.sources() {
        table.add_row(vec![
            Cell::new(rule.nickname.as_str()),
            Cell::new(rule.sys_pattern.as_str()),
            if rule.partnum == PARTNUM_WHOLE_DISK {
                Cell::new("whole disk").fg(Color::DarkGrey)
            } else {
                Cell::new(rule.partnum)
            },
            if rule.fs_type.is_empty() {
                Cell::new("<auto>").fg(Color::DarkGrey)
            } else {
                Cell::new(rule.fs_type.as_str())
            },
            if rule.mount_opts.is_empty() {
                Cell::new("<none>").fg(Color::DarkGrey)
            } else {
                Cell::new(rule.mount_opts.as_str())
            },
            if rule.flags.is_empty() {
                Cell::new("-").fg(Color::DarkGrey)
            } else {
                Cell::new(rule.flags).fg(Color::Green)
            },
        ]);
    }

    println!("{table}");

    println!(
        "\nhas_adoptable = {}",
        if registry.has_adoptable() { "1" } else { "0" }
    );
}
