use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Configuration related to the volumed bootstrap phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot: Option<BootConfig>,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct BootConfig {
    /// Enable this option if you want to see more log when volumed is
    /// populating disk sources and triggering device rediscovery.
    #[serde(default = "Default::default")]
    pub verbose: bool,

    /// Debug override: mark every managed disk source as default-primary,
    /// regardless of the fstab flags.
    #[serde(default = "Default::default")]
    pub force_default_primary: bool,
}

impl GlobalConfig {
    pub fn force_default_primary(&self) -> bool {
        self.boot
            .as_ref()
            .map(|boot| boot.force_default_primary)
            .unwrap_or(false)
    }

    pub fn verbose(&self) -> bool {
        self.boot
            .as_ref()
            .map(|boot| boot.verbose)
            .unwrap_or(false)
    }
}

#[cfg(test)]
pub mod tests {

    use super::*;
    use anyhow::Result;

    #[test]
    fn test_deserialize_empty_config() -> Result<()> {
        let raw = "";

        let config: GlobalConfig = toml::from_str(raw)?;
        assert_eq!(config, GlobalConfig { boot: None });
        assert!(!config.force_default_primary());
        assert!(!config.verbose());

        let raw = r#"
[boot]
        "#;
        let config: GlobalConfig = toml::from_str(raw)?;
        assert_eq!(
            config,
            GlobalConfig {
                boot: Some(BootConfig {
                    verbose: false,
                    force_default_primary: false,
                }),
            }
        );

        Ok(())
    }

    #[test]
    fn test_deserialize_boot_options() -> Result<()> {
        let raw = r#"
[boot]
verbose = true
force_default_primary = true
        "#;
        let config: GlobalConfig = toml::from_str(raw)?;
        assert!(config.verbose());
        assert!(config.force_default_primary());

        Ok(())
    }

    #[test]
    fn test_deserialize_wrong_config() -> Result<()> {
        let raw = r#"
        [bootddddd]
        "#;
        assert!(toml::from_str::<GlobalConfig>(raw).is_err());

        let raw = r#"
        [boot]
        unknown_option = true
        "#;
        assert!(toml::from_str::<GlobalConfig>(raw).is_err());

        Ok(())
    }
}
