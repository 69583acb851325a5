pub mod fstab;
pub mod global;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use lazy_static::lazy_static;
use tokio::sync::RwLock;

use global::GlobalConfig;

pub const VOLUMED_CONFIG_DIR_DEFAULT: &str = "/etc/volumed";

lazy_static! {
    // None means nobody overrode the default dir.
    static ref CONFIG_DIR: RwLock<Option<PathBuf>> = RwLock::new(None);
    static ref GLOBAL_CONFIG_CACHE: RwLock<Option<GlobalConfig>> = RwLock::new(None);
}

pub async fn set_config_dir(config_dir: impl Into<PathBuf>) {
    *CONFIG_DIR.write().await = Some(config_dir.into());
}

pub async fn get_config_dir() -> PathBuf {
    CONFIG_DIR
        .read()
        .await
        .clone()
        .unwrap_or_else(|| PathBuf::from(VOLUMED_CONFIG_DIR_DEFAULT))
}

async fn is_config_dir_explicit() -> bool {
    CONFIG_DIR.read().await.is_some()
}

/// Load `global.toml` from the given config dir. A missing file is not an
/// error and yields `None`.
pub async fn load_global_config(config_dir: impl AsRef<Path>) -> Result<Option<GlobalConfig>> {
    let config_path = config_dir.as_ref().join("global.toml");

    tracing::debug!("Loading global config from: {config_path:?}");
    if !config_path.exists() {
        tracing::debug!("Global config not found, skip: {config_path:?}");
        return Ok(None);
    }

    let global_config = tokio::fs::read_to_string(&config_path)
        .await
        .map_err(anyhow::Error::from)
        .and_then(|content| {
            toml::from_str::<GlobalConfig>(&content).context("Failed to parse content as TOML")
        })
        .with_context(|| format!("Failed to load global config from: {config_path:?}"))?;

    Ok(Some(global_config))
}

/// Load the global config applying the config-dir policy: a broken config in
/// an explicitly-given dir is a hard error, while the default dir degrades to
/// defaults with a warning so the daemon still comes up.
pub async fn load_global_config_with_policy(
    config_dir: impl AsRef<Path>,
    explicit: bool,
) -> Result<GlobalConfig> {
    match load_global_config(config_dir).await {
        Ok(config) => Ok(config.unwrap_or_default()),
        Err(e) if !explicit => {
            tracing::warn!("Ignoring broken global config in default config dir: {e:#}");
            Ok(GlobalConfig::default())
        }
        Err(e) => Err(e),
    }
}

/// The global config for the current config dir, loaded at most once per
/// process.
pub async fn effective_global_config() -> Result<GlobalConfig> {
    let read = GLOBAL_CONFIG_CACHE.read().await;
    match &*read {
        None => {
            drop(read);

            let mut write = GLOBAL_CONFIG_CACHE.write().await;
            // Double check
            match &*write {
                None => {
                    let config = load_global_config_with_policy(
                        get_config_dir().await,
                        is_config_dir_explicit().await,
                    )
                    .await?;
                    *write = Some(config.clone());
                    Ok(config)
                }
                Some(v) => Ok(v.clone()),
            }
        }
        Some(v) => Ok(v.clone()),
    }
}
