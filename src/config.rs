// src/config.rs

//! Configuration loading utilities.
//!
//! This module finds the config file inside the storage directory, validates
//! it and resolves where the state file lives.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::models::{Config, Target};

/// Config file names tried in order.
const CONFIG_FILES: [&str; 2] = ["config.toml", "config.json"];

/// A validated configuration ready for a run.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    pub targets: Vec<Target>,
    pub config_path: PathBuf,
    pub data_path: PathBuf,
}

/// Locate the config file inside `storage_dir`.
pub fn find_config(storage_dir: &Path) -> Result<PathBuf> {
    CONFIG_FILES
        .iter()
        .map(|name| storage_dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            AppError::config(format!(
                "no config file in {}, nothing to do",
                storage_dir.display()
            ))
        })
}

/// Load, validate and resolve everything a run needs.
pub fn load_all(storage_dir: &Path) -> Result<LoadedConfig> {
    let config_path = find_config(storage_dir)?;
    log::debug!("Config is at {}", config_path.display());

    let config = Config::load(&config_path)?;
    config.validate()?;
    let targets = config.targets()?;
    let data_path = config.data_path(storage_dir);
    log::debug!("Data is at {}", data_path.display());

    if targets.is_empty() {
        log::warn!("No targets configured in {}", config_path.display());
    }

    Ok(LoadedConfig {
        config,
        targets,
        config_path,
        data_path,
    })
}
