use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::common::types::AnyResult;
use crate::configs::*;

/// Environment variable naming an alternative settings file.
pub const CONFIG_ENV: &str = "RESAMPLE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "resample.toml";

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Config {
  #[serde(default)]
  pub resample: ResampleConfig,
  pub logging: Option<LoggingConfig>,
}

impl Config {
  /// Read `$RESAMPLE_CONFIG` or `./resample.toml`. A missing default file
  /// yields the defaults; a missing file named by the variable is an error.
  pub fn load() -> AnyResult<Self> {
    let (config_path, explicit) = match std::env::var_os(CONFIG_ENV) {
      Some(path) => (PathBuf::from(path), true),
      None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    if !config_path.exists() {
      if explicit {
        return Err(format!("{} not found", config_path.display()).into());
      }
      return Ok(Self::default());
    }

    let config_str = std::fs::read_to_string(&config_path)?;
    Self::from_toml(&config_str)
  }

  pub fn from_toml(config_str: &str) -> AnyResult<Self> {
    let config: Config = toml::from_str(config_str)?;
    if config.resample.block_frames == 0 {
      return Err("resample.block_frames must be positive".into());
    }
    Ok(config)
  }
}
