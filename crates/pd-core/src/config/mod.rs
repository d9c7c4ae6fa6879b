//! Configuration management for the PlanDrop relay

mod relay;
pub mod serde_utils;

pub use relay::RelayConfig;

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory (`~/.plandrop`)
pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".plandrop")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Read a `pd_core` TOML config such as [`RelayConfig`].
///
/// A missing file is reported as [`ConfigError::NotFound`] so callers can
/// fall back to defaults without treating it as a failure.
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Invalid(format!("cannot read {}: {}", path.display(), e)),
    })?;

    Ok(toml::from_str(&text)?)
}
