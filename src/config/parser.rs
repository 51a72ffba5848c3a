//! TOML file parsing with file-path context.

use anyhow::{Context, Result};
use std::path::Path;

use crate::core::RulesmithError;

/// Parse a TOML configuration file into `T`.
///
/// A read failure keeps the I/O error as its cause. A syntax or schema error
/// becomes [`RulesmithError::ConfigParseError`] naming the file.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content, path)
}

/// Parse configuration text that was read from `path`.
pub fn parse_config_str<T>(content: &str, path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    toml::from_str(content).map_err(|e| {
        RulesmithError::ConfigParseError {
            file: path.display().to_string(),
            reason: e.message().to_string(),
        }
        .into()
    })
}
