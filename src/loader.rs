//! Config file discovery and loading.
//!
//! Handles finding the config file and parsing it by extension. Without an
//! explicit path the search order is:
//!
//! 1. `$XDG_CONFIG_HOME/ultimux/config.{yml,yaml,toml}`
//! 2. `~/.config/ultimux/config.{yml,yaml,toml}`
//! 3. `~/.ultimux/ultimux.yml`

use crate::config::ConfigFile;
use crate::error::{Result, UltimuxError};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ultimux";
const CONFIG_NAMES: [&str; 3] = ["config.yml", "config.yaml", "config.toml"];

/// Config formats understood by [`load_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yml" | "yaml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => {
            let home = dirs::home_dir().ok_or(UltimuxError::NoConfigDir)?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(path)),
    }
}

/// Candidate config paths in search order.
fn candidates() -> Vec<PathBuf> {
    let mut dirs_to_search = Vec::new();
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        dirs_to_search.push(PathBuf::from(xdg).join(APP_DIR));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_search.push(home.join(".config").join(APP_DIR));
    }

    let mut paths: Vec<PathBuf> = dirs_to_search
        .iter()
        .flat_map(|dir| CONFIG_NAMES.iter().map(move |name| dir.join(name)))
        .collect();
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(format!(".{}", APP_DIR)).join("ultimux.yml"));
    }
    paths
}

/// Determine the config file path.
///
/// An explicit path wins (with `~/` expanded). Otherwise the first existing
/// candidate is used.
///
/// # Errors
///
/// - [`UltimuxError::NoConfigDir`] if the home directory cannot be determined
/// - [`UltimuxError::ConfigNotFound`] if no candidate exists
pub fn resolve_config_path(explicit: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return expand_home(path);
    }

    let candidates = candidates();
    if let Some(found) = candidates.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let home = dirs::home_dir().ok_or(UltimuxError::NoConfigDir)?;
    Err(UltimuxError::ConfigNotFound(
        home.join(".config").join(APP_DIR).join(CONFIG_NAMES[0]),
    ))
}

/// Load and parse a config file from the given path.
///
/// # Errors
///
/// - [`UltimuxError::ConfigNotFound`] if the file doesn't exist
/// - [`UltimuxError::UnsupportedFormat`] for extensions other than yml/yaml/toml
/// - [`UltimuxError::Io`] if reading fails
/// - [`UltimuxError::YamlParse`] / [`UltimuxError::TomlParse`] on parse errors
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        return Err(UltimuxError::ConfigNotFound(path.to_path_buf()));
    }
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| UltimuxError::UnsupportedFormat(path.to_path_buf()))?;

    let contents = std::fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), ?format, "loading config");
    match format {
        ConfigFormat::Yaml => ConfigFile::from_yaml_str(&contents),
        ConfigFormat::Toml => ConfigFile::from_toml_str(&contents),
    }
}
