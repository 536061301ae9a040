use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::BridgeConfig,
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "chatbridge.toml",
    "chatbridge.yaml",
    "chatbridge.yml",
    "chatbridge.json",
];

/// Load config from the given path (format chosen by extension).
pub fn load_config(path: &Path) -> Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path).with_context(|| format!("invalid config {}", path.display()))
}

/// Find and load the config file from the standard locations.
///
/// Search order:
/// 1. `./chatbridge.{toml,yaml,yml,json}`
/// 2. `<user config dir>/chatbridge/chatbridge.{toml,yaml,yml,json}`
///
/// Unlike most tools the relay has nothing sensible to run without endpoint
/// URLs, so a missing file is an error.
pub fn discover_and_load() -> Result<(PathBuf, BridgeConfig)> {
    let path = find_config_file().ok_or_else(|| Error::NotFound {
        searched: CONFIG_FILENAMES.join(", "),
    })?;
    debug!(path = %path.display(), "loading config");
    let config = load_config(&path)?;
    Ok((path, config))
}

/// Find the first config file in the standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists());
    if local.is_some() {
        return local;
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/chatbridge/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "chatbridge").map(|d| d.config_dir().to_path_buf())
}

/// Parse already-substituted config text; `path` only selects the format.
pub fn parse_config(raw: &str, path: &Path) -> Result<BridgeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        other => Err(Error::UnsupportedFormat(other.to_string())),
    }
}
