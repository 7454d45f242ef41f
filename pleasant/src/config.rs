//! Optional TOML config file for connection defaults.
//!
//! Located at `$XDG_CONFIG_HOME/pleasant/config.toml` (default
//! `~/.config/pleasant/config.toml`). Every value can be overridden by a
//! command-line flag or `PLEASANT_*` environment variable; a missing
//! file just means defaults.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Base URL of the server API, e.g. `https://pleasant.example.com:10001`.
    #[serde(default)]
    pub server_url: Option<String>,
    /// User for the server API. The password is never read from the
    /// config file; use the environment variable or the prompt.
    #[serde(default)]
    pub api_user: Option<String>,
    #[serde(default)]
    pub disable_cert_check: bool,
    /// Default target directory for attachment downloads.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

/// `$XDG_CONFIG_HOME/pleasant/config.toml`, falling back to
/// `~/.config/pleasant/config.toml`.
pub fn default_config_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("pleasant").join("config.toml")
}

/// Load the config from `path` (or the default location).
///
/// A missing file yields defaults. A corrupt file logs a warning and
/// yields defaults rather than hard-blocking the invocation.
pub fn load(path: Option<PathBuf>) -> Config {
    let path = path.unwrap_or_else(default_config_path);
    if !path.exists() {
        return Config::default();
    }
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config file");
            return Config::default();
        }
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            Config::default()
        }
    }
}
