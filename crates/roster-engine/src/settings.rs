use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Backing file used when nothing else is configured.
pub const DEFAULT_FILE: &str = "students.json";

/// Per-directory config, relative to the working directory.
pub const CONFIG_PATH: &str = ".roster/config.json";

/// On-disk shape of `.roster/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Where the resolved backing-file path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    /// `--file` or `ROSTER_FILE`.
    Cli,
    ConfigFile,
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub file: PathBuf,
    pub source: SettingsSource,
}

impl Settings {
    /// Resolve settings against the current directory.
    pub fn resolve(cli_file: Option<PathBuf>) -> Self {
        Self::resolve_in(Path::new("."), cli_file)
    }

    /// Resolve settings: CLI/env (highest) → `.roster/config.json` → default.
    ///
    /// Relative paths from the config file are taken relative to `dir`.
    pub fn resolve_in(dir: &Path, cli_file: Option<PathBuf>) -> Self {
        if let Some(file) = cli_file {
            return Self {
                file,
                source: SettingsSource::Cli,
            };
        }
        if let Some(file) = load_config(dir).and_then(|c| c.file) {
            return Self {
                file: dir.join(file),
                source: SettingsSource::ConfigFile,
            };
        }
        Self {
            file: dir.join(DEFAULT_FILE),
            source: SettingsSource::Default,
        }
    }
}

/// Load `.roster/config.json` under `dir`. Missing or invalid config is ignored.
pub fn load_config(dir: &Path) -> Option<ConfigFile> {
    let path = dir.join(CONFIG_PATH);
    if !path.exists() {
        return None;
    }
    match read_config(&path) {
        Ok(config) => Some(config),
        Err(e) => {
            debug!(path = %path.display(), error = %format!("{e:#}"), "ignoring config");
            None
        }
    }
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{}: invalid config JSON", path.display()))
}

/// Write `.roster/config.json` under `dir`, creating the directory. Returns its path.
pub fn write_config(dir: &Path, config: &ConfigFile) -> Result<PathBuf> {
    let path = dir.join(CONFIG_PATH);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).with_context(|| format!("cannot write config {}", path.display()))?;
    Ok(path)
}
