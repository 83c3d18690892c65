use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_DATA_ROOT: &str = "~/Documents/Loomlance";
pub const DEFAULT_WRITE_DELAY_MS: u64 = 250;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding one JSON document per storage key. `~` is expanded.
    pub data_root: String,
    /// How long a save may wait to be coalesced with later ones.
    pub write_delay_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: DEFAULT_DATA_ROOT.to_string(),
            write_delay_ms: DEFAULT_WRITE_DELAY_MS,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// `settings.toml` in the platform config directory.
    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = ProjectDirs::from("com", "loomlance", "app") {
            return proj_dirs.config_dir().join("settings.toml");
        }
        PathBuf::from("settings.toml")
    }

    /// Missing file means defaults; an unreadable or malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let toml_str = toml::to_string_pretty(self)?;
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, toml_str)
        };
        write().map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}
