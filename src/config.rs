use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::storage::STORAGE_KEY;

/// User settings, read from `config.toml`.
///
/// Every key is optional:
///
/// ```toml
/// data_file = "/home/me/planer.json"
/// pomodoro_minutes = 25
/// short_break_minutes = 5
/// long_break_minutes = 15
/// long_break_every = 4
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub data_file: Option<PathBuf>,
    pub pomodoro_minutes: u64,
    pub short_break_minutes: u64,
    pub long_break_minutes: u64,
    /// A long break replaces the short one after this many pomodoros.
    pub long_break_every: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: None,
            pomodoro_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            long_break_every: 4,
        }
    }
}

impl Config {
    /// Loads the config from `PLANER_CONFIG` or the platform config dir.
    ///
    /// A missing file gives the defaults.
    pub fn load() -> Result<Config> {
        match config_path() {
            Some(path) if path.exists() => Config::from_file(&path),
            _ => Ok(Config::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let s = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&s)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Returns the path of the data file.
    ///
    /// The path is determined in the following order:
    /// 1. `PLANER_DB` environment variable.
    /// 2. `data_file` from the config.
    /// 3. `~/.local/share/planer/planer_app.json` (on Linux).
    /// 4. `./planer_app.json` (fallback).
    pub fn data_path(&self) -> PathBuf {
        if let Ok(p) = std::env::var("PLANER_DB") {
            return PathBuf::from(p);
        }
        if let Some(p) = &self.data_file {
            return p.clone();
        }
        match dirs::data_local_dir() {
            Some(mut p) => {
                p.push("planer");
                p.push(format!("{}.json", STORAGE_KEY));
                p
            }
            None => PathBuf::from(format!("{}.json", STORAGE_KEY)),
        }
    }

    pub fn pomodoro(&self) -> Duration {
        Duration::from_secs(self.pomodoro_minutes.saturating_mul(60))
    }

    pub fn short_break(&self) -> Duration {
        Duration::from_secs(self.short_break_minutes.saturating_mul(60))
    }

    pub fn long_break(&self) -> Duration {
        Duration::from_secs(self.long_break_minutes.saturating_mul(60))
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("PLANER_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let mut p = dirs::config_dir()?;
    p.push("planer");
    p.push("config.toml");
    Some(p)
}
