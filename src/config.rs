//! Module defining the settings captured when a session is configured

use std::path::{Path, PathBuf};

/// Name of the setting holding the base directory of fixture data files.
pub const FIXTURE_PATH_SETTING: &str = "fixture_path";

/// Environment variable overriding the base directory.
pub const FIXTURE_PATH_ENV: &str = "DATA_FIXTURES_PATH";

const DEFAULT_FIXTURE_PATH: &str = "data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base directory the relative data paths of fixtures are resolved against
    pub fixture_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fixture_path: PathBuf::from(DEFAULT_FIXTURE_PATH),
        }
    }
}

impl Config {
    pub fn new(fixture_path: impl Into<PathBuf>) -> Self {
        Self {
            fixture_path: fixture_path.into(),
        }
    }

    /// Takes the base directory from `DATA_FIXTURES_PATH`, falling back to `data`.
    pub fn from_env() -> Self {
        match std::env::var_os(FIXTURE_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::default(),
        }
    }

    /// Joins `relative` onto the base directory. Absolute paths are returned as they are.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.fixture_path.join(relative)
    }
}
