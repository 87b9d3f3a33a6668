//! Resolved CLI settings.
//!
//! Flags win over `GOBARBER_*` environment variables (clap handles that
//! precedence); this module normalizes the result and fills in the default
//! session file location.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::CliError;

pub const DEFAULT_API_URL: &str = "http://localhost:3333";
/// Session file name inside the data directory.
pub const STORE_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Backend base URL without a trailing slash.
    pub api_url: String,
    /// JSON file holding the persisted session.
    pub store_path: PathBuf,
}

impl CliConfig {
    /// Resolve against the platform data directory.
    pub fn resolve(api_url: &str, store_path: Option<PathBuf>) -> Result<Self, CliError> {
        Self::from_parts(api_url, store_path, default_data_dir())
    }

    /// Build from already-gathered inputs; `data_dir` is only consulted when no
    /// explicit store path was given.
    pub fn from_parts(
        api_url: &str,
        store_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, CliError> {
        let api_url = api_url.trim().trim_end_matches('/');
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(CliError::InvalidApiUrl(api_url.to_owned()));
        }
        let store_path = match store_path {
            Some(path) => path,
            None => data_dir.ok_or(CliError::NoDataDir)?.join(STORE_FILE),
        };
        Ok(Self { api_url: api_url.to_owned(), store_path })
    }
}

fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "gobarber", "gobarber").map(|dirs| dirs.data_dir().to_path_buf())
}
