use std::{env, path::PathBuf};

use thiserror::Error;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 3000;

/// Where the server keeps its data and finds the site
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// The JSON document holding all state
    pub data_path: PathBuf,
    /// Static files are served from here
    pub site_root: PathBuf,
    /// Public address of the site, used to build sitemap urls
    pub site_url: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a port number, got \"{value}\"")]
    InvalidPort { name: &'static str, value: String },
}

impl Config {
    pub const PORT_VAR: &'static str = "CABLINE_SERVER_PORT";
    pub const DATA_PATH_VAR: &'static str = "CABLINE_DATA_PATH";
    pub const SITE_ROOT_VAR: &'static str = "CABLINE_SITE_ROOT";
    pub const SITE_URL_VAR: &'static str = "CABLINE_SITE_URL";

    /// Reads the config from the environment, falling back to defaults for anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match var(Self::PORT_VAR) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidPort {
                name: Self::PORT_VAR,
                value,
            })?,
            None => defaults.port,
        };

        Ok(Self {
            port,
            data_path: var(Self::DATA_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            site_root: var(Self::SITE_ROOT_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.site_root),
            site_url: var(Self::SITE_URL_VAR).unwrap_or(defaults.site_url),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from("backend/db.json"),
            site_root: PathBuf::from("."),
            site_url: format!("http://localhost:{}", DEFAULT_PORT),
        }
    }
}

/// Unset and empty variables are treated the same
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
