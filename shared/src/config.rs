//! Configuration loaded from a JSON file.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::{Error, Result};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "./init/config.json";

/// Application configuration.
///
/// Keys are PascalCase on disk (`Port`, `TestUserToken`, ...). Every key is
/// optional and falls back to its default.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    /// Port to listen on, kept as a string to match the file format
    pub port: String,
    /// Token of the user provisioned at startup; empty disables provisioning
    pub test_user_token: String,
    /// SQLite database file
    pub database_path: String,
    /// Database pool size
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: "8080".to_string(),
            test_user_token: String::new(),
            database_path: "./build/calendar.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// An unreadable file is not fatal: a warning is logged and defaults are
    /// used. A file that exists but does not parse is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file not readable, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Port as a number.
    pub fn port(&self) -> Result<u16> {
        self.port
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid port {:?}: {}", self.port, e)))
    }

    /// Bootstrap user token, if one is configured.
    pub fn test_user_token(&self) -> Option<&str> {
        (!self.test_user_token.is_empty()).then_some(self.test_user_token.as_str())
    }
}
