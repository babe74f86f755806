//! # Configuration
//!
//! Settings are layered: built-in defaults, then the TOML file, then
//! environment variables, then command-line flags (applied by the CLI).
//!
//! ## Environment Variables
//!
//! - `STOCKROOM_DB`: path to the redb database
//! - `STOCKROOM_ADMIN_KEY`: Bearer token for admin routes (unset = open)
//! - `STOCKROOM_RATE_LIMIT`: requests per second (0 disables)
//! - `STOCKROOM_CORS_ORIGINS`: comma-separated origins, or `*`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stockroom_core::StockroomError;

/// Default config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "stockroom.toml";

/// Default request body limit: 2 MiB.
const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Runtime configuration for the server and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
    /// Bearer token for admin routes.
    pub admin_key: Option<String>,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Allowed CORS origins. Empty means localhost only; `["*"]` allows all.
    pub cors_origins: Vec<String>,
    /// Load the sample catalogue and staff into an empty database.
    pub seed_sample_data: bool,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from("stockroom.db"),
            host: "127.0.0.1".to_string(),
            port: 8080,
            admin_key: None,
            rate_limit: 100,
            cors_origins: Vec::new(),
            seed_sample_data: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, StockroomError> {
        toml::from_str(text)
            .map_err(|e| StockroomError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Load the config file and apply environment overrides.
    ///
    /// A missing file is only an error when it was named explicitly.
    pub fn load(path: &Path, explicit: bool) -> Result<Self, StockroomError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => Self::default(),
            Err(e) => {
                return Err(StockroomError::IoError(format!(
                    "Cannot read config '{}': {}",
                    path.display(),
                    e
                )));
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `STOCKROOM_*` overrides from a variable lookup.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), StockroomError> {
        if let Some(db) = lookup("STOCKROOM_DB").filter(|v| !v.is_empty()) {
            self.database = PathBuf::from(db);
        }
        if let Some(key) = lookup("STOCKROOM_ADMIN_KEY") {
            self.admin_key = Some(key);
        }
        if let Some(limit) = lookup("STOCKROOM_RATE_LIMIT") {
            self.rate_limit = limit.trim().parse().map_err(|_| {
                StockroomError::InvalidInput(format!(
                    "STOCKROOM_RATE_LIMIT must be a non-negative integer, got '{}'",
                    limit
                ))
            })?;
        }
        if let Some(origins) = lookup("STOCKROOM_CORS_ORIGINS") {
            self.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// The admin key, if one is configured and non-empty.
    #[must_use]
    pub fn admin_key(&self) -> Option<&str> {
        self.admin_key.as_deref().filter(|k| !k.is_empty())
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================
