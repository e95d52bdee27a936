//! Configuration management for fetchbatch
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//! 4. Command-line flags (applied by the caller after loading)
//!
//! # Environment Variables
//!
//! Any setting can be overridden with `FETCHBATCH__<section>__<key>`:
//! - `FETCHBATCH__DOWNLOAD__RETRY_ATTEMPT=5`
//! - `FETCHBATCH__DOWNLOAD__CONCURRENCY_LIMIT=32`
//! - `FETCHBATCH__HTTP__REQUEST_TIMEOUT_SECS=15`
//!
//! The proxy may also be given as `FETCHBATCH_PROXY`.
//!
//! # Configuration File
//!
//! By default settings are read from `fetchbatch.toml` in the working
//! directory. Override with `--config` or the `FETCHBATCH_CONFIG` variable.
//!
//! ```toml
//! [download]
//! retry_attempt = 3
//! method = "fetch"
//! concurrency_limit = 10
//!
//! [output]
//! dir = "result"
//! failed_output = "failed.txt"
//! ```

mod models;
mod sources;
mod validation;

pub use models::{
    CurlSettings, DownloadSettings, HttpSettings, MockSettings, OutputSettings, Settings,
};
pub use validation::ValidationError;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Settings {
    /// Load settings from all sources (file + environment)
    ///
    /// `explicit_path` wins over `FETCHBATCH_CONFIG`, which wins over the
    /// default `fetchbatch.toml`. A missing file is not an error.
    pub fn load(explicit_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let settings = sources::load(explicit_path)?;
        validation::validate(&settings)?;
        Ok(settings)
    }

    /// Load settings from a specific path, without `.env` handling
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let settings = sources::load_from_sources(path)?;
        validation::validate(&settings)?;
        Ok(settings)
    }

    /// Re-check after command-line overrides were applied
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate(self)?;
        Ok(())
    }
}
