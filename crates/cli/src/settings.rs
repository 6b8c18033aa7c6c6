//! Layered configuration for the CLI.
//!
//! Sources, later ones winning:
//!
//! 1. built-in defaults
//! 2. `benchwatch.toml` in the working directory, or the file given with `--config`
//! 3. environment variables prefixed `BENCHWATCH_`, with `__` separating
//!    nested keys (`BENCHWATCH_DETECTOR__THRESHOLD_RATIO=2.0`)
//!
//! A `.env` file is loaded into the environment first if present.

use anyhow::{Context, Result};
use benchwatch_core::DetectorConfig;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "benchwatch.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "BENCHWATCH";

/// Effective CLI settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Artifact path used when `--data` is not given.
    pub data_file: Option<PathBuf>,
    /// Repository URL used when a new ledger has to be created.
    pub repo_url: Option<String>,
    /// Regression detection policy.
    pub detector: DetectorConfig,
}

impl Settings {
    /// Load settings from the default sources, with an optional explicit file.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        check_dotenv(dotenvy::dotenv())?;
        Self::load_from(config_file, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_from(config_file: Option<&Path>, env: Environment) -> Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        settings
            .detector
            .validate()
            .context("invalid detector configuration")?;
        Ok(settings)
    }
}

/// A missing `.env` is fine; an unreadable or malformed one is not.
fn check_dotenv<T>(result: dotenvy::Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(err).context("failed to load .env"),
    }
}
