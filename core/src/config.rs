//! Runtime configuration
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. TOML file: `CADENCE_CONFIG_PATH` or an explicit path (required), else
//!    `cadence.toml` in the working directory (optional)
//! 3. Environment variables: `CADENCE_RUNTIME__MAX_CONCURRENCY`,
//!    `CADENCE_LOGGING__FILTER` (a `.env` file is loaded first)
//! 4. Explicit builder overrides

use ::config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::task::TaskOptions;

pub const CONFIG_PATH_ENV: &str = "CADENCE_CONFIG_PATH";
const DEFAULT_CONFIG_FILE: &str = "cadence.toml";
const ENV_PREFIX: &str = "CADENCE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Default bound on in-flight tasks; `None` is unbounded
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "info".to_string()
}

impl Config {
    /// Load from the default sources
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder().build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(0) = self.runtime.max_concurrency {
            return Err(ConfigError::InvalidMaxConcurrency(0));
        }
        Ok(())
    }

    /// Scheduler options carrying the configured bound
    pub fn task_options(&self) -> TaskOptions {
        TaskOptions {
            max_concurrency: self.runtime.max_concurrency,
            abort_signal: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config_path: Option<String>,
    max_concurrency: Option<usize>,
    log_filter: Option<String>,
}

impl ConfigBuilder {
    /// Read this file instead of searching; it must exist
    pub fn config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        // A missing .env file is not an error
        let _ = dotenvy::dotenv();

        let file = match self
            .config_path
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        {
            Some(path) => File::new(&path, FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        let mut builder = ::config::Config::builder()
            .set_default("logging.filter", default_filter())?
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Some(max) = self.max_concurrency {
            builder = builder.set_override("runtime.max_concurrency", max as i64)?;
        }
        if let Some(filter) = self.log_filter {
            builder = builder.set_override("logging.filter", filter)?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}
