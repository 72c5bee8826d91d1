//! Initialization for Cadence
//!
//! Loads configuration once per process and installs the `tracing`
//! subscriber. Binaries call this before running programs; library users
//! that bring their own subscriber can skip tracing setup.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_core::init::InitBuilder;
//!
//! let config = InitBuilder::new()
//!     .config_path("cadence.toml")
//!     .max_concurrency(8)
//!     .init()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Context, Result};
use std::sync::OnceLock;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Global initialization state
static INIT_STATE: OnceLock<InitState> = OnceLock::new();

#[derive(Debug)]
struct InitState {
    config: Config,
}

/// Options for initializing Cadence
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Config file path (overrides default search)
    pub config_path: Option<String>,

    /// Default scheduler bound (overrides config file and env vars)
    pub max_concurrency: Option<usize>,

    /// Log filter (overrides config file and env vars; `RUST_LOG` still wins)
    pub log_filter: Option<String>,

    /// Whether to install the global tracing subscriber
    pub install_tracing: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            max_concurrency: None,
            log_filter: None,
            install_tracing: true,
        }
    }
}

/// Builder for constructing InitOptions
pub struct InitBuilder {
    options: InitOptions,
}

impl InitBuilder {
    pub fn new() -> Self {
        Self {
            options: InitOptions::default(),
        }
    }

    pub fn config_path(mut self, path: impl Into<String>) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.options.max_concurrency = Some(max);
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.options.log_filter = Some(filter.into());
        self
    }

    pub fn install_tracing(mut self, install: bool) -> Self {
        self.options.install_tracing = install;
        self
    }

    pub fn init(self) -> Result<&'static Config> {
        initialize(self.options)
    }
}

impl Default for InitBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize Cadence with the given options
///
/// Calling this more than once is safe; later calls return the configuration
/// loaded by the first one.
pub fn initialize(options: InitOptions) -> Result<&'static Config> {
    if let Some(state) = INIT_STATE.get() {
        return Ok(&state.config);
    }

    let mut builder = Config::builder();
    if let Some(path) = options.config_path {
        builder = builder.config_path(path);
    }
    if let Some(max) = options.max_concurrency {
        builder = builder.max_concurrency(max);
    }
    if let Some(filter) = options.log_filter {
        builder = builder.log_filter(filter);
    }
    let config = builder.build().context("Failed to load configuration")?;

    if options.install_tracing {
        install_tracing(&config.logging.filter)?;
    }

    let state = INIT_STATE.get_or_init(|| InitState { config });
    debug!(config = ?state.config, "cadence initialized");
    Ok(&state.config)
}

fn install_tracing(filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter).context("Invalid log filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Check if Cadence has been initialized
pub fn is_initialized() -> bool {
    INIT_STATE.get().is_some()
}

/// Configuration loaded by `initialize`, if it has run
pub fn get_config() -> Option<&'static Config> {
    INIT_STATE.get().map(|state| &state.config)
}
