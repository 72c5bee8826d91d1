//! Error types for the runtime
//!
//! Failures travel on two channels:
//! - **Named error effects** are the typed channel. They are resolved by
//!   handler tables and only surface as [`RunError::Effect`] when no scope
//!   catches them.
//! - **Exceptions** are native failures. They unwind frame by frame and may
//!   be caught by program code (see `ProgramExt::catch`).

use crate::types::Val;
use thiserror::Error;

/// Native exception thrown into or out of a program
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Exception {
    /// Raised by program code
    #[error("{0}")]
    Thrown(Val),

    /// Injected at a suspension point when the run is cancelled
    #[error("Operation aborted")]
    Aborted,

    /// A driver met an effect it cannot resolve (e.g. async under `run_sync`)
    #[error("Unexpected effect: {0}")]
    UnexpectedEffect(String),

    /// A context effect no enclosing scope provides
    #[error("Unhandled context: {0}")]
    UnhandledContext(String),

    /// `unwrap` was given a final value that is not a Result
    #[error("Expected a Result value, got {0}")]
    InvalidResult(Val),
}

impl Exception {
    /// Convenience constructor for a thrown message
    pub fn msg(message: impl Into<String>) -> Self {
        Exception::Thrown(Val::Str(message.into()))
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Exception::Aborted)
    }

    /// Value form used in `task-err` results
    pub fn to_val(&self) -> Val {
        match self {
            Exception::Thrown(val) => val.clone(),
            other => Val::Str(other.to_string()),
        }
    }
}

/// Final failure of a run
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// A named error effect escaped every handler table
    #[error("Unhandled error effect {name}: {error}")]
    Effect { name: String, error: Val },

    #[error(transparent)]
    Exception(#[from] Exception),
}

impl RunError {
    /// Name of the escaped effect, if this is an effect failure
    pub fn effect_name(&self) -> Option<&str> {
        match self {
            RunError::Effect { name, .. } => Some(name),
            RunError::Exception(_) => None,
        }
    }
}

/// Invalid runtime or scheduler configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("maxConcurrency must be a positive integer, got {0}")]
    InvalidMaxConcurrency(usize),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}
