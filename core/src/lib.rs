pub mod benchmark;
pub mod cli;
pub mod config;
pub mod driver;
pub mod effects;
pub mod error;
pub mod init;
pub mod interpreter;
pub mod program;
pub mod task;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types
pub use types::*;

pub use driver::{run_async, run_sync, AbortController, AbortSignal, RunOptions};
pub use effects::{awaiting, get_ctx, get_opt, ready, sleep, throw_err, unwrap, wrap};
pub use error::{ConfigError, Exception, RunError};
pub use interpreter::{HandlerTable, Try};
pub use program::{BoxProgram, Program, ProgramExt};
pub use task::{
    all, all_settled, concurrent, object, race, race_result, tuple, TaskItem, TaskOptions,
    TaskSource, TaskStream,
};

// Re-export init API for convenience
pub use init::{initialize, InitBuilder, InitOptions};
