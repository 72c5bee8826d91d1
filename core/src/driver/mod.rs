//! Execution drivers
//!
//! Drivers own a [`VM`] for the duration of one run and decide what happens
//! when the program suspends on an async effect:
//! - [`run_sync`] refuses: the run fails with `UnexpectedEffect("async")`
//!   after its live cleanups have run.
//! - [`run_async`] awaits the future, racing it against the abort signal.

pub mod abort;

#[cfg(test)]
mod tests;

use tracing::{debug, debug_span, Instrument};
use uuid::Uuid;

use crate::error::{Exception, RunError};
use crate::interpreter::vm::unexpected_async;
use crate::interpreter::{run_until_suspended, VM};
use crate::program::{Program, Resume};
use crate::types::{Outcome, Val};

pub use abort::{AbortController, AbortSignal};

/// Options accepted by every async-capable driver
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub abort_signal: Option<AbortSignal>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort_signal = Some(signal);
        self
    }
}

/* ===================== Sync ===================== */

/// Drive a program to completion without an async runtime
pub fn run_sync<P: Program + 'static>(program: P) -> Result<Val, RunError> {
    let mut vm = VM::new(program);

    while run_until_suspended(&mut vm).is_some() {
        // Dropping the future abandons it
        vm.fail(unexpected_async());
    }

    finish(vm)
}

/* ===================== Async ===================== */

/// Drive a program to completion, awaiting its async effects
pub async fn run_async<P: Program + 'static>(
    program: P,
    options: RunOptions,
) -> Result<Val, RunError> {
    let run_id = Uuid::new_v4();
    let vm = VM::new(program).with_signal(options.abort_signal);

    drive(vm).instrument(debug_span!("run", %run_id)).await
}

/// Async driver loop shared by `run_async` and scheduled tasks
///
/// Every suspension outside a cleanup checks the signal, so a program that
/// catches the abort is aborted again at its next suspension.
pub(crate) async fn drive(mut vm: VM) -> Result<Val, RunError> {
    let signal = vm.signal().cloned();

    debug!("run started");

    while let Some(future) = run_until_suspended(&mut vm) {
        let input = match &signal {
            Some(signal) if !vm.in_cleanup() => {
                let resolved = if signal.is_aborted() {
                    None
                } else {
                    tokio::select! {
                        biased;
                        _ = signal.aborted() => None,
                        result = future => Some(Resume::from(result)),
                    }
                };
                resolved.unwrap_or_else(|| {
                    debug!("abort delivered at suspension point");
                    Resume::Throw(Exception::Aborted)
                })
            }
            _ => Resume::from(future.await),
        };

        vm.resume(input);
    }

    let outcome = finish(vm);
    debug!(ok = outcome.is_ok(), "run finished");
    outcome
}

fn finish(vm: VM) -> Result<Val, RunError> {
    match vm.into_outcome() {
        Some(outcome) => outcome,
        None => unreachable!("driver loop exits only once the run has finished"),
    }
}

/* ===================== Result Drivers ===================== */

impl Outcome {
    /// `run_sync`, reporting error effects as `Outcome::Err`
    ///
    /// Native exceptions are still returned as `Err`.
    pub fn run_sync<P: Program + 'static>(program: P) -> Result<Outcome, Exception> {
        settle(run_sync(program))
    }

    /// `run_async`, reporting error effects as `Outcome::Err`
    pub async fn run_async<P: Program + 'static>(
        program: P,
        options: RunOptions,
    ) -> Result<Outcome, Exception> {
        settle(run_async(program, options).await)
    }
}

fn settle(result: Result<Val, RunError>) -> Result<Outcome, Exception> {
    match result {
        Ok(value) => Ok(Outcome::Ok { value }),
        Err(RunError::Effect { name, error }) => Ok(Outcome::Err { name, error }),
        Err(RunError::Exception(error)) => Err(error),
    }
}
