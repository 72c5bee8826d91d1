//! Control flow and execution frame types

use std::sync::Arc;

use super::handlers::HandlerTable;
use crate::error::{Exception, RunError};
use crate::program::{BoxProgram, Resume};
use crate::types::Val;

/* ===================== Control Flow ===================== */

/// What the VM does on its next step
pub(crate) enum Control {
    /// Resume the top program frame with a value or exception
    Resume(Resume),
    /// A frame finished; hand the completion to the frame below
    Unwind(Completion),
    /// Waiting on an async effect; `VM::resume` continues
    Suspended,
    /// Stack is empty
    Finished(Result<Val, RunError>),
}

/// How a frame left the stack
#[derive(Debug)]
pub(crate) enum Completion {
    Return(Val),
    Throw(Exception),
    Raise(Raise),
    /// Driver failure: skips program frames and every catch, still runs cleanups
    Fault(Exception),
}

impl Completion {
    pub(crate) fn into_outcome(self) -> Result<Val, RunError> {
        match self {
            Completion::Return(val) => Ok(val),
            Completion::Throw(error) | Completion::Fault(error) => {
                Err(RunError::Exception(error))
            }
            Completion::Raise(raise) => Err(RunError::Effect {
                name: raise.name,
                error: raise.error,
            }),
        }
    }
}

/// An error effect unwinding toward the scope that catches it
#[derive(Debug)]
pub(crate) struct Raise {
    pub name: String,
    pub error: Val,
    /// Index of the catching scope frame; `None` fails the run
    pub target: Option<usize>,
}

/* ===================== Frames ===================== */

/// One entry of the VM's frame stack, innermost last
pub(crate) enum Frame {
    /// A suspended program waiting for its resume value
    Program(BoxProgram),
    /// An entered try-scope
    Scope(ScopeFrame),
}

pub(crate) struct ScopeFrame {
    pub table: Arc<HandlerTable>,
    pub cleanup: Option<BoxProgram>,
    pub phase: ScopePhase,
}

pub(crate) enum ScopePhase {
    /// Body is running
    Body,
    /// Cleanup is running; holds the body's completion, not yet caught
    Cleanup(Completion),
}
