//! Virtual Machine state
//!
//! The VM holds all execution state of one run:
//! - frames: Stack of suspended programs and entered scopes
//! - control: What the next step does (resume, unwind, wait, done)

use std::fmt;

use super::control::{Completion, Control, Frame, ScopeFrame, ScopePhase};
use super::handlers::HandlerChain;
use super::scope::Scope;
use crate::driver::AbortSignal;
use crate::error::{Exception, RunError};
use crate::program::{BoxProgram, Program, Resume};
use crate::types::{BoxFuture, Val};

/* ===================== VM ===================== */

pub struct VM {
    /// Stack of execution frames, innermost last
    pub(crate) frames: Vec<Frame>,

    /// Current control flow state
    pub(crate) control: Control,

    /// Tables inherited from outside this VM (consulted for context/option
    /// lookups after every local scope)
    pub(crate) ambient: HandlerChain,

    /// Cancellation signal exposed to programs through `Cx`
    pub(crate) signal: Option<AbortSignal>,
}

impl VM {
    /// Create a new VM with a program
    ///
    /// The program becomes the root frame and runs on the first `step()`.
    pub fn new<P: Program + 'static>(program: P) -> Self {
        let mut vm = VM {
            frames: vec![],
            control: Control::Resume(Resume::start()),
            ambient: HandlerChain::default(),
            signal: None,
        };

        push_program(&mut vm, Box::new(program));

        vm
    }

    pub fn with_ambient(mut self, ambient: HandlerChain) -> Self {
        self.ambient = ambient;
        self
    }

    pub fn with_signal(mut self, signal: Option<AbortSignal>) -> Self {
        self.signal = signal;
        self
    }

    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal.as_ref()
    }

    /// Resume after `Step::Suspend`
    ///
    /// Returns false if the VM was not waiting on an async effect.
    pub fn resume(&mut self, input: Resume) -> bool {
        if !matches!(self.control, Control::Suspended) {
            return false;
        }
        self.control = Control::Resume(input);
        true
    }

    /// Fail the run at the pending suspension point
    ///
    /// Unlike resuming with a throw, no program frame can catch the failure.
    /// Live cleanups still run, innermost first. Returns false if the VM was
    /// not waiting on an async effect.
    pub fn fail(&mut self, error: Exception) -> bool {
        if !matches!(self.control, Control::Suspended) {
            return false;
        }
        self.control = Control::Unwind(Completion::Fault(error));
        true
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self.control, Control::Suspended)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.control, Control::Finished(_))
    }

    /// True while any scope is running its cleanup program
    ///
    /// Drivers do not deliver aborts in this state so cleanups always finish.
    pub fn in_cleanup(&self) -> bool {
        self.frames.iter().any(|frame| {
            matches!(
                frame,
                Frame::Scope(ScopeFrame {
                    phase: ScopePhase::Cleanup(_),
                    ..
                })
            )
        })
    }

    /// Number of live frames (programs and scopes)
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Final outcome; `None` until the run has finished
    pub fn outcome(&self) -> Option<&Result<Val, RunError>> {
        match &self.control {
            Control::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Consume a finished VM
    pub fn into_outcome(self) -> Option<Result<Val, RunError>> {
        match self.control {
            Control::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }
}

impl fmt::Debug for VM {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.control {
            Control::Resume(_) => "resume",
            Control::Unwind(_) => "unwind",
            Control::Suspended => "suspended",
            Control::Finished(_) => "finished",
        };
        f.debug_struct("VM")
            .field("depth", &self.frames.len())
            .field("control", &state)
            .finish()
    }
}

/* ===================== Frame Management ===================== */

/// Push a program frame; it runs on the next `Resume`
pub(crate) fn push_program(vm: &mut VM, program: BoxProgram) {
    vm.frames.push(Frame::Program(program));
}

/// Push a scope frame followed by its body
pub(crate) fn push_scope(vm: &mut VM, scope: Scope) {
    let Scope {
        body,
        table,
        cleanup,
    } = scope;

    vm.frames.push(Frame::Scope(ScopeFrame {
        table,
        cleanup,
        phase: ScopePhase::Body,
    }));
    push_program(vm, body);
}

/* ===================== Step Result ===================== */

/// Result of executing one step
pub enum Step {
    /// Continue to next step
    Continue,
    /// Waiting on a future; resolve it and call `VM::resume`
    Suspend(BoxFuture),
    /// Suspended earlier and not yet resumed
    Waiting,
    /// Execution complete; inspect `VM::outcome`
    Done,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Continue => f.write_str("Continue"),
            Step::Suspend(_) => f.write_str("Suspend(..)"),
            Step::Waiting => f.write_str("Waiting"),
            Step::Done => f.write_str("Done"),
        }
    }
}

/// Exception for a driver that cannot satisfy an async suspension
pub(crate) fn unexpected_async() -> Exception {
    Exception::UnexpectedEffect("async".to_string())
}
