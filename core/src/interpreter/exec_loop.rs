//! Core execution loop
//!
//! This module contains the step() function - the heart of the interpreter.
//! Each step either resumes the top program frame or hands a finished
//! frame's completion to the frame below it.
//!
//! ## Function Organization
//! Functions are ordered by importance/call hierarchy:
//! 1. run_until_suspended() - Top-level driver (calls step repeatedly)
//! 2. step() - Dispatches on the control state
//! 3. advance() / perform() - Resume a program and act on what it yields
//! 4. unwind() - Deliver completions, run cleanups, then catch error effects

use tracing::trace;

use super::control::{Completion, Control, Frame, Raise, ScopePhase};
use super::handlers::Provision;
use super::vm::{push_program, push_scope, Step, VM};
use crate::error::Exception;
use crate::program::{Cx, Resume, Yield};
use crate::types::{Awaitable, BoxFuture, Effect, Val};

/* ===================== Public API ===================== */

/// Run the VM until it finishes or suspends on an async effect
///
/// Returns the future to wait on, or `None` once the run has finished.
/// After completion, inspect `vm.outcome()` for the final state.
pub fn run_until_suspended(vm: &mut VM) -> Option<BoxFuture> {
    loop {
        match step(vm) {
            Step::Continue => continue,
            Step::Suspend(future) => return Some(future),
            Step::Waiting | Step::Done => return None,
        }
    }
}

/// Execute one step of the VM
pub fn step(vm: &mut VM) -> Step {
    match std::mem::replace(&mut vm.control, Control::Suspended) {
        Control::Resume(input) => advance(vm, input),
        Control::Unwind(completion) => unwind(vm, completion),
        Control::Suspended => Step::Waiting,
        Control::Finished(outcome) => {
            vm.control = Control::Finished(outcome);
            Step::Done
        }
    }
}

/* ===================== Resume ===================== */

/// Resume the top program frame and act on its yield
fn advance(vm: &mut VM, input: Resume) -> Step {
    let Some(Frame::Program(mut program)) = vm.frames.pop() else {
        // Resume values are only ever produced for program frames
        panic!("Internal error: resume delivered without a program frame");
    };

    let output = {
        let cx = Cx {
            frames: &vm.frames,
            ambient: &vm.ambient,
            signal: vm.signal.as_ref(),
        };
        program.resume(&cx, input)
    };

    match output {
        Yield::Return(val) => {
            vm.control = Control::Unwind(Completion::Return(val));
        }
        Yield::Throw(error) => {
            vm.control = Control::Unwind(Completion::Throw(error));
        }
        Yield::Delegate(sub) => {
            push_program(vm, program);
            push_program(vm, sub);
            vm.control = Control::Resume(Resume::start());
        }
        Yield::Enter(scope) => {
            push_program(vm, program);
            push_scope(vm, scope);
            vm.control = Control::Resume(Resume::start());
        }
        Yield::Effect(effect) => {
            push_program(vm, program);
            return perform(vm, effect);
        }
    }

    Step::Continue
}

/// Resolve an effect yielded by the top program frame
fn perform(vm: &mut VM, effect: Effect) -> Step {
    match effect {
        Effect::Err { name, error } => {
            let target = find_catch(vm, &name);
            trace!(effect = %name, ?target, "error effect raised");
            vm.control = Control::Unwind(Completion::Raise(Raise {
                name,
                error,
                target,
            }));
        }

        Effect::Ctx { name } => match find_provision(vm, &name) {
            Some(provision) => provide(vm, provision),
            None => {
                trace!(effect = %name, "context effect unhandled");
                vm.control = Control::Resume(Resume::Throw(Exception::UnhandledContext(name)));
            }
        },

        Effect::Opt { name } => match find_provision(vm, &name) {
            Some(provision) => provide(vm, provision),
            None => {
                trace!(effect = %name, "option effect unhandled, resuming with none");
                vm.control = Control::Resume(Resume::Value(Val::Null));
            }
        },

        Effect::Async(Awaitable::Ready(val)) => {
            vm.control = Control::Resume(Resume::Value(val));
        }

        Effect::Async(Awaitable::Pending(future)) => {
            vm.control = Control::Suspended;
            return Step::Suspend(future);
        }
    }

    Step::Continue
}

fn provide(vm: &mut VM, provision: Provision) {
    match provision {
        Provision::Value(val) => {
            vm.control = Control::Resume(Resume::Value(val));
        }
        Provision::Program(provider) => {
            // The provider's return value resumes the requesting program
            push_program(vm, provider);
            vm.control = Control::Resume(Resume::start());
        }
    }
}

/* ===================== Handler Resolution ===================== */

/// Index of the innermost scope catching `name`
fn find_catch(vm: &VM, name: &str) -> Option<usize> {
    vm.frames
        .iter()
        .enumerate()
        .rev()
        .find_map(|(idx, frame)| match frame {
            Frame::Scope(scope) if scope.table.catches(name) => Some(idx),
            _ => None,
        })
}

/// First provision for `name`: scopes innermost first, then ambient
fn find_provision(vm: &VM, name: &str) -> Option<Provision> {
    vm.frames
        .iter()
        .rev()
        .find_map(|frame| match frame {
            Frame::Scope(scope) => scope.table.provision(name),
            _ => None,
        })
        .or_else(|| vm.ambient.provision(name))
}

/* ===================== Control Flow ===================== */

/// Hand a completion to the top frame
///
/// - Program frames take returns and throws as their resume value; error
///   effects and driver faults skip them (they are not native exceptions).
/// - Scope frames in their body start the cleanup, holding the body's
///   completion until it finishes. The cleanup still resolves against the
///   scope's own table.
/// - Scope frames in cleanup settle with the body's completion, unless the
///   cleanup itself failed.
/// - A settling scope catches error effects targeted at it; the catch
///   callback runs after the cleanup.
fn unwind(vm: &mut VM, completion: Completion) -> Step {
    let Some(top) = vm.frames.len().checked_sub(1) else {
        vm.control = Control::Finished(completion.into_outcome());
        return Step::Done;
    };

    if matches!(vm.frames[top], Frame::Program(_)) {
        match completion {
            Completion::Return(val) => vm.control = Control::Resume(Resume::Value(val)),
            Completion::Throw(error) => vm.control = Control::Resume(Resume::Throw(error)),
            passing @ (Completion::Raise(_) | Completion::Fault(_)) => {
                vm.frames.pop();
                vm.control = Control::Unwind(passing);
            }
        }
        return Step::Continue;
    }

    let Frame::Scope(scope) = &mut vm.frames[top] else {
        unreachable!("top frame is a scope");
    };

    let completion = match std::mem::replace(&mut scope.phase, ScopePhase::Body) {
        ScopePhase::Body => match scope.cleanup.take() {
            Some(cleanup) => {
                scope.phase = ScopePhase::Cleanup(completion);
                push_program(vm, cleanup);
                vm.control = Control::Resume(Resume::start());
                return Step::Continue;
            }
            None => completion,
        },
        ScopePhase::Cleanup(pending) => match completion {
            Completion::Return(_) => pending,
            failure => {
                trace!(?failure, "cleanup failed, replacing scope outcome");
                failure
            }
        },
    };

    let Some(Frame::Scope(finished)) = vm.frames.pop() else {
        unreachable!("top frame is a scope");
    };

    vm.control = Control::Unwind(match completion {
        Completion::Raise(raise) if raise.target == Some(top) => {
            trace!(effect = %raise.name, "error effect caught");
            Completion::Return(finished.table.recover(&raise.name, raise.error))
        }
        other => other,
    });

    Step::Continue
}
