//! # Interpreter - Resumable Stack-Driven Effect Interpreter
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: All state in `frames: Vec<Frame>`, no recursion.
//!    Delegation to a sub-program pushes a frame; the parent never sees the
//!    sub-program's effects, only its outcome.
//! 2. **Scoped handlers**: Each `Try` contributes a scope frame carrying its
//!    own handler table. Effects resolve against the innermost scope that
//!    declares their name; a scope's cleanup resolves against it too.
//! 3. **Centralized control flow**: `Control` tracks resume/unwind/suspend;
//!    cleanups run as ordinary programs pushed during unwinding.
//! 4. **Pure executor**: No I/O, no runtime - just runs until suspend or
//!    complete. Drivers (see `crate::driver`) supply the async side.

pub(crate) mod control;
pub mod exec_loop;
pub mod handlers;
pub mod scope;
pub mod vm;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use exec_loop::{run_until_suspended, step};
pub use handlers::{Handler, HandlerChain, HandlerTable};
pub use scope::{Scope, Try};
pub use vm::{Step, VM};
