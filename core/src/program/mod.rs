//! # Programs
//!
//! A program is a suspendable computation driven one step at a time by the
//! interpreter. Each call to [`Program::resume`] hands the program the result
//! of its previous request and gets back a [`Yield`]: the next request, a
//! delegation to a sub-program, or a final outcome.
//!
//! Programs never recurse into each other. Delegation is reported back to
//! the interpreter, which keeps the chain of suspended programs on its own
//! frame stack.

pub mod combinators;

use std::fmt;

use crate::driver::AbortSignal;
use crate::error::Exception;
use crate::interpreter::handlers::HandlerChain;
use crate::interpreter::scope::Scope;
use crate::interpreter::control::Frame;
use crate::types::{Effect, Val};

pub use combinators::{
    from_fn, lazy, pure, seq, throw, AndThen, Catch, FromFn, Lazy, Map, Pure, Seq, Throwing,
};

/* ===================== Protocol ===================== */

/// Value delivered to a program when it is resumed
#[derive(Debug, Clone, PartialEq)]
pub enum Resume {
    /// Result of the previous request (`Null` on the first resume)
    Value(Val),
    /// Native exception raised at the program's suspension point
    Throw(Exception),
}

impl Resume {
    /// Resume value for a freshly pushed frame
    pub fn start() -> Self {
        Resume::Value(Val::Null)
    }

    /// Finish with whatever was delivered
    pub fn into_yield(self) -> Yield {
        match self {
            Resume::Value(val) => Yield::Return(val),
            Resume::Throw(error) => Yield::Throw(error),
        }
    }
}

impl From<Result<Val, Exception>> for Resume {
    fn from(result: Result<Val, Exception>) -> Self {
        match result {
            Ok(val) => Resume::Value(val),
            Err(error) => Resume::Throw(error),
        }
    }
}

/// What a program hands back to the interpreter
pub enum Yield {
    /// Request resolution of an effect
    Effect(Effect),
    /// Run a sub-program; its return value resumes this program
    Delegate(BoxProgram),
    /// Run a program inside a try-scope; its outcome resumes this program
    Enter(Scope),
    /// Finished normally
    Return(Val),
    /// Finished with a native exception
    Throw(Exception),
}

impl fmt::Debug for Yield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Yield::Effect(effect) => f.debug_tuple("Effect").field(effect).finish(),
            Yield::Delegate(_) => f.write_str("Delegate(..)"),
            Yield::Enter(_) => f.write_str("Enter(..)"),
            Yield::Return(val) => f.debug_tuple("Return").field(val).finish(),
            Yield::Throw(error) => f.debug_tuple("Throw").field(error).finish(),
        }
    }
}

/* ===================== Program ===================== */

/// A suspendable computation
pub trait Program: Send {
    fn resume(&mut self, cx: &Cx<'_>, input: Resume) -> Yield;
}

pub type BoxProgram = Box<dyn Program>;

impl<P: Program + ?Sized> Program for Box<P> {
    fn resume(&mut self, cx: &Cx<'_>, input: Resume) -> Yield {
        (**self).resume(cx, input)
    }
}

/// Read-only view of the running VM, passed to every resume
pub struct Cx<'a> {
    pub(crate) frames: &'a [Frame],
    pub(crate) ambient: &'a HandlerChain,
    pub(crate) signal: Option<&'a AbortSignal>,
}

impl<'a> Cx<'a> {
    /// Handler tables visible at this point, innermost first
    pub fn handlers(&self) -> HandlerChain {
        let mut chain = HandlerChain::default();
        for frame in self.frames.iter().rev() {
            if let Frame::Scope(scope) = frame {
                chain.push(scope.table.clone());
            }
        }
        chain.extend(self.ambient);
        chain
    }

    /// Abort signal of the driver running this program, if any
    pub fn signal(&self) -> Option<&AbortSignal> {
        self.signal
    }
}

/* ===================== Extension ===================== */

/// Combinator methods available on every program
pub trait ProgramExt: Program + Sized + 'static {
    fn boxed(self) -> BoxProgram {
        Box::new(self)
    }

    /// Feed the return value into `f` and continue with the program it builds
    fn and_then<F, P>(self, f: F) -> AndThen<F>
    where
        F: FnOnce(Val) -> P + Send,
        P: Program + 'static,
    {
        AndThen::new(self.boxed(), f)
    }

    /// Run `next` after this program, discarding this program's value
    fn then<P>(self, next: P) -> AndThen<Box<dyn FnOnce(Val) -> BoxProgram + Send>>
    where
        P: Program + 'static,
    {
        AndThen::new(self.boxed(), Box::new(move |_| next.boxed()))
    }

    fn map<F>(self, f: F) -> Map<F>
    where
        F: FnOnce(Val) -> Val + Send,
    {
        Map::new(self.boxed(), f)
    }

    /// Recover from a native exception raised anywhere inside this program
    fn catch<F, P>(self, f: F) -> Catch<F>
    where
        F: FnOnce(Exception) -> P + Send,
        P: Program + 'static,
    {
        Catch::new(self.boxed(), f)
    }
}

impl<P: Program + 'static> ProgramExt for P {}
