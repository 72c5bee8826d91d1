//! Effect constructors and Result conversions
//!
//! Each constructor returns a program that yields one effect and returns
//! whatever the interpreter resumes it with.

use std::future::Future;
use std::time::Duration;

use crate::error::Exception;
use crate::interpreter::{HandlerTable, Try};
use crate::program::{pure, throw, BoxProgram, Cx, Program, ProgramExt, Resume, Yield};
use crate::types::{Awaitable, Effect, Outcome, Val};

/// Yields a single effect, then finishes with the resume value
pub struct Perform {
    effect: Option<Effect>,
}

impl Perform {
    pub fn new(effect: Effect) -> Self {
        Perform {
            effect: Some(effect),
        }
    }
}

impl Program for Perform {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        match self.effect.take() {
            Some(effect) => Yield::Effect(effect),
            None => input.into_yield(),
        }
    }
}

/* ===================== Effects ===================== */

/// Raise the named error effect `name` carrying `error`
pub fn throw_err(name: impl Into<String>, error: impl Into<Val>) -> Perform {
    Perform::new(Effect::Err {
        name: name.into(),
        error: error.into(),
    })
}

/// Request the context value `name`
pub fn get_ctx(name: impl Into<String>) -> Perform {
    Perform::new(Effect::Ctx { name: name.into() })
}

/// Request the optional context value `name` (`Null` if nobody provides it)
pub fn get_opt(name: impl Into<String>) -> Perform {
    Perform::new(Effect::Opt { name: name.into() })
}

/// Wait for a future; a rejection is thrown at this point as an exception
pub fn awaiting<F>(future: F) -> Perform
where
    F: Future<Output = Result<Val, Exception>> + Send + 'static,
{
    Perform::new(Effect::Async(Awaitable::future(future)))
}

/// Async effect over a plain value; resolves without suspending
pub fn ready(value: impl Into<Val>) -> Perform {
    Perform::new(Effect::Async(Awaitable::Ready(value.into())))
}

/// Suspend for `duration`
pub fn sleep(duration: Duration) -> Perform {
    awaiting(async move {
        tokio::time::sleep(duration).await;
        Ok(Val::Null)
    })
}

/* ===================== Result Conversions ===================== */

/// Turn a program's return into `Ok` and any error effect into `Err`
///
/// Native exceptions are not part of the Result channel and still propagate.
pub fn wrap<P: Program + 'static>(program: P) -> Try {
    let body = program.map(|value| Outcome::Ok { value }.to_val());
    Try::new(body).handle(
        HandlerTable::new().catch_any(|name, error| Outcome::err(name, error).to_val()),
    )
}

/// Re-enter a Result value into the effect channel
///
/// `Ok` finishes with the wrapped value, `Err` raises the named error effect.
pub fn unwrap<P: Program + 'static>(program: P) -> impl Program {
    program.and_then(|val| -> BoxProgram {
        match Outcome::from_val(&val) {
            Some(Outcome::Ok { value }) => pure(value).boxed(),
            Some(Outcome::Err { name, error }) => throw_err(name, error).boxed(),
            None => throw(Exception::InvalidResult(val)).boxed(),
        }
    })
}
