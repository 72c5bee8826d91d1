//! Building blocks for composing programs without generator syntax
//!
//! Every combinator is a small state machine. Sequencing is expressed as
//! delegation so the interpreter's frame stack, not the Rust call stack,
//! holds the chain of suspended programs.

use std::collections::VecDeque;

use super::{BoxProgram, Cx, Program, Resume, Yield};
use crate::error::Exception;
use crate::types::Val;

/* ===================== Leaves ===================== */

/// Program that returns a value immediately
pub struct Pure {
    value: Option<Val>,
}

pub fn pure(value: impl Into<Val>) -> Pure {
    Pure {
        value: Some(value.into()),
    }
}

impl Program for Pure {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        match self.value.take() {
            Some(value) => Yield::Return(value),
            None => input.into_yield(),
        }
    }
}

/// Program that throws a native exception immediately
pub struct Throwing {
    error: Option<Exception>,
}

pub fn throw(error: Exception) -> Throwing {
    Throwing { error: Some(error) }
}

impl Program for Throwing {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        match self.error.take() {
            Some(error) => Yield::Throw(error),
            None => input.into_yield(),
        }
    }
}

/// Hand-written state machine
pub struct FromFn<F> {
    f: F,
}

pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(&Cx<'_>, Resume) -> Yield + Send,
{
    FromFn { f }
}

impl<F> Program for FromFn<F>
where
    F: FnMut(&Cx<'_>, Resume) -> Yield + Send,
{
    fn resume(&mut self, cx: &Cx<'_>, input: Resume) -> Yield {
        (self.f)(cx, input)
    }
}

/// Defers building a program until it is first resumed
pub struct Lazy<F> {
    init: Option<F>,
}

pub fn lazy<F, P>(init: F) -> Lazy<F>
where
    F: FnOnce() -> P + Send,
    P: Program + 'static,
{
    Lazy { init: Some(init) }
}

impl<F, P> Program for Lazy<F>
where
    F: FnOnce() -> P + Send,
    P: Program + 'static,
{
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        match self.init.take() {
            Some(init) => Yield::Delegate(Box::new(init())),
            None => input.into_yield(),
        }
    }
}

/* ===================== Sequencing ===================== */

pub struct AndThen<F> {
    first: Option<BoxProgram>,
    next: Option<F>,
}

impl<F> AndThen<F> {
    pub(crate) fn new(first: BoxProgram, next: F) -> Self {
        AndThen {
            first: Some(first),
            next: Some(next),
        }
    }
}

impl<F, P> Program for AndThen<F>
where
    F: FnOnce(Val) -> P + Send,
    P: Program + 'static,
{
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        if let Some(first) = self.first.take() {
            return Yield::Delegate(first);
        }
        match (self.next.take(), input) {
            (Some(next), Resume::Value(val)) => Yield::Delegate(Box::new(next(val))),
            (_, input) => input.into_yield(),
        }
    }
}

pub struct Map<F> {
    inner: Option<BoxProgram>,
    f: Option<F>,
}

impl<F> Map<F> {
    pub(crate) fn new(inner: BoxProgram, f: F) -> Self {
        Map {
            inner: Some(inner),
            f: Some(f),
        }
    }
}

impl<F> Program for Map<F>
where
    F: FnOnce(Val) -> Val + Send,
{
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        if let Some(inner) = self.inner.take() {
            return Yield::Delegate(inner);
        }
        match (self.f.take(), input) {
            (Some(f), Resume::Value(val)) => Yield::Return(f(val)),
            (_, input) => input.into_yield(),
        }
    }
}

/// Native try/catch around a body
pub struct Catch<F> {
    body: Option<BoxProgram>,
    handler: Option<F>,
}

impl<F> Catch<F> {
    pub(crate) fn new(body: BoxProgram, handler: F) -> Self {
        Catch {
            body: Some(body),
            handler: Some(handler),
        }
    }
}

impl<F, P> Program for Catch<F>
where
    F: FnOnce(Exception) -> P + Send,
    P: Program + 'static,
{
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        if let Some(body) = self.body.take() {
            return Yield::Delegate(body);
        }
        match (self.handler.take(), input) {
            (Some(handler), Resume::Throw(error)) => Yield::Delegate(Box::new(handler(error))),
            (_, input) => input.into_yield(),
        }
    }
}

/// Runs programs in order and returns the last value (`Null` when empty)
pub struct Seq {
    programs: VecDeque<BoxProgram>,
}

pub fn seq(programs: Vec<BoxProgram>) -> Seq {
    Seq {
        programs: programs.into(),
    }
}

impl Program for Seq {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        if let Resume::Throw(error) = input {
            return Yield::Throw(error);
        }
        match self.programs.pop_front() {
            Some(next) => Yield::Delegate(next),
            None => input.into_yield(),
        }
    }
}
