//! Task programs for scheduler tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::effects::sleep;
use crate::error::Exception;
use crate::interpreter::Try;
use crate::program::{lazy, pure, throw, BoxProgram, Program, ProgramExt};
use crate::testing::{record, Log};
use crate::types::Val;

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

/// Sleeps, then returns `value`
pub fn delayed(ms: u64, value: impl Into<Val>) -> BoxProgram {
    sleep(millis(ms)).then(pure(value)).boxed()
}

/// Sleeps, then throws `message`
pub fn failing(ms: u64, message: &str) -> BoxProgram {
    sleep(millis(ms)).then(throw(Exception::msg(message))).boxed()
}

/// Runs `program` with a cleanup that logs `"{name} cleanup"`
pub fn guarded<P: Program + 'static>(log: &Log, name: &str, program: P) -> BoxProgram {
    Try::new(program)
        .finally(record(log, &format!("{} cleanup", name)))
        .boxed()
}

/// Counts concurrently running tasks
#[derive(Clone, Default)]
pub struct Gauge {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl Gauge {
    /// Task that holds one unit of the gauge while sleeping `ms`
    pub fn task(&self, ms: u64) -> BoxProgram {
        let (enter, leave) = (self.clone(), self.clone());
        lazy(move || {
            let now = enter.active.fetch_add(1, Ordering::SeqCst) + 1;
            enter.peak.fetch_max(now, Ordering::SeqCst);
            pure(Val::Null)
        })
        .then(sleep(millis(ms)))
        .then(lazy(move || {
            leave.active.fetch_sub(1, Ordering::SeqCst);
            pure(Val::Null)
        }))
        .boxed()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
