//! # Task Scheduler
//!
//! Runs independently suspendable programs concurrently and feeds their
//! results to a reducer program through a pull-based [`TaskStream`].
//!
//! - Each task runs in its own VM on the tokio runtime, with the handler
//!   tables visible at the `concurrent` call site as its ambient chain.
//! - New tasks start only while the reducer is pulling, and at most
//!   `max_concurrency` tasks are started and not yet delivered.
//! - When the reducer finishes in any way, every in-flight task is cancelled
//!   and awaited before `concurrent` completes.
//!
//! Native exceptions of tasks stay inside the stream (`next()` throws them,
//! `result()` returns them). Error effects left unhandled by a task are
//! raised again at the reducer's pull point.

pub mod combinators;
mod scheduler;
pub mod stream;

#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::driver::{AbortController, AbortSignal};
use crate::effects::awaiting;
use crate::error::ConfigError;
use crate::interpreter::{HandlerTable, Scope};
use crate::program::{lazy, pure, BoxProgram, Cx, Program, ProgramExt, Resume, Yield};
use crate::types::Val;
use scheduler::Scheduler;

pub use combinators::{all, all_settled, object, race, race_result, tuple};
pub use stream::{Pull, PullProgram, TaskStream};

/* ===================== Options ===================== */

/// Options accepted by `concurrent` and every derived combinator
#[derive(Debug, Clone, Default)]
pub struct TaskOptions {
    /// Upper bound on in-flight tasks; `None` is unbounded
    pub max_concurrency: Option<usize>,
    /// Cancels every task; defaults to the signal of the enclosing run
    pub abort_signal: Option<AbortSignal>,
}

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = Some(max);
        self
    }

    pub fn abort_signal(mut self, signal: AbortSignal) -> Self {
        self.abort_signal = Some(signal);
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.max_concurrency {
            Some(0) => Err(ConfigError::InvalidMaxConcurrency(0)),
            _ => Ok(()),
        }
    }
}

/* ===================== Sources ===================== */

/// Lazily supplies task programs by index
///
/// Returning `None` ends production; the producer is not called again.
pub trait TaskProducer: Send {
    fn produce(&mut self, index: usize) -> Option<BoxProgram>;
}

impl<F> TaskProducer for F
where
    F: FnMut(usize) -> Option<BoxProgram> + Send,
{
    fn produce(&mut self, index: usize) -> Option<BoxProgram> {
        self(index)
    }
}

struct ListProducer {
    programs: VecDeque<BoxProgram>,
}

impl TaskProducer for ListProducer {
    fn produce(&mut self, _index: usize) -> Option<BoxProgram> {
        self.programs.pop_front()
    }
}

/// Where `concurrent` takes its tasks from
pub struct TaskSource {
    producer: Box<dyn TaskProducer>,
}

impl TaskSource {
    pub fn producer<P: TaskProducer + 'static>(producer: P) -> Self {
        TaskSource {
            producer: Box::new(producer),
        }
    }

    /// Producer closure called with each index until it returns `None`
    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnMut(usize) -> Option<BoxProgram> + Send + 'static,
    {
        TaskSource::producer(f)
    }
}

impl From<Vec<BoxProgram>> for TaskSource {
    fn from(programs: Vec<BoxProgram>) -> Self {
        TaskSource::producer(ListProducer {
            programs: programs.into(),
        })
    }
}

impl fmt::Debug for TaskSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskSource(..)")
    }
}

/// Entry of `tuple`/`object`: a program to run or a value passed through
pub enum TaskItem {
    Program(BoxProgram),
    Value(Val),
}

impl TaskItem {
    pub fn program<P: Program + 'static>(program: P) -> Self {
        TaskItem::Program(program.boxed())
    }

    pub(crate) fn into_program(self) -> BoxProgram {
        match self {
            TaskItem::Program(program) => program,
            TaskItem::Value(value) => pure(value).boxed(),
        }
    }
}

impl From<Val> for TaskItem {
    fn from(value: Val) -> Self {
        TaskItem::Value(value)
    }
}

impl From<BoxProgram> for TaskItem {
    fn from(program: BoxProgram) -> Self {
        TaskItem::Program(program)
    }
}

/* ===================== Concurrent ===================== */

type Reducer = Box<dyn FnOnce(TaskStream) -> BoxProgram + Send>;

/// Run tasks from `source` concurrently and reduce them with `reducer`
///
/// The reducer's value is the value of the whole call. An invalid
/// `max_concurrency` is rejected here, before anything runs.
pub fn concurrent<R, P>(
    source: impl Into<TaskSource>,
    reducer: R,
    options: TaskOptions,
) -> Result<BoxProgram, ConfigError>
where
    R: FnOnce(TaskStream) -> P + Send + 'static,
    P: Program + 'static,
{
    options.validate()?;

    Ok(Concurrent {
        setup: Some(Setup {
            source: source.into(),
            reducer: Box::new(move |stream| reducer(stream).boxed()),
            options,
        }),
    }
    .boxed())
}

struct Setup {
    source: TaskSource,
    reducer: Reducer,
    options: TaskOptions,
}

/// Starts the scheduler when first resumed and enters the reducer's scope
struct Concurrent {
    setup: Option<Setup>,
}

impl Program for Concurrent {
    fn resume(&mut self, cx: &Cx<'_>, input: Resume) -> Yield {
        let Some(setup) = self.setup.take() else {
            return input.into_yield();
        };

        let cancel = match setup.options.abort_signal.as_ref().or(cx.signal()) {
            Some(signal) => signal.child(),
            None => AbortController::new(),
        };

        let scheduler = Scheduler::new(
            setup.source.producer,
            setup.options.max_concurrency,
            cx.handlers(),
            cancel,
        );
        let shared = Arc::new(Mutex::new(scheduler));
        let body = (setup.reducer)(TaskStream::new(shared.clone()));

        Yield::Enter(Scope::new(
            body,
            HandlerTable::new(),
            Some(shutdown(shared).boxed()),
        ))
    }
}

/// Cleanup of the reducer's scope
///
/// Completes without suspending when no task is in flight.
fn shutdown(shared: Arc<Mutex<Scheduler>>) -> impl Program {
    lazy(move || -> BoxProgram {
        if let Ok(mut scheduler) = shared.try_lock() {
            if scheduler.in_flight() == 0 {
                scheduler.close();
                return pure(Val::Null).boxed();
            }
        }
        awaiting(async move {
            shared.lock().await.shutdown().await;
            Ok(Val::Null)
        })
        .boxed()
    })
}
