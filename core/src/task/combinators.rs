//! Reducers behind the derived combinators
//!
//! - `all` / `tuple` / `object`: collect every value by index, fail fast
//! - `all_settled`: collect every `TaskResult`, never fail fast
//! - `race` / `race_result`: first delivery wins, the rest are cancelled

use super::{concurrent, Pull, TaskItem, TaskOptions, TaskStream};
use crate::error::ConfigError;
use crate::program::{BoxProgram, Cx, Program, ProgramExt, Resume, Yield};
use crate::types::{TaskResult, Val};

/// Run every program; the value is the list of their values in input order
///
/// The first task exception ends the call with that exception.
pub fn all(programs: Vec<BoxProgram>, options: TaskOptions) -> Result<BoxProgram, ConfigError> {
    let slots = programs.len();
    concurrent(
        programs,
        move |stream| Collect::new(stream, slots, Box::new(Val::List)),
        options,
    )
}

/// `all` over a fixed list where plain values pass through
pub fn tuple(items: Vec<TaskItem>, options: TaskOptions) -> Result<BoxProgram, ConfigError> {
    let programs = items.into_iter().map(TaskItem::into_program).collect();
    all(programs, options)
}

/// `all` over named entries; the value is an object with the same keys
pub fn object<K, I>(entries: I, options: TaskOptions) -> Result<BoxProgram, ConfigError>
where
    K: Into<String>,
    I: IntoIterator<Item = (K, TaskItem)>,
{
    let (keys, programs): (Vec<String>, Vec<BoxProgram>) = entries
        .into_iter()
        .map(|(key, item)| (key.into(), item.into_program()))
        .unzip();

    let slots = programs.len();
    concurrent(
        programs,
        move |stream| {
            Collect::new(
                stream,
                slots,
                Box::new(move |values: Vec<Val>| Val::object(keys.into_iter().zip(values))),
            )
        },
        options,
    )
}

/// Run every program and collect one `TaskResult` per task in input order
pub fn all_settled(
    programs: Vec<BoxProgram>,
    options: TaskOptions,
) -> Result<BoxProgram, ConfigError> {
    let slots = programs.len();
    concurrent(programs, move |stream| Settle::new(stream, slots), options)
}

/// Value of the first task to finish; its exception if it failed first
///
/// An empty list races to `Null`.
pub fn race(programs: Vec<BoxProgram>, options: TaskOptions) -> Result<BoxProgram, ConfigError> {
    concurrent(programs, |stream| First::new(stream, false), options)
}

/// `TaskResult` of the first task to finish, success or failure
pub fn race_result(
    programs: Vec<BoxProgram>,
    options: TaskOptions,
) -> Result<BoxProgram, ConfigError> {
    concurrent(programs, |stream| First::new(stream, true), options)
}

/* ===================== Reducers ===================== */

type Finish = Box<dyn FnOnce(Vec<Val>) -> Val + Send>;

/// Pulls with `next()` and places each value at its index
struct Collect {
    stream: TaskStream,
    slots: Vec<Val>,
    finish: Option<Finish>,
    started: bool,
}

impl Collect {
    fn new(stream: TaskStream, slots: usize, finish: Finish) -> Self {
        Collect {
            stream,
            slots: vec![Val::Null; slots],
            finish: Some(finish),
            started: false,
        }
    }
}

impl Program for Collect {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        let val = match input {
            Resume::Throw(error) => return Yield::Throw(error),
            Resume::Value(val) => val,
        };

        if std::mem::replace(&mut self.started, true) {
            match Pull::from_val(val) {
                Pull::End => {
                    let slots = std::mem::take(&mut self.slots);
                    return match self.finish.take() {
                        Some(finish) => Yield::Return(finish(slots)),
                        None => Yield::Return(Val::List(slots)),
                    };
                }
                Pull::Item(item) => {
                    if let Some(TaskResult::Ok { index, value }) = TaskResult::from_val(&item) {
                        if let Some(slot) = self.slots.get_mut(index) {
                            *slot = value;
                        }
                    }
                }
            }
        }

        Yield::Delegate(self.stream.next().boxed())
    }
}

/// Pulls with `result()` until the stream ends
struct Settle {
    stream: TaskStream,
    slots: Vec<Val>,
    started: bool,
}

impl Settle {
    fn new(stream: TaskStream, slots: usize) -> Self {
        Settle {
            stream,
            slots: vec![Val::Null; slots],
            started: false,
        }
    }
}

impl Program for Settle {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        let val = match input {
            Resume::Throw(error) => return Yield::Throw(error),
            Resume::Value(val) => val,
        };

        if std::mem::replace(&mut self.started, true) {
            match Pull::from_val(val) {
                Pull::End => return Yield::Return(Val::List(std::mem::take(&mut self.slots))),
                Pull::Item(item) => {
                    if let Some(index) = TaskResult::from_val(&item).map(|result| result.index()) {
                        if let Some(slot) = self.slots.get_mut(index) {
                            *slot = item;
                        }
                    }
                }
            }
        }

        Yield::Delegate(self.stream.result().boxed())
    }
}

/// Returns after a single pull
struct First {
    stream: TaskStream,
    settled: bool,
    started: bool,
}

impl First {
    fn new(stream: TaskStream, settled: bool) -> Self {
        First {
            stream,
            settled,
            started: false,
        }
    }
}

impl Program for First {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        if !std::mem::replace(&mut self.started, true) {
            let pull = match self.settled {
                true => self.stream.result(),
                false => self.stream.next(),
            };
            return Yield::Delegate(pull.boxed());
        }

        let val = match input {
            Resume::Throw(error) => return Yield::Throw(error),
            Resume::Value(val) => val,
        };

        match Pull::from_val(val) {
            Pull::End => Yield::Return(Val::Null),
            Pull::Item(item) if self.settled => Yield::Return(item),
            Pull::Item(item) => Yield::Return(item.get("value").cloned().unwrap_or_default()),
        }
    }
}
