//! Pull interface handed to reducers

use std::fmt;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tracing::debug;

use super::scheduler::{Delivery, PullMode, Scheduler};
use crate::error::Exception;
use crate::program::{Cx, Program, Resume, Yield};
use crate::types::{Awaitable, Effect, TaskResult, Val};

/// What a pull returned, decoded from its Val form
#[derive(Debug, Clone, PartialEq)]
pub enum Pull {
    /// A delivered task (`task-ok`/`task-err` value)
    Item(Val),
    /// Producer exhausted and every task delivered
    End,
}

impl Pull {
    /// `{kind: "end"}`
    pub fn end() -> Val {
        Val::object([("kind", Val::from("end"))])
    }

    pub fn is_end(val: &Val) -> bool {
        matches!(val, Val::Obj(map) if map.len() == 1)
            && val.get("kind").and_then(Val::as_str) == Some("end")
    }

    pub fn from_val(val: Val) -> Pull {
        if Pull::is_end(&val) {
            Pull::End
        } else {
            Pull::Item(val)
        }
    }

    pub fn to_val(&self) -> Val {
        match self {
            Pull::Item(val) => val.clone(),
            Pull::End => Pull::end(),
        }
    }
}

/// Consumer side of a `concurrent` call
///
/// Cloning shares the same underlying stream.
#[derive(Clone)]
pub struct TaskStream {
    shared: Arc<Mutex<Scheduler>>,
}

impl TaskStream {
    pub(crate) fn new(shared: Arc<Mutex<Scheduler>>) -> Self {
        TaskStream { shared }
    }

    /// Next finished task as a `task-ok` value
    ///
    /// A task's native exception is thrown here and ends the stream.
    pub fn next(&self) -> PullProgram {
        PullProgram::new(self.shared.clone(), PullMode::FailFast)
    }

    /// Next finished task as a `task-ok` or `task-err` value
    pub fn result(&self) -> PullProgram {
        PullProgram::new(self.shared.clone(), PullMode::Settled)
    }
}

impl fmt::Debug for TaskStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TaskStream(..)")
    }
}

enum PullState {
    Start,
    Waiting(oneshot::Receiver<Delivery>),
    Done,
}

/// One pull from a [`TaskStream`]
///
/// Suspends on an async effect while the scheduler waits for a task, then
/// hands the delivery back to the reducer. Error effects a task left
/// unhandled are raised again from here.
pub struct PullProgram {
    shared: Arc<Mutex<Scheduler>>,
    mode: PullMode,
    state: PullState,
}

impl PullProgram {
    fn new(shared: Arc<Mutex<Scheduler>>, mode: PullMode) -> Self {
        PullProgram {
            shared,
            mode,
            state: PullState::Start,
        }
    }

    fn deliver(&self, delivery: Delivery) -> Yield {
        match (delivery, self.mode) {
            (Delivery::Item { index, result: Ok(value) }, _) => {
                Yield::Return(TaskResult::Ok { index, value }.to_val())
            }
            (Delivery::Item { result: Err(error), .. }, PullMode::FailFast) => {
                Yield::Throw(error)
            }
            (Delivery::Item { index, result: Err(error) }, PullMode::Settled) => {
                Yield::Return(
                    TaskResult::Err {
                        index,
                        error: error.to_val(),
                    }
                    .to_val(),
                )
            }
            (Delivery::Escape { index, name, error }, _) => {
                debug!(index, effect = %name, "raising task effect at pull point");
                Yield::Effect(Effect::Err { name, error })
            }
            (Delivery::End, _) => Yield::Return(Pull::end()),
        }
    }
}

impl Program for PullProgram {
    fn resume(&mut self, _cx: &Cx<'_>, input: Resume) -> Yield {
        match std::mem::replace(&mut self.state, PullState::Done) {
            PullState::Start => {
                let (tx, rx) = oneshot::channel();
                let shared = self.shared.clone();
                let mode = self.mode;
                self.state = PullState::Waiting(rx);

                Yield::Effect(Effect::Async(Awaitable::future(async move {
                    let delivery = shared.lock().await.pull(mode).await;
                    // The receiver lives in the suspended pull frame
                    let _ = tx.send(delivery);
                    Ok(Val::Null)
                })))
            }
            PullState::Waiting(mut rx) => {
                if let Resume::Throw(error) = input {
                    return Yield::Throw(error);
                }
                match rx.try_recv() {
                    Ok(delivery) => self.deliver(delivery),
                    Err(_) => Yield::Throw(Exception::msg("task stream closed without a delivery")),
                }
            }
            PullState::Done => input.into_yield(),
        }
    }
}
