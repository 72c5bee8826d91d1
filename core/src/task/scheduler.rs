//! Bounded task scheduler
//!
//! Scheduler state lives behind one async mutex: the stream's pull futures
//! and the shutdown cleanup are the only writers.

use tokio::task::JoinSet;
use tracing::{debug, warn, Instrument};

use super::TaskProducer;
use crate::driver::{self, AbortController};
use crate::error::{Exception, RunError};
use crate::interpreter::{HandlerChain, VM};
use crate::types::Val;

/// What one pull hands the reducer
#[derive(Debug)]
pub(crate) enum Delivery {
    /// A task finished with a value or a native exception
    Item {
        index: usize,
        result: Result<Val, Exception>,
    },
    /// A task raised an error effect nobody inside it handled
    Escape {
        index: usize,
        name: String,
        error: Val,
    },
    /// Producer exhausted and every task delivered
    End,
}

/// How failures are delivered to the reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PullMode {
    /// First native exception ends the stream
    FailFast,
    /// Failures are ordinary results
    Settled,
}

pub(crate) struct Scheduler {
    producer: Box<dyn TaskProducer>,
    /// Next unconsumed producer index
    cursor: usize,
    exhausted: bool,
    /// Stream closed (drained, failed fast or shut down)
    ended: bool,
    max_concurrency: Option<usize>,
    /// Started and not yet delivered
    running: JoinSet<(usize, Result<Val, RunError>)>,
    handlers: HandlerChain,
    cancel: AbortController,
}

impl Scheduler {
    pub(crate) fn new(
        producer: Box<dyn TaskProducer>,
        max_concurrency: Option<usize>,
        handlers: HandlerChain,
        cancel: AbortController,
    ) -> Self {
        Scheduler {
            producer,
            cursor: 0,
            exhausted: false,
            ended: false,
            max_concurrency,
            running: JoinSet::new(),
            handlers,
            cancel,
        }
    }

    /// Tasks started and not yet delivered
    pub(crate) fn in_flight(&self) -> usize {
        self.running.len()
    }

    fn has_free_slot(&self) -> bool {
        self.max_concurrency
            .map_or(true, |max| self.running.len() < max)
    }

    /// Start tasks while slots are free and the producer has more
    fn fill(&mut self) {
        while !self.exhausted && self.has_free_slot() {
            let index = self.cursor;
            let Some(program) = self.producer.produce(index) else {
                debug!(produced = index, "task producer exhausted");
                self.exhausted = true;
                break;
            };
            self.cursor += 1;

            let vm = VM::new(program)
                .with_ambient(self.handlers.clone())
                .with_signal(Some(self.cancel.signal()));

            debug!(index, in_flight = self.running.len() + 1, "task started");
            self.running.spawn(
                async move { (index, driver::drive(vm).await) }
                    .instrument(tracing::debug_span!("task", index)),
            );
        }
    }

    /// Wait for the next task to finish
    pub(crate) async fn pull(&mut self, mode: PullMode) -> Delivery {
        if self.ended {
            return Delivery::End;
        }
        self.fill();

        loop {
            let joined = match self.running.join_next().await {
                Some(joined) => joined,
                None => {
                    debug!("task stream drained");
                    self.ended = true;
                    return Delivery::End;
                }
            };

            let delivery = match joined {
                Ok((index, Ok(value))) => Delivery::Item {
                    index,
                    result: Ok(value),
                },
                Ok((index, Err(RunError::Exception(error)))) => {
                    if mode == PullMode::FailFast {
                        debug!(index, %error, "task failed, closing stream");
                        self.ended = true;
                    }
                    Delivery::Item {
                        index,
                        result: Err(error),
                    }
                }
                Ok((index, Err(RunError::Effect { name, error }))) => {
                    debug!(index, effect = %name, "task raised an unhandled effect");
                    self.ended = true;
                    Delivery::Escape { index, name, error }
                }
                Err(join_error) if join_error.is_panic() => {
                    std::panic::resume_unwind(join_error.into_panic())
                }
                Err(join_error) => {
                    warn!(%join_error, "task did not complete");
                    continue;
                }
            };

            debug!(in_flight = self.running.len(), "task delivered");
            if !self.ended {
                self.fill();
            }
            return delivery;
        }
    }

    /// Stop producing and delivering
    pub(crate) fn close(&mut self) {
        self.ended = true;
        self.exhausted = true;
    }

    /// Cancel every in-flight task and wait for their cleanups
    pub(crate) async fn shutdown(&mut self) {
        self.close();

        if !self.running.is_empty() {
            debug!(in_flight = self.running.len(), "cancelling in-flight tasks");
        }
        self.cancel.abort();

        while let Some(joined) = self.running.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    debug!(index, ok = outcome.is_ok(), "task settled during shutdown")
                }
                Err(join_error) => warn!(%join_error, "task did not complete"),
            }
        }
    }
}
