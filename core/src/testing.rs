//! Shared helpers for unit tests
//!
//! Programs that record what ran into a shared event log

use std::sync::{Arc, Mutex};

use crate::program::{lazy, pure, Program};
use crate::types::Val;

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

/// Program that appends `entry` to the log when it runs
pub fn record(log: &Log, entry: &str) -> impl Program {
    let log = log.clone();
    let entry = entry.to_string();
    lazy(move || {
        log.lock().unwrap().push(entry);
        pure(Val::Null)
    })
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}
