//! Test helpers for interpreter tests

use crate::error::RunError;
use crate::interpreter::{run_until_suspended, VM};
use crate::program::Program;
use crate::types::Val;

pub use crate::testing::{entries, new_log, record, Log};

/// Run a program that never suspends
pub fn run_to_end<P: Program + 'static>(program: P) -> Result<Val, RunError> {
    let mut vm = VM::new(program);
    assert!(
        run_until_suspended(&mut vm).is_none(),
        "program suspended on an async effect"
    );
    vm.into_outcome().expect("VM finished")
}
