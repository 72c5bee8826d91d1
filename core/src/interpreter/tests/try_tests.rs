//! Tests for try / handle / finally
//!
//! Cleanups must run exactly once whichever way the body leaves the scope

use super::helpers::{entries, new_log, record, run_to_end, Log};
use crate::effects::{get_ctx, throw_err};
use crate::error::{Exception, RunError};
use crate::interpreter::{HandlerTable, Try};
use crate::program::{pure, throw, ProgramExt};
use crate::types::Val;

fn logged_ctx(log: &Log, name: &str) -> impl crate::program::Program {
    let log = log.clone();
    get_ctx(name).and_then(move |val| {
        log.lock().unwrap().push(format!("saw {}", val));
        pure(Val::Null)
    })
}

#[test]
fn test_finally_runs_after_return() {
    let log = new_log();
    let program = Try::new(record(&log, "body").then(pure("value"))).finally(record(&log, "cleanup"));

    assert_eq!(run_to_end(program), Ok(Val::from("value")));
    assert_eq!(entries(&log), vec!["body", "cleanup"]);
}

#[test]
fn test_finally_runs_after_native_throw() {
    let log = new_log();
    let program = Try::new(throw(Exception::msg("boom"))).finally(record(&log, "cleanup"));

    assert_eq!(
        run_to_end(program),
        Err(RunError::Exception(Exception::msg("boom")))
    );
    assert_eq!(entries(&log), vec!["cleanup"]);
}

#[test]
fn test_finally_runs_once_when_own_table_catches() {
    let log = new_log();
    let program = Try::new(throw_err("E", "x"))
        .handle(HandlerTable::new().catch("E", |_| Val::from("recovered")))
        .finally(record(&log, "cleanup"));

    assert_eq!(run_to_end(program), Ok(Val::from("recovered")));
    assert_eq!(entries(&log), vec!["cleanup"]);
}

#[test]
fn test_finally_runs_when_effect_passes_through() {
    let log = new_log();
    let inner = Try::new(throw_err("E", "x")).finally(record(&log, "inner cleanup"));
    let program = Try::new(inner.then(record(&log, "skipped")))
        .handle(HandlerTable::new().catch("E", |_| Val::from("outer")))
        .finally(record(&log, "outer cleanup"));

    assert_eq!(run_to_end(program), Ok(Val::from("outer")));
    assert_eq!(entries(&log), vec!["inner cleanup", "outer cleanup"]);
}

#[test]
fn test_finally_runs_when_effect_escapes_run() {
    let log = new_log();
    let program = Try::new(throw_err("E", "x")).finally(record(&log, "cleanup"));

    assert_eq!(
        run_to_end(program),
        Err(RunError::Effect {
            name: "E".into(),
            error: Val::from("x"),
        })
    );
    assert_eq!(entries(&log), vec!["cleanup"]);
}

#[test]
fn test_nested_cleanups_run_inner_to_outer() {
    let log = new_log();
    let inner = Try::new(record(&log, "body")).finally(record(&log, "inner"));
    let middle = Try::new(inner).finally(record(&log, "middle"));
    let program = Try::new(middle).finally(record(&log, "outer"));

    assert_eq!(run_to_end(program), Ok(Val::Null));
    assert_eq!(entries(&log), vec!["body", "inner", "middle", "outer"]);
}

#[test]
fn test_cleanup_value_is_discarded() {
    let program = Try::new(pure(1)).finally(pure(2));
    assert_eq!(run_to_end(program), Ok(Val::Num(1.0)));
}

#[test]
fn test_cleanup_failure_replaces_outcome() {
    let program = Try::new(pure(1)).finally(throw(Exception::msg("cleanup failed")));
    assert_eq!(
        run_to_end(program),
        Err(RunError::Exception(Exception::msg("cleanup failed")))
    );

    let program = Try::new(throw(Exception::msg("body failed")))
        .finally(throw_err("CleanupError", "disk"));
    assert_eq!(
        run_to_end(program),
        Err(RunError::Effect {
            name: "CleanupError".into(),
            error: Val::from("disk"),
        })
    );
}

#[test]
fn test_cleanup_resolves_against_own_table() {
    let log = new_log();
    let inner = Try::new(pure(1))
        .handle(HandlerTable::new().provide("X", "inner"))
        .finally(logged_ctx(&log, "X").then(logged_ctx(&log, "Y")));
    let program = Try::new(inner).handle(
        HandlerTable::new()
            .provide("X", "outer")
            .provide("Y", "outer"),
    );

    assert_eq!(run_to_end(program), Ok(Val::Num(1.0)));
    assert_eq!(entries(&log), vec!["saw inner", "saw outer"]);
}

#[test]
fn test_catch_callback_runs_after_cleanup() {
    let log = new_log();
    let handler_log = log.clone();
    let program = Try::new(throw_err("E", "x"))
        .handle(HandlerTable::new().catch("E", move |_| {
            handler_log.lock().unwrap().push("handler".to_string());
            Val::from("recovered")
        }))
        .finally(record(&log, "cleanup"));

    assert_eq!(run_to_end(program), Ok(Val::from("recovered")));
    assert_eq!(entries(&log), vec!["cleanup", "handler"]);
}

#[test]
fn test_cleanup_error_caught_by_same_try() {
    let program = Try::new(pure(1))
        .handle(HandlerTable::new().catch("E", |error| Val::from(format!("caught {}", error))))
        .finally(throw_err("E", "cleanup"));

    assert_eq!(run_to_end(program), Ok(Val::from("caught cleanup")));
}

#[test]
fn test_cleanup_error_replaces_caught_body_error() {
    let log = new_log();
    let handler_log = log.clone();
    let program = Try::new(throw_err("E", "body"))
        .handle(HandlerTable::new().catch("E", move |error| {
            handler_log.lock().unwrap().push(format!("handled {}", error));
            error
        }))
        .finally(throw_err("E", "cleanup"));

    assert_eq!(run_to_end(program), Ok(Val::from("cleanup")));
    assert_eq!(entries(&log), vec!["handled cleanup"]);
}

#[test]
fn test_native_catch_around_try_sees_thrown_exception_after_cleanup() {
    let log = new_log();
    let guarded = Try::new(throw(Exception::msg("boom"))).finally(record(&log, "cleanup"));
    let program = guarded.catch(|error| pure(format!("caught {}", error)));

    assert_eq!(run_to_end(program), Ok(Val::from("caught boom")));
    assert_eq!(entries(&log), vec!["cleanup"]);
}
