//! Tests for handler resolution
//!
//! Error, context and option effects against nested handler tables and the
//! ambient chain

use std::sync::{Arc, Mutex};

use super::helpers::run_to_end;
use crate::effects::{get_ctx, get_opt, throw_err};
use crate::error::{Exception, RunError};
use crate::interpreter::{run_until_suspended, HandlerChain, HandlerTable, Try, VM};
use crate::program::{from_fn, pure, ProgramExt, Yield};
use crate::types::Val;

fn double(val: Val) -> Val {
    Val::Num(val.as_num().unwrap() * 2.0)
}

/* ===================== Context / Option ===================== */

#[test]
fn test_context_value_is_provided() {
    let program = Try::new(get_ctx("X").map(double))
        .handle(HandlerTable::new().provide("X", 21));

    assert_eq!(run_to_end(program), Ok(Val::Num(42.0)));
}

#[test]
fn test_unhandled_context_throws_into_requester() {
    assert_eq!(
        run_to_end(get_ctx("X")),
        Err(RunError::Exception(Exception::UnhandledContext("X".into())))
    );

    // Thrown at the request point, so native catch sees it
    let program = get_ctx("X").catch(|_| pure("fallback"));
    assert_eq!(run_to_end(program), Ok(Val::from("fallback")));
}

#[test]
fn test_unhandled_option_resumes_with_null() {
    assert_eq!(run_to_end(get_opt("theme")), Ok(Val::Null));

    let program = Try::new(get_opt("theme")).handle(HandlerTable::new().provide("theme", "dark"));
    assert_eq!(run_to_end(program), Ok(Val::from("dark")));
}

#[test]
fn test_innermost_table_wins() {
    let inner = Try::new(get_ctx("X")).handle(HandlerTable::new().provide("X", "inner"));
    let program = Try::new(inner).handle(HandlerTable::new().provide("X", "outer"));

    assert_eq!(run_to_end(program), Ok(Val::from("inner")));
}

#[test]
fn test_lookup_falls_through_to_outer_table() {
    let body = get_ctx("A").and_then(|a| {
        get_ctx("B").map(move |b| Val::List(vec![a, b]))
    });
    let inner = Try::new(body).handle(HandlerTable::new().provide("A", 1));
    let program = Try::new(inner).handle(HandlerTable::new().provide("B", 2));

    assert_eq!(
        run_to_end(program),
        Ok(Val::List(vec![Val::Num(1.0), Val::Num(2.0)]))
    );
}

#[test]
fn test_catch_entry_does_not_provide_context() {
    let program = Try::new(get_ctx("X")).handle(HandlerTable::new().catch("X", |error| error));

    assert_eq!(
        run_to_end(program),
        Err(RunError::Exception(Exception::UnhandledContext("X".into())))
    );
}

#[test]
fn test_provider_program_runs_per_request() {
    let calls = Arc::new(Mutex::new(0));
    let counter = calls.clone();

    let body = get_ctx("user").and_then(|first| get_ctx("user").map(move |second| {
        Val::List(vec![first, second])
    }));
    let program = Try::new(body).handle(HandlerTable::new().provide_with("user", move || {
        *counter.lock().unwrap() += 1;
        pure("alice")
    }));

    assert_eq!(
        run_to_end(program),
        Ok(Val::List(vec![Val::from("alice"), Val::from("alice")]))
    );
    assert_eq!(*calls.lock().unwrap(), 2);
}

#[test]
fn test_provider_effects_resolve_against_enclosing_tables() {
    let inner = Try::new(get_ctx("greeting")).handle(
        HandlerTable::new().provide_with("greeting", || {
            get_ctx("name").map(|name| Val::from(format!("hello {}", name)))
        }),
    );
    let program = Try::new(inner).handle(HandlerTable::new().provide("name", "bob"));

    assert_eq!(run_to_end(program), Ok(Val::from("hello bob")));
}

#[test]
fn test_ambient_chain_answers_after_local_scopes() {
    let ambient = HandlerChain::from(HandlerTable::new().provide("X", 1).provide("Y", 2));
    let body = get_ctx("X").and_then(|x| get_ctx("Y").map(move |y| Val::List(vec![x, y])));
    let program = Try::new(body).handle(HandlerTable::new().provide("X", 10));

    let mut vm = VM::new(program).with_ambient(ambient);
    assert!(run_until_suspended(&mut vm).is_none());
    assert_eq!(
        vm.into_outcome(),
        Some(Ok(Val::List(vec![Val::Num(10.0), Val::Num(2.0)])))
    );
}

#[test]
fn test_cx_handlers_lists_active_tables() {
    let probe = from_fn(|cx, _| Yield::Return(Val::from(cx.handlers().len())));
    let inner = Try::new(probe).handle(HandlerTable::new().provide("A", 1));
    let program = Try::new(inner).handle(HandlerTable::new().provide("B", 2));

    assert_eq!(run_to_end(program), Ok(Val::Num(2.0)));
}

/* ===================== Error Effects ===================== */

#[test]
fn test_error_effect_value_becomes_try_value() {
    let body = throw_err("NotFound", "user 7").map(|_| Val::from("unreachable"));
    let program = Try::new(body).handle(
        HandlerTable::new().catch("NotFound", |error| Val::from(format!("missing: {}", error))),
    );

    assert_eq!(run_to_end(program), Ok(Val::from("missing: user 7")));
}

#[test]
fn test_try_continues_after_caught_effect() {
    let guarded = Try::new(throw_err("E", 1)).handle(HandlerTable::new().catch("E", |_| Val::from(0)));
    let program = guarded.map(|val| Val::Num(val.as_num().unwrap() + 5.0));

    assert_eq!(run_to_end(program), Ok(Val::Num(5.0)));
}

#[test]
fn test_unhandled_error_effect_fails_run() {
    let program = Try::new(throw_err("Denied", "nope")).handle(HandlerTable::new().catch("Other", |e| e));

    let result = run_to_end(program);
    assert_eq!(
        result,
        Err(RunError::Effect {
            name: "Denied".into(),
            error: Val::from("nope"),
        })
    );
    assert_eq!(result.unwrap_err().effect_name(), Some("Denied"));
}

#[test]
fn test_native_catch_does_not_see_error_effects() {
    let body = throw_err("E", "x").catch(|_| pure("native"));
    let program = Try::new(body).handle(HandlerTable::new().catch("E", |_| Val::from("effect")));

    assert_eq!(run_to_end(program), Ok(Val::from("effect")));
}

#[test]
fn test_error_effect_reaches_matching_outer_table() {
    let inner = Try::new(throw_err("E2", "x")).handle(HandlerTable::new().catch("E1", |_| Val::from("inner")));
    let program = Try::new(inner.map(|_| Val::from("inner continued")))
        .handle(HandlerTable::new().catch("E2", |_| Val::from("outer")));

    assert_eq!(run_to_end(program), Ok(Val::from("outer")));
}

#[test]
fn test_catch_any_receives_effect_name() {
    let program = Try::new(throw_err("Timeout", 30))
        .handle(HandlerTable::new().catch_any(|name, error| Val::from(format!("{}:{}", name, error))));

    assert_eq!(run_to_end(program), Ok(Val::from("Timeout:30")));
}

#[test]
fn test_ambient_tables_do_not_catch_error_effects() {
    let ambient = HandlerChain::from(HandlerTable::new().catch("E", |_| Val::from("ambient")));
    let mut vm = VM::new(throw_err("E", "x")).with_ambient(ambient);

    assert!(run_until_suspended(&mut vm).is_none());
    assert_eq!(
        vm.into_outcome(),
        Some(Err(RunError::Effect {
            name: "E".into(),
            error: Val::from("x"),
        }))
    );
}
