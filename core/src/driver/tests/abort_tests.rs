//! Tests for cancellation through the abort signal

use std::time::Duration;

use tokio::time::Instant;

use crate::driver::{run_async, AbortController, RunOptions};
use crate::effects::sleep;
use crate::error::{Exception, RunError};
use crate::interpreter::Try;
use crate::program::{pure, ProgramExt};
use crate::testing::{entries, new_log, record};
use crate::types::Val;

fn aborted() -> Result<Val, RunError> {
    Err(RunError::Exception(Exception::Aborted))
}

async fn abort_after(controller: &AbortController, delay: Duration) {
    tokio::time::sleep(delay).await;
    controller.abort();
}

#[tokio::test(start_paused = true)]
async fn test_abort_unwinds_finally_inner_to_outer() {
    let log = new_log();
    let controller = AbortController::new();

    let inner = Try::new(sleep(Duration::from_secs(60)).then(record(&log, "unreachable")))
        .finally(record(&log, "inner"));
    let program = Try::new(inner).finally(record(&log, "outer"));

    let (result, _) = tokio::join!(
        run_async(program, RunOptions::new().abort_signal(controller.signal())),
        abort_after(&controller, Duration::from_secs(1)),
    );

    assert_eq!(result, aborted());
    assert_eq!(entries(&log), vec!["inner", "outer"]);
}

#[tokio::test(start_paused = true)]
async fn test_already_aborted_signal_fails_first_suspension() {
    let log = new_log();
    let controller = AbortController::new();
    controller.abort();

    let program = record(&log, "started").then(sleep(Duration::from_secs(1)));
    let result = run_async(program, RunOptions::new().abort_signal(controller.signal())).await;

    assert_eq!(result, aborted());
    assert_eq!(entries(&log), vec!["started"]);
}

#[tokio::test]
async fn test_aborted_signal_ignored_without_suspension() {
    let controller = AbortController::new();
    controller.abort();

    let result = run_async(pure(1), RunOptions::new().abort_signal(controller.signal())).await;
    assert_eq!(result, Ok(Val::Num(1.0)));
}

#[tokio::test(start_paused = true)]
async fn test_caught_abort_aborts_next_suspension() {
    let log = new_log();
    let controller = AbortController::new();
    let catch_log = log.clone();
    let program = sleep(Duration::from_secs(60)).catch(move |error| {
        catch_log.lock().unwrap().push(error.to_string());
        sleep(Duration::from_secs(3600)).then(pure("kept running"))
    });

    let started = Instant::now();
    let (result, _) = tokio::join!(
        run_async(program, RunOptions::new().abort_signal(controller.signal())),
        abort_after(&controller, Duration::from_secs(1)),
    );

    assert_eq!(result, aborted());
    assert_eq!(entries(&log), vec!["Operation aborted"]);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_caught_abort_still_completes_without_suspension() {
    let controller = AbortController::new();
    let program = sleep(Duration::from_secs(60)).catch(|error| pure(error.to_string()));

    let (result, _) = tokio::join!(
        run_async(program, RunOptions::new().abort_signal(controller.signal())),
        abort_after(&controller, Duration::from_secs(1)),
    );

    assert_eq!(result, Ok(Val::from("Operation aborted")));
}

#[tokio::test(start_paused = true)]
async fn test_cleanup_suspensions_are_not_aborted() {
    let log = new_log();
    let controller = AbortController::new();

    let cleanup = sleep(Duration::from_secs(5)).then(record(&log, "cleanup finished"));
    let program = Try::new(sleep(Duration::from_secs(60))).finally(cleanup);

    let (result, _) = tokio::join!(
        run_async(program, RunOptions::new().abort_signal(controller.signal())),
        abort_after(&controller, Duration::from_secs(1)),
    );

    assert_eq!(result, aborted());
    assert_eq!(entries(&log), vec!["cleanup finished"]);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_abort_runs_each_cleanup_once() {
    let log = new_log();
    let controller = AbortController::new();

    let inner = Try::new(sleep(Duration::from_secs(60))).finally(record(&log, "inner"));
    let program = Try::new(inner).finally(record(&log, "outer"));

    let (result, _) = tokio::join!(
        run_async(program, RunOptions::new().abort_signal(controller.signal())),
        async {
            abort_after(&controller, Duration::from_secs(1)).await;
            controller.abort();
            controller.abort();
        },
    );

    assert_eq!(result, aborted());
    assert_eq!(entries(&log), vec!["inner", "outer"]);
}
