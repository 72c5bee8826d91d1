//! Synthetic scheduling benchmark
//!
//! Feeds a producer of sleeping tasks through `concurrent` and reports
//! throughput, failures and the highest number of tasks running at once.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::driver::{run_async, AbortController, RunOptions};
use crate::effects::sleep;
use crate::error::{Exception, RunError};
use crate::program::{from_fn, lazy, pure, throw, BoxProgram, Program, ProgramExt, Resume, Yield};
use crate::task::{concurrent, Pull, TaskOptions, TaskSource, TaskStream};
use crate::types::Val;

pub struct BenchmarkParams {
    pub tasks: usize,
    pub concurrency: Option<usize>,
    pub delay_ms: u64,
    /// Every n-th task throws
    pub fail_every: Option<usize>,
    /// Abort the whole run after this many milliseconds
    pub abort_after_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub tasks: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub aborted: bool,
    pub peak_in_flight: usize,
    pub total_duration_ms: f64,
}

impl BenchmarkReport {
    pub fn throughput(&self) -> f64 {
        let finished = (self.succeeded + self.failed) as f64;
        if self.total_duration_ms > 0.0 {
            finished / (self.total_duration_ms / 1000.0)
        } else {
            0.0
        }
    }
}

/// Counters shared by every benchmark task
#[derive(Default)]
struct Counters {
    active: AtomicUsize,
    peak: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
}

pub async fn run_benchmark(params: BenchmarkParams) -> Result<BenchmarkReport> {
    validate_params(&params)?;

    info!(
        tasks = params.tasks,
        concurrency = ?params.concurrency,
        delay_ms = params.delay_ms,
        "starting benchmark"
    );

    let counters = Arc::new(Counters::default());
    let source = workload(&params, counters.clone());

    let mut options = TaskOptions::new();
    if let Some(max) = params.concurrency {
        options = options.max_concurrency(max);
    }
    let program = concurrent(source, drain, options)?;

    let controller = AbortController::new();
    if let Some(ms) = params.abort_after_ms {
        let controller = controller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            controller.abort();
        });
    }

    let start_time = Utc::now();
    let started = Instant::now();

    let outcome = run_async(program, RunOptions::new().abort_signal(controller.signal())).await;
    let aborted = match outcome {
        Ok(_) => false,
        Err(RunError::Exception(Exception::Aborted)) => true,
        Err(e) => return Err(anyhow!("Benchmark run failed: {}", e)),
    };

    let report = BenchmarkReport {
        start_time,
        end_time: Utc::now(),
        tasks: params.tasks,
        succeeded: counters.succeeded.load(Ordering::SeqCst),
        failed: counters.failed.load(Ordering::SeqCst),
        aborted,
        peak_in_flight: counters.peak.load(Ordering::SeqCst),
        total_duration_ms: started.elapsed().as_secs_f64() * 1000.0,
    };

    info!(
        succeeded = report.succeeded,
        failed = report.failed,
        aborted = report.aborted,
        "benchmark finished"
    );
    Ok(report)
}

fn validate_params(params: &BenchmarkParams) -> Result<()> {
    if params.tasks == 0 {
        return Err(anyhow!("Must specify at least 1 task"));
    }

    if params.concurrency == Some(0) {
        return Err(anyhow!("Concurrency must be at least 1"));
    }

    if params.fail_every == Some(0) {
        return Err(anyhow!("--fail-every must be at least 1"));
    }

    Ok(())
}

/// Producer of `params.tasks` sleeping tasks
fn workload(params: &BenchmarkParams, counters: Arc<Counters>) -> TaskSource {
    let tasks = params.tasks;
    let delay = Duration::from_millis(params.delay_ms);
    let fail_every = params.fail_every;

    TaskSource::from_fn(move |index| {
        if index >= tasks {
            return None;
        }
        let fails = fail_every.map_or(false, |n| index % n == n - 1);
        Some(bench_task(index, delay, fails, counters.clone()))
    })
}

fn bench_task(index: usize, delay: Duration, fails: bool, counters: Arc<Counters>) -> BoxProgram {
    let finish = counters.clone();

    lazy(move || {
        let now = counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak.fetch_max(now, Ordering::SeqCst);
        pure(Val::Null)
    })
    .then(sleep(delay))
    .then(lazy(move || -> BoxProgram {
        finish.active.fetch_sub(1, Ordering::SeqCst);
        if fails {
            finish.failed.fetch_add(1, Ordering::SeqCst);
            throw(Exception::msg(format!("task {} failed", index))).boxed()
        } else {
            finish.succeeded.fetch_add(1, Ordering::SeqCst);
            pure(index).boxed()
        }
    }))
    .boxed()
}

/// Reducer that settles every task and returns how many it saw
fn drain(stream: TaskStream) -> impl Program {
    let mut seen = 0usize;
    let mut started = false;

    from_fn(move |_cx, input| {
        match input {
            Resume::Throw(error) => return Yield::Throw(error),
            Resume::Value(val) if started => match Pull::from_val(val) {
                Pull::End => return Yield::Return(Val::from(seen)),
                Pull::Item(_) => seen += 1,
            },
            Resume::Value(_) => started = true,
        }
        Yield::Delegate(stream.result().boxed())
    })
}

pub fn display_report(report: &BenchmarkReport) {
    println!("\n📊 Benchmark Results");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("   Tasks:           {}", report.tasks);
    println!("   Succeeded:       {}", report.succeeded);
    println!("   Failed:          {}", report.failed);
    println!("   Aborted:         {}", report.aborted);
    println!("   Peak in flight:  {}", report.peak_in_flight);
    println!("   Duration:        {:.2}ms", report.total_duration_ms);
    println!("   Throughput:      {:.2} tasks/sec", report.throughput());
    println!("   Started:         {}", report.start_time);
    println!("   Finished:        {}", report.end_time);
}
