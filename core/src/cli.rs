use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::benchmark::{display_report, run_benchmark, BenchmarkParams};
use crate::init::InitBuilder;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Cadence - A composable effect runtime", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log filter (overrides config file and env vars)
    #[arg(long, global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a synthetic scheduling benchmark
    Bench {
        /// Number of tasks to produce
        #[arg(long, default_value = "1000")]
        tasks: usize,

        /// Maximum tasks in flight (default: runtime.max_concurrency, else unbounded)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Milliseconds each task sleeps
        #[arg(long, default_value = "1")]
        delay_ms: u64,

        /// Make every n-th task throw
        #[arg(long)]
        fail_every: Option<usize>,

        /// Abort the run after this many milliseconds
        #[arg(long)]
        abort_after_ms: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved configuration as JSON
    Config,
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    let mut init = InitBuilder::new();
    if let Some(path) = cli.config {
        init = init.config_path(path);
    }
    if let Some(filter) = cli.log_filter {
        init = init.log_filter(filter);
    }

    // Config errors surface before any command output
    let config = init.init()?;

    match cli.command {
        Commands::Bench {
            tasks,
            concurrency,
            delay_ms,
            fail_every,
            abort_after_ms,
            json,
        } => {
            let params = BenchmarkParams {
                tasks,
                concurrency: concurrency.or(config.runtime.max_concurrency),
                delay_ms,
                fail_every,
                abort_after_ms,
            };

            let report = run_benchmark(params).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&report).context("Failed to serialize report")?
                );
            } else {
                display_report(&report);
            }
        }

        Commands::Config => {
            println!(
                "{}",
                serde_json::to_string_pretty(config).context("Failed to serialize configuration")?
            );
        }
    }

    Ok(())
}
