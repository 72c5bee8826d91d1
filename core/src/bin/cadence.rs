/// Cadence CLI
///
/// Runs the scheduling benchmark and inspects configuration without writing
/// any program code.

use cadence_core::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
