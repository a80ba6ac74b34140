mod config;
mod db;
mod error;
mod import;
mod ledger;
mod models;
mod run;

use std::process::ExitCode;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT_TRACING: Once = Once::new();

/// Logs go to stderr so stdout stays a single JSON document.
fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("sharedledger=info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();
    run::as_cli(&args)
}
