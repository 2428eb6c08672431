use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use expense_tracker::cli::{self, Cli};

const LOG_ENV: &str = "EXPENSE_TRACKER_LOG";

fn main() {
    // Logs go to stderr so command output on stdout stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = cli::run(Cli::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
