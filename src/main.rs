use std::process;

use clap::Parser;
use git_summary::{Cli, SummaryError};

/// Exit status for internal invariant violations (sysexits EX_SOFTWARE).
const EXIT_INTERNAL: i32 = 70;

fn main() {
    let cli = Cli::parse();

    // Write to stderr so log lines never mix with the JSON on stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level())),
        )
        .init();

    if let Err(e) = cli.execute() {
        let internal = e
            .chain()
            .any(|cause| cause.downcast_ref::<SummaryError>().is_some_and(SummaryError::is_internal));

        if internal {
            eprintln!("Internal error: {e}");
        } else {
            eprintln!("Error: {e}");
        }

        // Print the full error chain if available
        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("  Caused by: {err}");
            source = err.source();
        }

        process::exit(if internal { EXIT_INTERNAL } else { 1 });
    }
}
