use std::process::ExitCode;

use clap::Parser;
use pypi_ebuild::cli::{self, Cli};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `--verbose` forces debug output; otherwise `RUST_LOG`, defaulting to info.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("pypi_ebuild=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pypi_ebuild=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!("starting with {cli:?}");

    let report = match cli::run(&cli) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    for cpv in &report.emitted {
        println!("{cpv}");
    }
    for failure in &report.failed {
        eprintln!("failed: {}: {}", failure.source, failure.error);
    }
    for name in &report.unresolved {
        eprintln!("missing: {name}");
    }

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
