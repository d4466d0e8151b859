// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Booky — book scanning project manager
//
// Entry point. Parses the command line, initialises logging and runs the
// selected subcommand.

mod cli;
mod commands;

use std::process::ExitCode;

use booky_core::BookyError;
use booky_core::human_errors::humanize_error;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.dry_run {
        tracing::warn!("Dry run, nothing will be created");
    }

    match commands::run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_failure(&cli, &err);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise info with `--verbose`, warnings only without.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn report_failure(cli: &Cli, err: &BookyError) {
    match cli.book_id() {
        Some(book) => tracing::error!(%book, error = %err, "Command failed"),
        None => tracing::error!(error = %err, "Command failed"),
    }

    eprint!("{}", failure_report(err));
}

/// The text shown to the operator after a failed command.
fn failure_report(err: &BookyError) -> String {
    let human = humanize_error(err);
    let mut report = format!(
        "error ({}): {}\n  {}\n",
        human.severity.label(),
        human.message,
        human.suggestion
    );
    if human.retriable {
        report.push_str("  Running the command again may succeed.\n");
    }
    report.push_str(&format!("  ({err})\n"));
    report
}
