//! CLI entrypoint for the keel conformance harness.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use keel_conformance::{render_markdown, run_all, HarnessError};

/// CLI for running keel conformance scenarios.
#[derive(Debug, Parser)]
#[command(name = "keel-conformance")]
#[command(about = "Runs the keel runtime-core conformance scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Run every scenario and print a summary.
    Run {
        /// Optional JSON report path.
        #[arg(long)]
        report_json: Option<PathBuf>,
        /// Optional markdown report path.
        #[arg(long)]
        report_md: Option<PathBuf>,
    },
    /// List scenario names without running them.
    List,
}

fn run(command: Command) -> Result<bool, HarnessError> {
    match command {
        Command::Run {
            report_json,
            report_md,
        } => {
            let report = run_all();
            for s in &report.scenarios {
                let verdict = if s.passed { "pass" } else { "FAIL" };
                println!("{verdict:4}  {}  {}", s.name, s.detail);
            }
            println!("{} passed, {} failed", report.passed, report.failed);

            if let Some(path) = report_json {
                fs::write(path, serde_json::to_string_pretty(&report)?)?;
            }
            if let Some(path) = report_md {
                fs::write(path, render_markdown(&report))?;
            }
            Ok(report.failed == 0)
        }
        Command::List => {
            for s in run_all().scenarios {
                println!("{}", s.name);
            }
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
