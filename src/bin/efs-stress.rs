//! efs-stress CLI Binary
//!
//! Exit codes: 0 listings match, 1 mismatch or failed stage, 2 usage or
//! configuration error, 3 device unreachable.

use anyhow::Context;
use clap::{CommandFactory, Parser};
use efs_stress::logging::init_logging;
use efs_stress::shell::AdbChannel;
use efs_stress::tooling::cli::{Cli, CliContext};
use std::io::{self, IsTerminal};
use std::process::ExitCode;

const EXIT_USAGE: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Invalid configuration is a usage error, reported before anything runs
    let context = match CliContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", Cli::command().render_usage());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match run(&cli, &context) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, context: &CliContext) -> anyhow::Result<u8> {
    if cli.print_config {
        print!("{}", context.render_config()?);
        return Ok(0);
    }

    init_logging(Some(&context.config().logging)).context("initializing logging")?;

    let mut channel = AdbChannel::from_config(&context.config().device);
    let stdout = io::stdout();
    let color = stdout.is_terminal();
    let report = context
        .execute(&mut channel, stdout.lock(), color)
        .context("writing progress")?;

    if let Some(format) = cli.report {
        println!("{}", CliContext::render_report(&report, format)?);
    }
    Ok(report.verdict.exit_code() as u8)
}
