//! Rule test runner binary entrypoint.
//!
//! This is the main entry point for the `claw-ruletest` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use claw_ruletest::TestRunner;
use claw_ruletest_cli::{Cli, CliError, OutputFormat, RunCommand};

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<bool, CliError> {
    let config = cli.runner_config()?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    let cmd = RunCommand::new(TestRunner::new(config));
    cmd.execute(&mut stdout, &format, &cli.files).await
}
