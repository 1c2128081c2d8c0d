//! # claw-ruletest-cli
//!
//! Command-line runner for Clawbernetes alerting rule tests.
//!
//! ```text
//! claw-ruletest [--format table|json] [--lookback 5m] [--interval 1m] <FILE>...
//! ```
//!
//! Every file is loaded and run in parallel, reports are printed in argument
//! order, and the process exits with status 0 only if every file loaded and
//! every assertion passed.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod error;
pub mod output;
pub mod run;

pub use cli::{Cli, Format};
pub use error::CliError;
pub use output::{FileReport, OutputFormat, RunSummary, TableDisplay};
pub use run::RunCommand;
