//! Shopwright CLI library
//!
//! Command-line interface for running the shop suites.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ListArgs, LogFormatArg, ReportFormat, RunArgs, SuiteArg,
};
pub use config::{CliConfig, ColorChoice, LogFormat, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{emit_report, render_report, ProgressReporter};
pub use runner::{check_env, list, SuiteRunner};
