//! CLI command definitions using clap

use crate::config::{ColorChoice, LogFormat};
use clap::{Args, Parser, Subcommand, ValueEnum};
use shopwright::{BrowserOptions, RetryConfig, RunnerConfig, SuiteSelection};
use std::path::PathBuf;
use std::time::Duration;

/// Shopwright: end-to-end login and registration checks for a web shop
#[derive(Parser, Debug)]
#[command(name = "shopwright")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (failures only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run suites against the shop in a real browser
    Run(RunArgs),

    /// List cases and page locators without running anything
    List(ListArgs),

    /// Validate the environment fixture without launching a browser
    CheckEnv,
}

/// Arguments for the run command
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Suite to run
    #[arg(short, long, default_value = "all")]
    pub suite: SuiteArg,

    /// Only run cases whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Concurrent cases (0 = available CPUs)
    #[arg(short = 'j', long, default_value = "0", env = "SHOPWRIGHT_JOBS")]
    pub jobs: usize,

    /// Whole-case timeout in milliseconds
    #[arg(long, default_value = "30000")]
    pub case_timeout_ms: u64,

    /// Element and expectation wait in milliseconds
    #[arg(long, default_value = "5000")]
    pub wait_ms: u64,

    /// Poll interval while waiting, in milliseconds
    #[arg(long, default_value = "100")]
    pub poll_ms: u64,

    /// Navigation timeout in milliseconds
    #[arg(long, default_value = "30000")]
    pub nav_timeout_ms: u64,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, env = "CHROMIUM_PATH")]
    pub chromium_path: Option<PathBuf>,

    /// Disable the Chromium sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Also run cases whose expected behavior is unconfirmed
    #[arg(long)]
    pub include_unverified: bool,

    /// Report format
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Runner policy from the flags
    #[must_use]
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::new()
            .with_workers(self.jobs)
            .with_case_timeout(Duration::from_millis(self.case_timeout_ms))
            .with_wait(
                RetryConfig::new(Duration::from_millis(self.wait_ms))
                    .with_poll_interval(Duration::from_millis(self.poll_ms)),
            )
            .with_navigation_timeout(Duration::from_millis(self.nav_timeout_ms))
            .with_unverified(self.include_unverified)
    }

    /// Browser launch options from the flags
    #[must_use]
    pub fn browser_options(&self) -> BrowserOptions {
        let mut options = BrowserOptions::default().with_headless(!self.headed);
        if let Some(ref path) = self.chromium_path {
            options = options.with_chromium_path(path.to_string_lossy());
        }
        if self.no_sandbox {
            options = options.with_no_sandbox();
        }
        options
    }
}

/// Arguments for the list command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Suite to list
    #[arg(short, long, default_value = "all")]
    pub suite: SuiteArg,

    /// Include unverified cases
    #[arg(long)]
    pub include_unverified: bool,

    /// List page locators instead of cases
    #[arg(long)]
    pub locators: bool,
}

/// Suite argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SuiteArg {
    /// Login and registration
    #[default]
    All,
    /// Login only
    Login,
    /// Registration only
    Register,
}

impl From<SuiteArg> for SuiteSelection {
    fn from(arg: SuiteArg) -> Self {
        match arg {
            SuiteArg::All => Self::All,
            SuiteArg::Login => Self::Login,
            SuiteArg::Register => Self::Register,
        }
    }
}

/// Report output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Plain text
    #[default]
    Text,
    /// JSON
    Json,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormatArg {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON lines
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}
