//! Shopwright CLI: login and registration checks for a web shop
//!
//! ## Usage
//!
//! ```bash
//! shopwright check-env                          # Validate BASE_URL, TEST_* variables
//! shopwright list --locators                    # Show page locators
//! shopwright run --suite login -j 4             # Run the login suite
//! shopwright run --format json -o report.json   # Machine-readable report
//! ```

use clap::Parser;
use shopwright_cli::{
    check_env, emit_report, list, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands,
    LogFormat, SuiteRunner, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(&config);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let color: ColorChoice = cli.color.into();
    let use_color = color.should_color();
    console::set_colors_enabled(use_color);
    console::set_colors_enabled_stderr(use_color);

    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.verbose, cli.quiet))
        .with_color(color)
        .with_log_format(cli.log_format.into())
}

fn init_tracing(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()));
    let registry = tracing_subscriber::registry().with(filter);
    let _ = match config.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(config.color.should_color())
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
}

async fn run(cli: Cli, config: CliConfig) -> CliResult<()> {
    match cli.command {
        Commands::Run(args) => {
            let report = SuiteRunner::new(config).run(&args).await?;
            emit_report(&report, args.format, args.output.as_deref())?;
            if report.success() {
                Ok(())
            } else {
                Err(CliError::CasesFailed {
                    failed: report.failed(),
                    total: report.results.len(),
                })
            }
        }
        Commands::List(args) => {
            print!("{}", list(&args));
            Ok(())
        }
        Commands::CheckEnv => {
            let fixture = check_env()?;
            println!("BASE_URL    {}", fixture.base_url);
            println!("TEST_EMAIL  {}", fixture.credentials.email);
            println!("environment OK");
            Ok(())
        }
    }
}
