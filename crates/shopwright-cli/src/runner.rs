//! Suite runner and the non-running commands

use crate::commands::{ListArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use shopwright::{
    catalogue, Fixture, RunnerConfig, SessionFactory, SuiteReport, SuiteSelection, TestHarness,
    TestSuite, TracingObserver,
};
use std::fmt::Write as _;
use std::sync::Arc;

/// Runs suites and reports progress on the terminal
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    config: CliConfig,
}

impl SuiteRunner {
    /// Create a new runner
    #[must_use]
    pub const fn new(config: CliConfig) -> Self {
        Self { config }
    }

    /// Load the fixture, launch Chromium and run the selected suite
    ///
    /// # Errors
    ///
    /// Returns error if the fixture is incomplete, no case matches the
    /// filter or the browser cannot be launched
    pub async fn run(&self, args: &RunArgs) -> CliResult<SuiteReport> {
        let fixture = Arc::new(Fixture::from_env()?);
        let suite = SuiteSelection::from(args.suite).build();
        let runner_config = args.runner_config();
        if selected(&suite, args.filter.as_deref()) == 0 {
            return Err(CliError::invalid_argument(format!(
                "no case matches filter '{}'",
                args.filter.as_deref().unwrap_or_default()
            )));
        }

        #[cfg(feature = "browser")]
        {
            let factory = Arc::new(
                shopwright::ChromiumSessionFactory::launch(
                    &args.browser_options(),
                    fixture.base_url.clone(),
                    runner_config.navigation_timeout,
                )
                .await?,
            );
            let report = self
                .execute(
                    &suite,
                    args.filter.as_deref(),
                    runner_config,
                    Arc::clone(&factory) as Arc<dyn SessionFactory>,
                    fixture,
                )
                .await;
            if let Err(err) = factory.shutdown().await {
                tracing::warn!(error = %err, "browser shutdown failed");
            }
            Ok(report)
        }

        #[cfg(not(feature = "browser"))]
        {
            let _ = (runner_config, fixture);
            Err(CliError::config(
                "built without the `browser` feature; rebuild with --features browser",
            ))
        }
    }

    /// Run `suite` on sessions from `factory`, reporting progress
    pub async fn execute(
        &self,
        suite: &TestSuite,
        filter: Option<&str>,
        runner_config: RunnerConfig,
        factory: Arc<dyn SessionFactory>,
        fixture: Arc<Fixture>,
    ) -> SuiteReport {
        let mut progress = ProgressReporter::new(
            self.config.color.should_color(),
            self.config.verbosity.is_quiet(),
        );
        progress.header(&format!("Running {} against {}", suite.name, fixture.base_url));
        progress.start_progress(selected(suite, filter) as u64, "starting");
        let progress = Arc::new(progress);

        let harness = TestHarness::new(runner_config, factory, fixture)
            .with_step_observer(Arc::new(TracingObserver))
            .with_run_observer(Arc::clone(&progress) as Arc<dyn shopwright::RunObserver>);
        let report = harness.run(suite, filter).await;

        progress.finish();
        progress.summary(
            report.passed(),
            report.failed(),
            report.skipped(),
            report.duration(),
        );
        report
    }
}

fn selected(suite: &TestSuite, filter: Option<&str>) -> usize {
    suite
        .cases()
        .iter()
        .filter(|c| filter.map_or(true, |f| c.name().contains(f)))
        .count()
}

/// Render the `list` command output
#[must_use]
pub fn list(args: &ListArgs) -> String {
    let mut out = String::new();
    if args.locators {
        for page in catalogue() {
            let _ = writeln!(out, "{} ({})", page.name, page.path);
            for loc in page.locators {
                let _ = writeln!(out, "  {:<28} {:<13} {}", loc.field, loc.kind, loc.selector);
            }
        }
        return out;
    }

    let suite = SuiteSelection::from(args.suite).build();
    for case in suite.cases() {
        if case.is_unverified() && !args.include_unverified {
            continue;
        }
        let marker = if case.is_unverified() { " [unverified]" } else { "" };
        let _ = writeln!(out, "{}{marker}", case.name());
    }
    out
}

/// Validate the environment fixture
///
/// # Errors
///
/// Returns `MissingEnvironment` naming every absent or blank variable
pub fn check_env() -> CliResult<Fixture> {
    match Fixture::from_env() {
        Ok(fixture) => Ok(fixture),
        Err(shopwright::ShopError::FixtureMissing { .. }) => {
            // `.env` has been applied by now, so the process environment is
            // what the fixture saw
            let variables = Fixture::missing_variables(|name| std::env::var(name).ok())
                .into_iter()
                .map(str::to_string)
                .collect();
            Err(CliError::MissingEnvironment { variables })
        }
        Err(err) => Err(err.into()),
    }
}
