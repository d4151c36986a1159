//! Test harness for running suites of isolated browser cases.
//!
//! ```text
//! TestSuite ──► TestHarness::run
//!                 │  buffer_unordered(workers)
//!                 ├─► case 1: open session ─► spawn body ─► close ─► CaseResult
//!                 ├─► case 2: ...
//!                 └─► results re-sorted into declaration order ─► SuiteReport
//! ```
//!
//! Each case runs on its own session inside its own task, so a failing,
//! panicking or timed-out case never affects its siblings.

use crate::assertion::retry::RetryConfig;
use crate::assertion::{expect, expect_url, Expect, UrlExpect};
use crate::config::RunnerConfig;
use crate::fixture::Fixture;
use crate::locator::Locator;
use crate::page_object::{LoginPage, RegisterPage};
use crate::reporter::{CaseResult, Failure, SuiteReport};
use crate::result::{ShopError, ShopResult};
use crate::session::{Session, SessionFactory};
use crate::trace::{ObservedSession, StepObserver, StepRecorder};
use futures::stream::{self, StreamExt};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Bound on session teardown after a case
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Boxed future returned by a case body
pub type CaseFuture = Pin<Box<dyn Future<Output = ShopResult<()>> + Send>>;

type CaseBody = Arc<dyn Fn(CaseContext) -> CaseFuture + Send + Sync>;

/// Everything a case body may use
#[derive(Clone)]
pub struct CaseContext {
    name: String,
    session: Arc<dyn Session>,
    fixture: Arc<Fixture>,
    wait: RetryConfig,
}

impl fmt::Debug for CaseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaseContext")
            .field("name", &self.name)
            .field("session", &self.session.id())
            .field("wait", &self.wait)
            .finish_non_exhaustive()
    }
}

impl CaseContext {
    /// Create a context (the harness does this per case)
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        session: Arc<dyn Session>,
        fixture: Arc<Fixture>,
        wait: RetryConfig,
    ) -> Self {
        Self {
            name: name.into(),
            session,
            fixture,
            wait,
        }
    }

    /// Case name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The case's exclusive session
    #[must_use]
    pub fn session(&self) -> Arc<dyn Session> {
        Arc::clone(&self.session)
    }

    /// Shared read-only fixture
    #[must_use]
    pub fn fixture(&self) -> &Fixture {
        &self.fixture
    }

    /// Wait policy for locators and expectations
    #[must_use]
    pub const fn wait(&self) -> RetryConfig {
        self.wait
    }

    /// Fresh login page on this case's session
    #[must_use]
    pub fn login_page(&self) -> LoginPage {
        LoginPage::with_wait(self.session(), self.wait)
    }

    /// Fresh registration page on this case's session
    #[must_use]
    pub fn register_page(&self) -> RegisterPage {
        RegisterPage::with_wait(self.session(), self.wait)
    }

    /// Expectation on `locator`
    #[must_use]
    pub fn expect<'a>(&'a self, locator: &'a Locator) -> Expect<'a> {
        expect(self.session.as_ref(), locator)
    }

    /// Expectation on the page URL
    #[must_use]
    pub fn expect_url(&self) -> UrlExpect<'_> {
        expect_url(self.session.as_ref()).with_config(self.wait)
    }
}

/// A named, independent test case
#[derive(Clone)]
pub struct TestCase {
    name: String,
    body: CaseBody,
    unverified: bool,
    timeout: Option<Duration>,
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("unverified", &self.unverified)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TestCase {
    /// Create a case from an async body
    pub fn new<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(CaseContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ShopResult<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(move |ctx| -> CaseFuture { Box::pin(body(ctx)) }),
            unverified: false,
            timeout: None,
        }
    }

    /// Mark as unverified: expected behavior is not confirmed against the site
    #[must_use]
    pub const fn unverified(mut self) -> Self {
        self.unverified = true;
        self
    }

    /// Override the runner's case timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Case name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the case is unverified
    #[must_use]
    pub const fn is_unverified(&self) -> bool {
        self.unverified
    }
}

/// An ordered collection of cases
#[derive(Debug, Clone)]
pub struct TestSuite {
    /// Suite name
    pub name: String,
    cases: Vec<TestCase>,
}

impl TestSuite {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    /// Add a case
    #[must_use]
    pub fn with_case(mut self, case: TestCase) -> Self {
        self.cases.push(case);
        self
    }

    /// Add a case
    pub fn add_case(&mut self, case: TestCase) {
        self.cases.push(case);
    }

    /// Append every case of `other`
    pub fn extend(&mut self, other: Self) {
        self.cases.extend(other.cases);
    }

    /// Cases in declaration order
    #[must_use]
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Number of cases
    #[must_use]
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// Whether the suite has no cases
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Receives case lifecycle notifications
pub trait RunObserver: Send + Sync {
    /// Case about to run
    fn case_started(&self, _name: &str) {}

    /// Case finished (or was skipped)
    fn case_finished(&self, _result: &CaseResult) {}
}

/// Runs suites against sessions opened by a factory
pub struct TestHarness {
    config: RunnerConfig,
    factory: Arc<dyn SessionFactory>,
    fixture: Arc<Fixture>,
    step_observers: Vec<Arc<dyn StepObserver>>,
    run_observers: Vec<Arc<dyn RunObserver>>,
}

impl fmt::Debug for TestHarness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestHarness")
            .field("config", &self.config)
            .field("step_observers", &self.step_observers.len())
            .field("run_observers", &self.run_observers.len())
            .finish_non_exhaustive()
    }
}

impl TestHarness {
    /// Create a harness
    #[must_use]
    pub fn new(config: RunnerConfig, factory: Arc<dyn SessionFactory>, fixture: Arc<Fixture>) -> Self {
        Self {
            config,
            factory,
            fixture,
            step_observers: Vec::new(),
            run_observers: Vec::new(),
        }
    }

    /// Add a step observer shared by every case
    #[must_use]
    pub fn with_step_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.step_observers.push(observer);
        self
    }

    /// Add a case lifecycle observer
    #[must_use]
    pub fn with_run_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.run_observers.push(observer);
        self
    }

    /// Get the runner configuration
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run every case of `suite` whose name contains `filter`.
    ///
    /// Unverified cases are reported as skipped unless enabled in the
    /// configuration. Results follow declaration order.
    pub async fn run(&self, suite: &TestSuite, filter: Option<&str>) -> SuiteReport {
        let start = Instant::now();
        let report = SuiteReport::new(suite.name.clone());
        let workers = self.config.effective_workers();
        let selected: Vec<(usize, &TestCase)> = suite
            .cases
            .iter()
            .filter(|case| filter.map_or(true, |f| case.name.contains(f)))
            .enumerate()
            .collect();

        tracing::info!(
            suite = %suite.name,
            cases = selected.len(),
            workers,
            "suite started"
        );

        let mut results: Vec<(usize, CaseResult)> = stream::iter(selected)
            .map(|(index, case)| async move {
                let result = if case.unverified && !self.config.include_unverified {
                    let skipped = CaseResult::skipped(&case.name, "unverified case not enabled");
                    self.notify_finished(&skipped);
                    skipped
                } else {
                    self.run_case(case).await
                };
                (index, result)
            })
            .buffer_unordered(workers.max(1))
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        let mut report = report.with_duration(start.elapsed());
        report.results = results.into_iter().map(|(_, r)| r).collect();

        tracing::info!(
            suite = %suite.name,
            passed = report.passed(),
            failed = report.failed(),
            skipped = report.skipped(),
            elapsed_ms = report.duration_ms,
            "suite finished"
        );
        report
    }

    fn notify_finished(&self, result: &CaseResult) {
        for observer in &self.run_observers {
            observer.case_finished(result);
        }
    }

    async fn run_case(&self, case: &TestCase) -> CaseResult {
        for observer in &self.run_observers {
            observer.case_started(&case.name);
        }
        let span = tracing::info_span!("case", name = %case.name);
        let result = self.execute(case).instrument(span).await;
        self.notify_finished(&result);
        result
    }

    async fn execute(&self, case: &TestCase) -> CaseResult {
        let start = Instant::now();
        let limit = case.timeout.unwrap_or(self.config.case_timeout);
        let deadline = tokio::time::Instant::now() + limit;
        let timed_out = || ShopError::CaseTimeout {
            ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        };

        tracing::info!("case started");

        let session = match tokio::time::timeout_at(deadline, self.factory.open()).await {
            Ok(Ok(session)) => session,
            Ok(Err(err)) => return verdict(case, start, Err(err), Vec::new()),
            Err(_) => return verdict(case, start, Err(timed_out()), Vec::new()),
        };

        let recorder = Arc::new(StepRecorder::new());
        let mut observers = self.step_observers.clone();
        observers.push(recorder.clone());
        let observed: Arc<dyn Session> = Arc::new(ObservedSession::new(
            Arc::clone(&session),
            case.name.clone(),
            observers,
        ));
        let ctx = CaseContext::new(
            case.name.clone(),
            Arc::clone(&observed),
            Arc::clone(&self.fixture),
            self.config.wait,
        );

        let task = tokio::spawn((case.body)(ctx).in_current_span());
        let abort = task.abort_handle();
        let outcome: Result<ShopResult<()>, Failure> =
            match tokio::time::timeout_at(deadline, task).await {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(join)) if join.is_panic() => Err(Failure::panic(panic_message(join.into_panic()))),
                Ok(Err(join)) => Ok(Err(ShopError::session(join.to_string()))),
                Err(_) => {
                    abort.abort();
                    Ok(Err(timed_out()))
                }
            };

        match tokio::time::timeout(CLOSE_TIMEOUT, observed.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "session close failed"),
            Err(_) => tracing::warn!("session close timed out"),
        }

        let steps = recorder.lines();
        match outcome {
            Ok(result) => verdict(case, start, result, steps),
            Err(failure) => {
                tracing::error!(message = %failure.message, "case panicked");
                CaseResult::failed(&case.name, start.elapsed(), failure).with_steps(steps)
            }
        }
    }
}

fn verdict(case: &TestCase, start: Instant, result: ShopResult<()>, steps: Vec<String>) -> CaseResult {
    let elapsed = start.elapsed();
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    match result {
        Ok(()) => {
            tracing::info!(elapsed_ms, "case passed");
            CaseResult::passed(&case.name, elapsed).with_steps(steps)
        }
        Err(err) => {
            tracing::warn!(kind = %err.kind(), error = %err, elapsed_ms, "case failed");
            CaseResult::failed(&case.name, elapsed, Failure::from(&err)).with_steps(steps)
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "case panicked".to_string())
}
