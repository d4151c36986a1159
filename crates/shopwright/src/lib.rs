//! Shopwright: page objects and an isolated test-case runner for web shop
//! authentication flows.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Test Harness │───►│ Page Object  │───►│   Locator    │───►│   Session    │
//! │ (per-case    │    │ (login,      │    │ (lazy, polls │    │ (Chromium or │
//! │  isolation)  │    │  register)   │    │  until wait) │    │  mock)       │
//! └──────────────┘    └──────────────┘    └──────────────┘    └──────────────┘
//!        ▲                                                            │
//!        └──────────── Fixture (Arc, read-only) ───── StepEvents ◄────┘
//! ```
//!
//! ```no_run
//! use shopwright::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run(factory: Arc<dyn SessionFactory>) -> ShopResult<()> {
//! let fixture = Arc::new(Fixture::from_env()?);
//! let harness = TestHarness::new(RunnerConfig::default(), factory, fixture);
//! let report = harness.run(&SuiteSelection::All.build(), None).await;
//! println!("{}", report.to_text());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

mod assertion;
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
mod browser;
mod config;
mod fixture;
#[allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]
mod harness;
mod locator;
#[allow(clippy::module_name_repetitions)]
mod page_object;
mod reporter;
mod result;
#[allow(clippy::missing_errors_doc)]
mod session;
mod trace;

/// Expected UI messages of the shop under test
pub mod messages;

/// Built-in login and registration suites
pub mod suites;

pub use assertion::retry::{
    AssertionCheckResult, RetryAssertion, RetryConfig, RetryError, RetryResult,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS,
};
pub use assertion::{expect, expect_url, Expect, UrlExpect};
#[cfg(feature = "browser")]
pub use browser::{ChromiumSession, ChromiumSessionFactory};
pub use config::{
    BrowserOptions, RunnerConfig, DEFAULT_CASE_TIMEOUT_MS, DEFAULT_NAVIGATION_TIMEOUT_MS,
};
pub use fixture::{
    unique_email, Fixture, RegistrationData, UserCredentials, ENV_BASE_URL, ENV_TEST_EMAIL,
    ENV_TEST_PASSWORD, ENV_TEST_USER_LASTNAME, ENV_TEST_USER_NAME, REQUIRED_VARIABLES,
};
pub use harness::{
    CaseContext, CaseFuture, RunObserver, TestCase, TestHarness, TestSuite,
};
pub use locator::{normalize_whitespace, AttributeSelector, Locator, Selector, TextMatch};
pub use page_object::{
    catalogue, LocatorDescription, LoginLocators, LoginPage, PageDescription, PageObject,
    RegisterLocators, RegisterPage,
};
pub use reporter::{CaseResult, CaseStatus, Failure, SuiteReport};
pub use result::{FailureKind, ShopError, ShopResult};
pub use session::{
    join_url, ElementHandle, Interaction, MockDocument, MockElement, MockSession,
    MockSessionFactory, Reaction, Session, SessionFactory,
};
pub use suites::SuiteSelection;
pub use trace::{
    ObservedSession, StepEvent, StepKind, StepObserver, StepPhase, StepRecorder,
    TracingObserver,
};

/// Prelude for convenient imports
pub mod prelude {
    #[cfg(feature = "browser")]
    pub use super::browser::*;
    pub use super::assertion::retry::RetryConfig;
    pub use super::assertion::*;
    pub use super::config::*;
    pub use super::fixture::*;
    pub use super::harness::*;
    pub use super::locator::*;
    pub use super::page_object::*;
    pub use super::reporter::*;
    pub use super::result::*;
    pub use super::session::*;
    pub use super::suites::{login_suite, register_suite, SuiteSelection};
    pub use super::trace::*;
}
