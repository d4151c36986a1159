//! Reporter - per-case verdicts and suite summaries.
//!
//! Results are kept in declaration order. A report renders as plain text
//! for terminals or as JSON for machines.

use crate::result::{FailureKind, ShopError, ShopResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

/// Case verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// All steps and expectations held
    Passed,
    /// A step or expectation failed
    Failed,
    /// Not run
    Skipped,
}

impl CaseStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if status is failing
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Upper-case label for text output
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        }
    }
}

/// Why a case failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Classification
    pub kind: FailureKind,
    /// Selector (or URL) involved
    pub selector: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl Failure {
    /// Failure caused by a panic in the case body
    #[must_use]
    pub fn panic(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Panic,
            selector: None,
            message: message.into(),
        }
    }
}

impl From<&ShopError> for Failure {
    fn from(err: &ShopError) -> Self {
        Self {
            kind: err.kind(),
            selector: err.selector().map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// Outcome of one case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseResult {
    /// Case name
    pub name: String,
    /// Verdict
    pub status: CaseStatus,
    /// Failure details for failed cases
    pub failure: Option<Failure>,
    /// Skip reason
    pub skip_reason: Option<String>,
    /// Wall time
    pub duration_ms: u64,
    /// Diagnostic step log
    pub steps: Vec<String>,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl CaseResult {
    /// Create a passing result
    #[must_use]
    pub fn passed(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Passed,
            failure: None,
            skip_reason: None,
            duration_ms: millis(duration),
            steps: Vec::new(),
        }
    }

    /// Create a failing result
    #[must_use]
    pub fn failed(name: impl Into<String>, duration: Duration, failure: Failure) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Failed,
            failure: Some(failure),
            skip_reason: None,
            duration_ms: millis(duration),
            steps: Vec::new(),
        }
    }

    /// Create a skipped result
    #[must_use]
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: CaseStatus::Skipped,
            failure: None,
            skip_reason: Some(reason.into()),
            duration_ms: 0,
            steps: Vec::new(),
        }
    }

    /// Attach the step log
    #[must_use]
    pub fn with_steps(mut self, steps: Vec<String>) -> Self {
        self.steps = steps;
        self
    }

    /// Wall time
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Outcome of a suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Wall time of the whole run
    pub duration_ms: u64,
    /// Results in declaration order
    pub results: Vec<CaseResult>,
}

impl SuiteReport {
    /// Create an empty report
    #[must_use]
    pub fn new(suite: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            started_at: Utc::now(),
            duration_ms: 0,
            results: Vec::new(),
        }
    }

    /// Set the wall time
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = millis(duration);
        self
    }

    /// Wall time of the whole run
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Count cases with `status`
    #[must_use]
    pub fn count(&self, status: CaseStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// Passed cases
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(CaseStatus::Passed)
    }

    /// Failed cases
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(CaseStatus::Failed)
    }

    /// Skipped cases
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(CaseStatus::Skipped)
    }

    /// No case failed
    #[must_use]
    pub fn success(&self) -> bool {
        self.failed() == 0
    }

    /// Failed results
    #[must_use]
    pub fn failures(&self) -> Vec<&CaseResult> {
        self.results
            .iter()
            .filter(|r| r.status.is_failed())
            .collect()
    }

    /// Find a result by case name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CaseResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Render as pretty JSON
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> ShopResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON rendering to `path`
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written
    pub fn write_json(&self, path: &Path) -> ShopResult<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Render as plain text, including step logs of failed cases
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Suite: {}", self.suite);
        for r in &self.results {
            let _ = writeln!(out, "  {} {} ({}ms)", r.status.label(), r.name, r.duration_ms);
            if let Some(ref f) = r.failure {
                let _ = writeln!(out, "       {}: {}", f.kind, f.message);
                for step in &r.steps {
                    let _ = writeln!(out, "         {step}");
                }
            }
            if let Some(ref reason) = r.skip_reason {
                let _ = writeln!(out, "       {reason}");
            }
        }
        let _ = writeln!(
            out,
            "{} passed, {} failed, {} skipped ({}ms)",
            self.passed(),
            self.failed(),
            self.skipped(),
            self.duration_ms
        );
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn sample() -> SuiteReport {
        let mut report = SuiteReport::new("login").with_duration(Duration::from_millis(1200));
        report
            .results
            .push(CaseResult::passed("valid credentials", Duration::from_millis(400)));
        report.results.push(
            CaseResult::failed(
                "wrong credentials",
                Duration::from_millis(800),
                Failure::from(&ShopError::AssertionTimeout {
                    selector: "text=No customer account found".into(),
                    expected: "to be visible".into(),
                    actual: "absent".into(),
                    attempts: 50,
                    timeout_ms: 5000,
                }),
            )
            .with_steps(vec!["→ goto /login".into(), "✓ goto /login [3ms]".into()]),
        );
        report
            .results
            .push(CaseResult::skipped("already authenticated", "unverified"));
        report
    }

    mod status_tests {
        use super::*;

        #[test]
        fn test_labels() {
            assert_eq!(CaseStatus::Passed.label(), "PASS");
            assert!(CaseStatus::Failed.is_failed());
            assert!(!CaseStatus::Skipped.is_passed());
        }
    }

    mod failure_tests {
        use super::*;

        #[test]
        fn test_from_error_keeps_selector() {
            let f = Failure::from(&ShopError::ElementNotFound {
                selector: "#Email".into(),
                state: "attached".into(),
                timeout_ms: 5000,
            });
            assert_eq!(f.kind, FailureKind::ElementNotFound);
            assert_eq!(f.selector.as_deref(), Some("#Email"));
        }

        #[test]
        fn test_panic_failure() {
            let f = Failure::panic("boom");
            assert_eq!(f.kind, FailureKind::Panic);
            assert!(f.selector.is_none());
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_counts() {
            let report = sample();
            assert_eq!(report.passed(), 1);
            assert_eq!(report.failed(), 1);
            assert_eq!(report.skipped(), 1);
            assert!(!report.success());
            assert_eq!(report.failures()[0].name, "wrong credentials");
        }

        #[test]
        fn test_text_rendering() {
            let text = sample().to_text();
            assert!(text.contains("PASS valid credentials (400ms)"));
            assert!(text.contains("FAIL wrong credentials"));
            assert!(text.contains("AssertionTimeout"));
            assert!(text.contains("✓ goto /login"));
            assert!(text.contains("1 passed, 1 failed, 1 skipped"));
        }

        #[test]
        fn test_json_rendering() {
            let json = sample().to_json().unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["results"][1]["status"], "failed");
            assert_eq!(value["results"][1]["failure"]["kind"], "assertion_timeout");
            assert_eq!(
                value["results"][1]["failure"]["selector"],
                "text=No customer account found"
            );
        }

        #[test]
        fn test_write_json() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("report.json");
            sample().write_json(&path).unwrap();
            let back: SuiteReport =
                serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
            assert_eq!(back, sample_without_time(back.started_at));
        }

        fn sample_without_time(started_at: DateTime<Utc>) -> SuiteReport {
            SuiteReport {
                started_at,
                ..sample()
            }
        }
    }
}
