//! Output formatting and progress reporting

use crate::commands::ReportFormat;
use crate::error::CliResult;
use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use shopwright::{CaseResult, CaseStatus, RunObserver, SuiteReport};
use std::path::Path;
use std::time::Duration;

/// Progress reporter for suite execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` cases
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("✓").green().bold().to_string()
        } else {
            "PASS".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Failures print even in quiet mode
        let prefix = if self.use_color {
            style("✗").red().bold().to_string()
        } else {
            "FAIL".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a skip message
    pub fn skipped(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("-").yellow().bold().to_string()
        } else {
            "SKIP".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        self.line("");
        self.line(&styled);
    }

    /// Print the run summary
    pub fn summary(&self, passed: usize, failed: usize, skipped: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        let _ = self.term.write_line("");
        let total = passed + failed + skipped;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            let _ = self.term.write_line(&format!(
                "{} {} cases in {:.2}s ({} passed, {} failed, {} skipped)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
                skipped_style.apply_to(skipped)
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {total} cases in {duration_secs:.2}s ({passed} passed, {failed} failed, {skipped} skipped)"
            ));
        }
    }
}

impl RunObserver for ProgressReporter {
    fn case_started(&self, name: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(name.to_string());
        }
    }

    fn case_finished(&self, result: &CaseResult) {
        match result.status {
            CaseStatus::Passed => {
                self.success(&format!("{} ({}ms)", result.name, result.duration_ms));
            }
            CaseStatus::Failed => {
                let reason = result
                    .failure
                    .as_ref()
                    .map_or_else(|| "unknown failure".to_string(), |f| format!("{}: {}", f.kind, f.message));
                self.failure(&format!("{}: {reason}", result.name));
            }
            CaseStatus::Skipped => {
                let reason = result.skip_reason.as_deref().unwrap_or("skipped");
                self.skipped(&format!("{} ({reason})", result.name));
            }
        }
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
        }
    }
}

/// Render `report` in `format`
///
/// # Errors
///
/// Returns error if JSON serialization fails
pub fn render_report(report: &SuiteReport, format: ReportFormat) -> CliResult<String> {
    Ok(match format {
        ReportFormat::Text => report.to_text(),
        ReportFormat::Json => report.to_json()?,
    })
}

/// Write the rendered report to `output`, or stdout when `None`
///
/// # Errors
///
/// Returns error if rendering or writing fails
pub fn emit_report(report: &SuiteReport, format: ReportFormat, output: Option<&Path>) -> CliResult<()> {
    match (output, format) {
        (Some(path), ReportFormat::Json) => report.write_json(path)?,
        (Some(path), ReportFormat::Text) => std::fs::write(path, report.to_text())?,
        (None, format) => print!("{}", render_report(report, format)?),
    }
    Ok(())
}
