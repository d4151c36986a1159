//! Step Tracing
//!
//! Every navigation and interaction a case performs is surfaced as a pair
//! of start/end [`StepEvent`]s. [`ObservedSession`] wraps any session and
//! fans events out to [`StepObserver`]s:
//!
//! ```text
//! case body ──► ObservedSession ──► inner Session (Chromium / Mock)
//!                     │
//!                     ├──► TracingObserver   (structured log events)
//!                     └──► StepRecorder      (per-case diagnostic log)
//! ```
//!
//! Element lookups are polled and therefore only logged at `trace` level.

use crate::locator::Selector;
use crate::result::ShopResult;
use crate::session::{ElementHandle, Interaction, Session};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Kind of step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Navigation
    Goto,
    /// Fill a form control
    Fill,
    /// Click an element
    Click,
    /// Single-shot visibility check
    WaitVisible,
    /// Session teardown
    Close,
}

impl StepKind {
    /// Step name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Goto => "goto",
            Self::Fill => "fill",
            Self::Click => "click",
            Self::WaitVisible => "wait_visible",
            Self::Close => "close",
        }
    }

    const fn of(action: &Interaction) -> Self {
        match action {
            Interaction::Fill(_) => Self::Fill,
            Interaction::Click => Self::Click,
            Interaction::WaitVisible => Self::WaitVisible,
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Step phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum StepPhase {
    /// Step started
    Start,
    /// Step finished
    End {
        /// Time spent in the step
        duration: Duration,
        /// Error message when the step failed
        error: Option<String>,
    },
}

/// A step boundary observed on a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Owning case
    pub case: String,
    /// Step kind
    pub kind: StepKind,
    /// Path or selector the step targets
    pub target: String,
    /// Extra detail (filled length, never the filled text)
    pub detail: Option<String>,
    /// Phase
    pub phase: StepPhase,
}

impl StepEvent {
    /// Whether this is an end event carrying an error
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.phase, StepPhase::End { error: Some(_), .. })
    }
}

impl fmt::Display for StepEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let detail = self
            .detail
            .as_deref()
            .map(|d| format!(" ({d})"))
            .unwrap_or_default();
        match &self.phase {
            StepPhase::Start => write!(f, "→ {} {}{detail}", self.kind, self.target),
            StepPhase::End {
                duration,
                error: None,
            } => write!(
                f,
                "✓ {} {} [{}ms]",
                self.kind,
                self.target,
                duration.as_millis()
            ),
            StepPhase::End {
                duration,
                error: Some(err),
            } => write!(
                f,
                "✗ {} {} [{}ms]: {err}",
                self.kind,
                self.target,
                duration.as_millis()
            ),
        }
    }
}

/// Receives step events
pub trait StepObserver: Send + Sync {
    /// Called at every step boundary
    fn on_step(&self, event: &StepEvent);
}

/// Emits step events as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn on_step(&self, event: &StepEvent) {
        match &event.phase {
            StepPhase::Start => tracing::debug!(
                case = %event.case,
                step = event.kind.name(),
                target = %event.target,
                "step started"
            ),
            StepPhase::End {
                duration,
                error: None,
            } => tracing::debug!(
                case = %event.case,
                step = event.kind.name(),
                target = %event.target,
                elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "step finished"
            ),
            StepPhase::End {
                duration,
                error: Some(err),
            } => tracing::warn!(
                case = %event.case,
                step = event.kind.name(),
                target = %event.target,
                elapsed_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "step failed"
            ),
        }
    }
}

/// Collects the step log of one case
#[derive(Debug, Default)]
pub struct StepRecorder {
    events: Mutex<Vec<StepEvent>>,
}

impl StepRecorder {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded events
    #[must_use]
    pub fn events(&self) -> Vec<StepEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded events rendered one per line
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl StepObserver for StepRecorder {
    fn on_step(&self, event: &StepEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Session decorator emitting step events
pub struct ObservedSession {
    inner: Arc<dyn Session>,
    case: String,
    observers: Vec<Arc<dyn StepObserver>>,
}

impl fmt::Debug for ObservedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedSession")
            .field("case", &self.case)
            .field("session", &self.inner.id())
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl ObservedSession {
    /// Wrap `inner` for the case named `case`
    #[must_use]
    pub fn new(
        inner: Arc<dyn Session>,
        case: impl Into<String>,
        observers: Vec<Arc<dyn StepObserver>>,
    ) -> Self {
        Self {
            inner,
            case: case.into(),
            observers,
        }
    }

    fn emit(&self, kind: StepKind, target: &str, detail: Option<&str>, phase: StepPhase) {
        let event = StepEvent {
            case: self.case.clone(),
            kind,
            target: target.to_string(),
            detail: detail.map(str::to_string),
            phase,
        };
        for observer in &self.observers {
            observer.on_step(&event);
        }
    }

    async fn step<T, Fut>(
        &self,
        kind: StepKind,
        target: &str,
        detail: Option<&str>,
        fut: Fut,
    ) -> ShopResult<T>
    where
        Fut: std::future::Future<Output = ShopResult<T>> + Send,
    {
        self.emit(kind, target, detail, StepPhase::Start);
        let start = Instant::now();
        let result = fut.await;
        self.emit(
            kind,
            target,
            detail,
            StepPhase::End {
                duration: start.elapsed(),
                error: result.as_ref().err().map(ToString::to_string),
            },
        );
        result
    }
}

#[async_trait]
impl Session for ObservedSession {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn goto(&self, path: &str) -> ShopResult<()> {
        self.step(StepKind::Goto, path, None, self.inner.goto(path))
            .await
    }

    async fn locate(&self, selector: &Selector) -> ShopResult<Option<ElementHandle>> {
        let found = self.inner.locate(selector).await;
        tracing::trace!(
            case = %self.case,
            selector = %selector,
            found = matches!(found, Ok(Some(_))),
            "locate"
        );
        found
    }

    async fn interact(&self, handle: &ElementHandle, action: Interaction) -> ShopResult<()> {
        let kind = StepKind::of(&action);
        let detail = match &action {
            Interaction::Fill(text) => Some(format!("{} chars", text.chars().count())),
            _ => None,
        };
        let target = handle.selector.to_string();
        self.step(
            kind,
            &target,
            detail.as_deref(),
            self.inner.interact(handle, action),
        )
        .await
    }

    async fn current_url(&self) -> ShopResult<String> {
        self.inner.current_url().await
    }

    async fn close(&self) -> ShopResult<()> {
        self.step(StepKind::Close, self.inner.id(), None, self.inner.close())
            .await
    }
}
