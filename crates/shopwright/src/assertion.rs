//! Expectations over element and page state.
//!
//! Every expectation re-resolves its locator on each poll and holds only
//! when the predicate is observed within the wait window:
//!
//! ```ignore
//! expect(session, &page.logout_link).to_be_visible().await?;
//! expect(session, &page.email_error).to_have_text(messages::INVALID_EMAIL).await?;
//! expect_url(session).not_to_match(&Regex::new("alert")?).await?;
//! ```

pub mod retry;

use crate::locator::{normalize_whitespace, Locator, TextMatch};
use crate::result::{ShopError, ShopResult};
use crate::session::{ElementHandle, Session};
use regex::Regex;
use retry::{AssertionCheckResult, RetryAssertion, RetryConfig};

/// Start an expectation on `locator`, using the locator's own wait window
#[must_use]
pub fn expect<'a>(session: &'a dyn Session, locator: &'a Locator) -> Expect<'a> {
    Expect {
        session,
        locator,
        config: *locator.wait(),
    }
}

/// Start an expectation on the current page URL
#[must_use]
pub fn expect_url(session: &dyn Session) -> UrlExpect<'_> {
    UrlExpect {
        session,
        config: RetryConfig::default(),
    }
}

/// Pending expectation on one element
#[derive(Clone, Copy)]
pub struct Expect<'a> {
    session: &'a dyn Session,
    locator: &'a Locator,
    config: RetryConfig,
}

impl std::fmt::Debug for Expect<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expect")
            .field("locator", self.locator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Expect<'_> {
    /// Override the wait policy
    #[must_use]
    pub const fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Expect the element to be rendered visibly
    ///
    /// # Errors
    ///
    /// Returns `AssertionTimeout` if it never becomes visible
    pub async fn to_be_visible(&self) -> ShopResult<()> {
        self.poll("to be visible", |handle| match handle {
            Some(h) if h.visible => Ok(()),
            Some(_) => Err("hidden".to_string()),
            None => Err("absent".to_string()),
        })
        .await
    }

    /// Expect the element to be absent or not rendered
    ///
    /// # Errors
    ///
    /// Returns `AssertionTimeout` if it stays visible
    pub async fn to_be_hidden(&self) -> ShopResult<()> {
        self.poll("to be hidden", |handle| match handle {
            Some(h) if h.visible => Err("visible".to_string()),
            _ => Ok(()),
        })
        .await
    }

    /// Expect the element's whole text to equal `text` (whitespace-normalized)
    ///
    /// # Errors
    ///
    /// Returns `AssertionTimeout` if the text never matches
    pub async fn to_have_text(&self, text: &str) -> ShopResult<()> {
        let matcher = TextMatch {
            text: text.to_string(),
            exact: true,
        };
        self.poll(&format!("to have text {text:?}"), |handle| {
            text_check(handle, |have| matcher.matches(have))
        })
        .await
    }

    /// Expect the element's text to contain `text`.
    ///
    /// Case-sensitive; whitespace runs on both sides compare equal.
    ///
    /// # Errors
    ///
    /// Returns `AssertionTimeout` if the text never contains `text`
    pub async fn to_contain_text(&self, text: &str) -> ShopResult<()> {
        let want = normalize_whitespace(text);
        self.poll(&format!("to contain text {text:?}"), |handle| {
            text_check(handle, |have| have.contains(&want))
        })
        .await
    }

    async fn poll<F>(&self, expected: &str, check: F) -> ShopResult<()>
    where
        F: Fn(Option<&ElementHandle>) -> Result<(), String> + Sync,
    {
        let session = self.session;
        let selector = self.locator.selector();
        let check = &check;
        let outcome = RetryAssertion::new(self.config)
            .with_description(format!("{selector} {expected}"))
            .verify(move || async move {
                let handle = session.locate(selector).await?;
                Ok(match check(handle.as_ref()) {
                    Ok(()) => AssertionCheckResult::Pass,
                    Err(actual) => AssertionCheckResult::Fail(actual),
                })
            })
            .await?;

        outcome.map(|_| ()).map_err(|err| ShopError::AssertionTimeout {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual: err.message,
            attempts: err.attempts,
            timeout_ms: self.config.timeout_ms(),
        })
    }
}

fn text_check(
    handle: Option<&ElementHandle>,
    accept: impl Fn(&str) -> bool,
) -> Result<(), String> {
    let Some(h) = handle else {
        return Err("absent".to_string());
    };
    let text = normalize_whitespace(h.text_or_empty());
    if accept(&text) {
        Ok(())
    } else {
        Err(format!("text {text:?}"))
    }
}

/// Pending expectation on the current page URL
#[derive(Clone, Copy)]
pub struct UrlExpect<'a> {
    session: &'a dyn Session,
    config: RetryConfig,
}

impl std::fmt::Debug for UrlExpect<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlExpect")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl UrlExpect<'_> {
    /// Override the wait policy
    #[must_use]
    pub const fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Expect the URL to match `pattern`
    ///
    /// # Errors
    ///
    /// Returns `AssertionTimeout` if it never matches
    pub async fn to_match(&self, pattern: &Regex) -> ShopResult<()> {
        self.poll(&format!("to match /{pattern}/"), |url| pattern.is_match(url))
            .await
    }

    /// Expect the URL not to match `pattern`
    ///
    /// # Errors
    ///
    /// Returns `AssertionTimeout` if it keeps matching
    pub async fn not_to_match(&self, pattern: &Regex) -> ShopResult<()> {
        self.poll(&format!("not to match /{pattern}/"), |url| {
            !pattern.is_match(url)
        })
        .await
    }

    async fn poll<F>(&self, expected: &str, check: F) -> ShopResult<()>
    where
        F: Fn(&str) -> bool + Sync,
    {
        let session = self.session;
        let check = &check;
        let outcome = RetryAssertion::new(self.config)
            .with_description(format!("page url {expected}"))
            .verify(move || async move {
                let url = session.current_url().await?;
                Ok(if check(&url) {
                    AssertionCheckResult::Pass
                } else {
                    AssertionCheckResult::Fail(url)
                })
            })
            .await?;

        outcome.map(|_| ()).map_err(|err| ShopError::AssertionTimeout {
            selector: "page url".to_string(),
            expected: expected.to_string(),
            actual: err.message,
            attempts: err.attempts,
            timeout_ms: self.config.timeout_ms(),
        })
    }
}
