//! Locator abstraction for element selection and interaction.
//!
//! # Design Philosophy
//!
//! - **Lazy**: a locator is only a description; it is resolved against the
//!   session's current document every time it is used
//! - **Auto-Waiting**: resolution polls until the element exists (or is
//!   visible) within the locator's wait window
//! - **Three description kinds**: by id, by attribute, by visible text

use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::assertion::retry::{AssertionCheckResult, RetryAssertion, RetryConfig};
use crate::result::{ShopError, ShopResult};
use crate::session::{ElementHandle, Interaction, Session};

/// Collapse runs of whitespace and trim, the way rendered text compares
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Encode a string as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

/// Visible-text matcher
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextMatch {
    /// Text to look for
    pub text: String,
    /// Whole-text, case-sensitive comparison instead of containment
    pub exact: bool,
}

impl TextMatch {
    /// Check rendered text against this matcher.
    ///
    /// Both sides are whitespace-normalized. Partial matches ignore case.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        let want = normalize_whitespace(&self.text);
        let have = normalize_whitespace(candidate);
        if self.exact {
            have == want
        } else {
            have.to_lowercase().contains(&want.to_lowercase())
        }
    }
}

/// Tag/id/class/attribute selector, optionally narrowed to a descendant tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeSelector {
    /// Tag name (`input`)
    pub tag: Option<String>,
    /// Element id
    pub id: Option<String>,
    /// Required classes
    pub classes: Vec<String>,
    /// Required attribute name/value pairs
    pub attributes: Vec<(String, String)>,
    /// Descendant tag to select inside the matched container (`span`)
    pub descendant: Option<String>,
}

impl AttributeSelector {
    /// Match any element (narrow with the `with_*` methods)
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Match elements with the given tag
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Require an id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Require a class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Require an attribute value
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Select the first descendant with this tag instead of the container
    #[must_use]
    pub fn descendant(mut self, tag: impl Into<String>) -> Self {
        self.descendant = Some(tag.into());
        self
    }

    /// Render as a CSS selector
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut css = self.tag.clone().unwrap_or_default();
        if let Some(ref id) = self.id {
            css.push('#');
            css.push_str(id);
        }
        for class in &self.classes {
            css.push('.');
            css.push_str(class);
        }
        for (name, value) in &self.attributes {
            let _ = write!(css, "[{name}={}]", js_string(value));
        }
        if css.is_empty() {
            css.push('*');
        }
        if let Some(ref child) = self.descendant {
            css.push(' ');
            css.push_str(child);
        }
        css
    }
}

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selector {
    /// Unique element identifier
    Id {
        /// Element id
        id: String,
    },
    /// Tag and attribute combination
    Attribute(AttributeSelector),
    /// Visible text content
    Text(TextMatch),
}

impl Selector {
    /// Create an id selector
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id { id: id.into() }
    }

    /// Create a partial text selector
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextMatch {
            text: text.into(),
            exact: false,
        })
    }

    /// Create an exact text selector
    #[must_use]
    pub fn exact_text(text: impl Into<String>) -> Self {
        Self::Text(TextMatch {
            text: text.into(),
            exact: true,
        })
    }

    /// Kind name used in diagnostics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Id { .. } => "by-id",
            Self::Attribute(_) => "by-attribute",
            Self::Text(_) => "by-text",
        }
    }

    /// JavaScript expression evaluating to the matched element or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        match self {
            Self::Id { id } => format!("document.getElementById({})", js_string(id)),
            Self::Attribute(attr) => {
                format!("document.querySelector({})", js_string(&attr.to_css()))
            }
            Self::Text(m) => format!(
                "(() => {{ \
                 const norm = s => (s || '').replace(/\\s+/g, ' ').trim(); \
                 const want = norm({text}); \
                 const hit = el => {{ const t = norm(el.textContent); \
                   return {exact} ? t === want : t.toLowerCase().includes(want.toLowerCase()); }}; \
                 const all = document.body ? Array.from(document.body.querySelectorAll('*')) : []; \
                 return all.find(el => hit(el) && !Array.from(el.children).some(hit)) || null; \
                 }})()",
                text = js_string(&m.text),
                exact = m.exact,
            ),
        }
    }
}

impl From<AttributeSelector> for Selector {
    fn from(value: AttributeSelector) -> Self {
        Self::Attribute(value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id { id } => write!(f, "#{id}"),
            Self::Attribute(attr) => f.write_str(&attr.to_css()),
            Self::Text(m) if m.exact => write!(f, "text={}", js_string(&m.text)),
            Self::Text(m) => write!(f, "text={}", m.text),
        }
    }
}

/// A lazily resolved element description with its own wait window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    selector: Selector,
    wait: RetryConfig,
}

impl Locator {
    /// Create a locator from a selector
    #[must_use]
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
            wait: RetryConfig::default(),
        }
    }

    /// Locate by element id
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new(Selector::id(id))
    }

    /// Locate by partial visible text
    #[must_use]
    pub fn by_text(text: impl Into<String>) -> Self {
        Self::new(Selector::text(text))
    }

    /// Set a custom timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.wait.timeout = timeout;
        self
    }

    /// Replace the whole wait policy
    #[must_use]
    pub const fn with_wait(mut self, wait: RetryConfig) -> Self {
        self.wait = wait;
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Get the wait policy
    #[must_use]
    pub const fn wait(&self) -> &RetryConfig {
        &self.wait
    }

    /// Resolve against the current document once, without waiting
    ///
    /// # Errors
    ///
    /// Returns backend errors from the session
    pub async fn probe(&self, session: &dyn Session) -> ShopResult<Option<ElementHandle>> {
        session.locate(&self.selector).await
    }

    /// Resolve, waiting until the element is attached
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if nothing matches within the wait window
    pub async fn resolve(&self, session: &dyn Session) -> ShopResult<ElementHandle> {
        self.await_state(session, false).await
    }

    /// Resolve, waiting until the element is visible
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if no visible match appears in time
    pub async fn wait_for_visible(&self, session: &dyn Session) -> ShopResult<ElementHandle> {
        let handle = self.await_state(session, true).await?;
        session.interact(&handle, Interaction::WaitVisible).await?;
        Ok(handle)
    }

    /// Fill the element with text
    ///
    /// # Errors
    ///
    /// Returns error if the element cannot be resolved or filled
    pub async fn fill(&self, session: &dyn Session, text: &str) -> ShopResult<()> {
        let handle = self.resolve(session).await?;
        session
            .interact(&handle, Interaction::Fill(text.to_string()))
            .await
    }

    /// Click the element
    ///
    /// # Errors
    ///
    /// Returns error if the element cannot be resolved or clicked
    pub async fn click(&self, session: &dyn Session) -> ShopResult<()> {
        let handle = self.resolve(session).await?;
        session.interact(&handle, Interaction::Click).await
    }

    async fn await_state(&self, session: &dyn Session, visible: bool) -> ShopResult<ElementHandle> {
        let found: Mutex<Option<ElementHandle>> = Mutex::new(None);
        let slot = &found;
        let selector = &self.selector;
        let outcome = RetryAssertion::new(self.wait)
            .with_description(selector.to_string())
            .verify(move || async move {
                match session.locate(selector).await? {
                    Some(handle) if !visible || handle.visible => {
                        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                        Ok(AssertionCheckResult::Pass)
                    }
                    Some(_) => Ok(AssertionCheckResult::Fail("hidden".into())),
                    None => Ok(AssertionCheckResult::Fail("absent".into())),
                }
            })
            .await?;

        let found = found.into_inner().unwrap_or_else(PoisonError::into_inner);
        match (outcome, found) {
            (Ok(_), Some(handle)) => Ok(handle),
            _ => Err(ShopError::ElementNotFound {
                selector: self.selector.to_string(),
                state: if visible { "visible" } else { "attached" }.to_string(),
                timeout_ms: self.wait.timeout_ms(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockElement, MockSession};
    use proptest::prelude::*;

    mod text_match_tests {
        use super::*;

        #[test]
        fn test_partial_is_case_insensitive() {
            let m = TextMatch {
                text: "log out".into(),
                exact: false,
            };
            assert!(m.matches("  Log   Out "));
            assert!(m.matches("Please Log out now"));
            assert!(!m.matches("Log in"));
        }

        #[test]
        fn test_exact_is_whole_text() {
            let m = TextMatch {
                text: "Password is required.".into(),
                exact: true,
            };
            assert!(m.matches("Password is required.\n"));
            assert!(!m.matches("Confirm Password is required."));
            assert!(!m.matches("password is required."));
        }

        proptest! {
            #[test]
            fn prop_text_matches_itself(s in "[A-Za-z ]{0,40}") {
                let partial = TextMatch { text: s.clone(), exact: false };
                let exact = TextMatch { text: s.clone(), exact: true };
                prop_assert!(partial.matches(&s));
                prop_assert!(exact.matches(&s));
            }

            #[test]
            fn prop_padding_does_not_matter(s in "[A-Za-z]{1,20}", pad in " {0,5}") {
                let exact = TextMatch { text: s.clone(), exact: true };
                let padded = format!("{pad}{s}{pad}");
                prop_assert!(exact.matches(&padded));
            }
        }
    }

    mod selector_tests {
        use super::*;

        #[test]
        fn test_attribute_to_css() {
            let submit = AttributeSelector::tag("input")
                .with_class("login-button")
                .with_attribute("type", "submit");
            assert_eq!(submit.to_css(), r#"input.login-button[type="submit"]"#);

            let register = AttributeSelector::tag("input")
                .with_id("register-button")
                .with_attribute("type", "submit");
            assert_eq!(register.to_css(), r#"input#register-button[type="submit"]"#);

            let message = AttributeSelector::any()
                .with_attribute("data-valmsg-for", "ConfirmPassword")
                .descendant("span");
            assert_eq!(message.to_css(), r#"[data-valmsg-for="ConfirmPassword"] span"#);

            assert_eq!(AttributeSelector::any().with_class("message-error").to_css(), ".message-error");
        }

        #[test]
        fn test_display() {
            assert_eq!(Selector::id("Email").to_string(), "#Email");
            assert_eq!(Selector::text("Log out").to_string(), "text=Log out");
            assert_eq!(Selector::exact_text("Log out").to_string(), "text=\"Log out\"");
        }

        #[test]
        fn test_queries() {
            assert!(Selector::id("Email").to_query().contains("getElementById(\"Email\")"));
            let attr: Selector = AttributeSelector::tag("input").with_class("x").into();
            assert!(attr.to_query().contains("querySelector"));
            let text = Selector::text("It's \"quoted\"").to_query();
            assert!(text.contains(r#""It's \"quoted\"""#));
            assert!(text.contains("textContent"));
        }

        #[test]
        fn test_kind() {
            assert_eq!(Selector::id("a").kind(), "by-id");
            assert_eq!(Selector::text("a").kind(), "by-text");
            assert_eq!(Selector::from(AttributeSelector::any()).kind(), "by-attribute");
        }
    }

    mod locator_tests {
        use super::*;

        fn session() -> MockSession {
            MockSession::new("http://shop.test").with_route(
                "/login",
                vec![
                    MockElement::input("Email"),
                    MockElement::new("a").with_text("Log out").hidden(),
                    MockElement::new("div").with_text("Welcome").visible_after(3),
                ],
            )
        }

        #[tokio::test]
        async fn test_resolve_is_lazy_and_current() {
            let session = session();
            let locator = Locator::by_id("Email").with_wait(RetryConfig::fast());
            // Construction does not touch the session; the page is still blank.
            assert!(locator.probe(&session).await.unwrap().is_none());

            session.goto("/login").await.unwrap();
            let handle = locator.resolve(&session).await.unwrap();
            assert_eq!(handle.selector, Selector::id("Email"));
        }

        #[tokio::test]
        async fn test_missing_element_times_out() {
            let session = session();
            session.goto("/login").await.unwrap();
            let err = Locator::by_id("Nope")
                .with_wait(RetryConfig::fast())
                .resolve(&session)
                .await
                .unwrap_err();
            assert!(matches!(err, ShopError::ElementNotFound { ref state, .. } if state == "attached"));
        }

        #[tokio::test]
        async fn test_hidden_element_fails_visible_wait() {
            let session = session();
            session.goto("/login").await.unwrap();
            let locator = Locator::by_text("log out").with_wait(RetryConfig::fast());
            assert!(locator.resolve(&session).await.is_ok());
            let err = locator.wait_for_visible(&session).await.unwrap_err();
            assert!(matches!(err, ShopError::ElementNotFound { ref state, .. } if state == "visible"));
        }

        #[tokio::test]
        async fn test_wait_for_visible_polls() {
            let session = session();
            session.goto("/login").await.unwrap();
            let handle = Locator::by_text("Welcome")
                .with_wait(RetryConfig::fast())
                .wait_for_visible(&session)
                .await
                .unwrap();
            assert!(handle.visible);
        }

        #[tokio::test]
        async fn test_fill_and_click_record_history() {
            let session = session();
            session.goto("/login").await.unwrap();
            Locator::by_id("Email").fill(&session, "a@b.co").await.unwrap();
            Locator::by_id("Email").click(&session).await.unwrap();
            assert_eq!(
                session.history(),
                vec!["goto:/login", "fill:#Email=a@b.co", "click:#Email"]
            );
        }
    }
}
