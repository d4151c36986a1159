//! Session - Narrow Browser Automation Trait
//!
//! Page objects and the runner depend on exactly this seam:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Session (async trait)                                       │
//! │    goto(path)            navigate relative to the base URL   │
//! │    locate(selector)      fresh ElementHandle snapshot        │
//! │    interact(handle, a)   fill(text) | click | wait-visible   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ChromiumSession (CDP)          MockSession (in-memory DOM)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Swapping the backend never touches page objects or the runner.

use crate::locator::{AttributeSelector, Selector};
use crate::result::{ShopError, ShopResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Snapshot of an element resolved from a selector.
///
/// Valid only for the document it was resolved from: once the owning
/// session navigates, interacting with it fails with `StaleElement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Selector the handle was resolved from
    pub selector: Selector,
    /// Owning session id
    pub session_id: String,
    /// Navigation count of the owning session at resolution time
    pub generation: u64,
    /// Whether the element was rendered visibly
    pub visible: bool,
    /// Rendered text content
    pub text: Option<String>,
    /// Current value for form controls
    pub value: Option<String>,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(selector: Selector, session_id: impl Into<String>, generation: u64) -> Self {
        Self {
            selector,
            session_id: session_id.into(),
            generation,
            visible: false,
            text: None,
            value: None,
        }
    }

    /// Normalized text, empty when absent
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Interaction primitives a session performs on a resolved element
#[derive(Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Replace the control's value
    Fill(String),
    /// Activate the element
    Click,
    /// Single-shot check that the element is still rendered visibly
    WaitVisible,
}

impl Interaction {
    /// Step name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fill(_) => "fill",
            Self::Click => "click",
            Self::WaitVisible => "wait_visible",
        }
    }
}

// Filled values may be passwords; logs only ever see their length.
impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fill(text) => write!(f, "Fill(<{} chars>)", text.chars().count()),
            Self::Click => f.write_str("Click"),
            Self::WaitVisible => f.write_str("WaitVisible"),
        }
    }
}

/// Browser session used by page objects and the runner.
///
/// One session is one isolated browsing context, exclusively owned by a
/// single test case.
#[async_trait]
pub trait Session: Send + Sync {
    /// Session identifier (stamped on handles)
    fn id(&self) -> &str;

    /// Navigate to `path` relative to the base URL (absolute URLs pass through)
    async fn goto(&self, path: &str) -> ShopResult<()>;

    /// Resolve `selector` against the current document, without waiting
    async fn locate(&self, selector: &Selector) -> ShopResult<Option<ElementHandle>>;

    /// Perform `action` on a previously resolved element
    async fn interact(&self, handle: &ElementHandle, action: Interaction) -> ShopResult<()>;

    /// URL of the current document
    async fn current_url(&self) -> ShopResult<String>;

    /// Release the browsing context
    async fn close(&self) -> ShopResult<()> {
        Ok(())
    }
}

/// Opens one isolated session per test case
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Open a fresh session
    async fn open(&self) -> ShopResult<Arc<dyn Session>>;
}

/// Join a base URL and a path the way `goto` resolves them
#[must_use]
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

// ============================================================================
// In-memory mock backend
// ============================================================================

/// Element of a [`MockDocument`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    /// Tag name
    pub tag: String,
    /// Element id
    pub id: Option<String>,
    /// Classes
    pub classes: Vec<String>,
    /// Attributes
    pub attributes: Vec<(String, String)>,
    /// Enclosing element, for descendant selectors
    pub container: Option<Box<MockElement>>,
    /// Rendered text
    pub text: String,
    /// Form control value
    pub value: String,
    /// Visibility
    pub visible: bool,
    /// Remaining `locate` calls before the element shows up as visible
    pub reveal_after: u32,
}

impl MockElement {
    /// Create a visible element with the given tag
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            attributes: Vec::new(),
            container: None,
            text: String::new(),
            value: String::new(),
            visible: true,
            reveal_after: 0,
        }
    }

    /// Text input with `id` and a matching `name`
    #[must_use]
    pub fn input(id: impl Into<String>) -> Self {
        let id = id.into();
        Self::new("input")
            .with_attribute("type", "text")
            .with_attribute("name", id.clone())
            .with_id(id)
    }

    /// Validation message `<span>` inside `[data-valmsg-for=field]`
    #[must_use]
    pub fn validation_message(field: impl Into<String>) -> Self {
        Self::new("span")
            .inside(MockElement::new("span").with_attribute("data-valmsg-for", field))
            .hidden()
    }

    /// Set the id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add or replace an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.attributes.retain(|(n, _)| *n != name);
        self.attributes.push((name, value.into()));
        self
    }

    /// Set the rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Nest inside a container element
    #[must_use]
    pub fn inside(mut self, container: MockElement) -> Self {
        self.container = Some(Box::new(container));
        self
    }

    /// Render hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Stay invisible for the first `polls` lookups
    #[must_use]
    pub const fn visible_after(mut self, polls: u32) -> Self {
        self.reveal_after = polls;
        self
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn matches_head(&self, sel: &AttributeSelector) -> bool {
        sel.tag.as_ref().map_or(true, |t| *t == self.tag)
            && sel.id.as_ref().map_or(true, |id| self.id.as_ref() == Some(id))
            && sel.classes.iter().all(|c| self.classes.contains(c))
            && sel
                .attributes
                .iter()
                .all(|(n, v)| self.attribute(n) == Some(v.as_str()))
    }

    /// Check whether `selector` designates this element
    #[must_use]
    pub fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id { id } => self.id.as_deref() == Some(id.as_str()),
            Selector::Attribute(sel) => match sel.descendant {
                Some(ref child) => {
                    self.tag == *child
                        && self.container.as_ref().is_some_and(|c| c.matches_head(sel))
                }
                None => self.matches_head(sel),
            },
            Selector::Text(m) => !self.text.is_empty() && m.matches(&self.text),
        }
    }
}

/// Behavior attached to clicking an element of a [`MockSession`]
pub type Reaction = Arc<dyn Fn(&mut MockDocument) + Send + Sync>;

/// Mutable document state a [`Reaction`] may rewrite
#[derive(Debug, Clone, Default)]
pub struct MockDocument {
    routes: HashMap<String, Vec<MockElement>>,
    path: String,
    elements: Vec<MockElement>,
    navigations: u64,
    cookies: HashMap<String, String>,
}

impl MockDocument {
    /// Path of the current document
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of navigations performed so far
    #[must_use]
    pub const fn navigations(&self) -> u64 {
        self.navigations
    }

    /// Load the route for `path` (unknown paths render an empty page)
    pub fn navigate(&mut self, path: &str) {
        self.elements = self.routes.get(path).cloned().unwrap_or_default();
        self.path = path.to_string();
        self.navigations += 1;
    }

    /// Value of the form control with `id` (empty when absent)
    #[must_use]
    pub fn value_of(&self, id: &str) -> String {
        let selector = Selector::id(id);
        self.elements
            .iter()
            .find(|e| e.matches(&selector))
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }

    /// First element matching `selector`
    pub fn find_mut(&mut self, selector: &Selector) -> Option<&mut MockElement> {
        self.elements.iter_mut().find(|e| e.matches(selector))
    }

    /// Make the element visible, optionally replacing its text
    pub fn show(&mut self, selector: &Selector, text: Option<&str>) {
        if let Some(el) = self.find_mut(selector) {
            el.visible = true;
            el.reveal_after = 0;
            if let Some(text) = text {
                el.text = text.to_string();
            }
        }
    }

    /// Hide the element
    pub fn hide(&mut self, selector: &Selector) {
        if let Some(el) = self.find_mut(selector) {
            el.visible = false;
        }
    }

    /// Append an element to the current document
    pub fn push(&mut self, element: MockElement) {
        self.elements.push(element);
    }

    /// Replace what later navigations to `path` render
    pub fn set_route(&mut self, path: impl Into<String>, elements: Vec<MockElement>) {
        let _ = self.routes.insert(path.into(), elements);
    }

    /// Session-scoped value (survives navigation, like a cookie)
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Set a session-scoped value
    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let _ = self.cookies.insert(name.into(), value.into());
    }
}

#[derive(Default)]
struct MockState {
    doc: MockDocument,
    history: Vec<String>,
    closed: bool,
    pending: Vec<(Instant, Reaction)>,
}

impl MockState {
    /// Apply click reactions whose latency has elapsed
    fn settle(&mut self) {
        let now = Instant::now();
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.pending = waiting;
        for (_, reaction) in due {
            reaction(&mut self.doc);
        }
    }
}

/// Scripted in-memory session for unit and integration tests.
///
/// Routes map paths to element lists; reactions rewrite the document
/// when a given selector is clicked. With a click latency, a reaction
/// lands only once that much time has passed, the way a form post
/// commits some time after the click returns.
pub struct MockSession {
    id: String,
    base_url: String,
    state: Mutex<MockState>,
    reactions: HashMap<Selector, Reaction>,
    failing_routes: HashSet<String>,
    click_latency: Duration,
}

impl fmt::Debug for MockSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSession")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .field("reactions", &self.reactions.len())
            .finish_non_exhaustive()
    }
}

impl MockSession {
    /// Create a mock session on `about:blank`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            base_url: base_url.into(),
            state: Mutex::new(MockState::default()),
            reactions: HashMap::new(),
            failing_routes: HashSet::new(),
            click_latency: Duration::ZERO,
        }
    }

    /// Register the elements rendered at `path`
    #[must_use]
    pub fn with_route(self, path: impl Into<String>, elements: Vec<MockElement>) -> Self {
        let _ = self.lock().doc.routes.insert(path.into(), elements);
        self
    }

    /// Run `reaction` whenever an element is clicked through `selector`
    #[must_use]
    pub fn with_reaction(
        mut self,
        selector: impl Into<Selector>,
        reaction: impl Fn(&mut MockDocument) + Send + Sync + 'static,
    ) -> Self {
        let _ = self.reactions.insert(selector.into(), Arc::new(reaction));
        self
    }

    /// Delay every click reaction by `latency`
    #[must_use]
    pub const fn with_click_latency(mut self, latency: Duration) -> Self {
        self.click_latency = latency;
        self
    }

    /// Make navigation to `path` fail
    #[must_use]
    pub fn with_failing_route(mut self, path: impl Into<String>) -> Self {
        let _ = self.failing_routes.insert(path.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Calls recorded so far (`goto:/login`, `fill:#Email=…`, `click:…`)
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if a call with this prefix was recorded
    #[must_use]
    pub fn was_called(&self, prefix: &str) -> bool {
        self.lock().history.iter().any(|c| c.starts_with(prefix))
    }

    /// Whether `close` was called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Copy of the current document
    #[must_use]
    pub fn document(&self) -> MockDocument {
        let mut state = self.lock();
        state.settle();
        state.doc.clone()
    }
}

#[async_trait]
impl Session for MockSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn goto(&self, path: &str) -> ShopResult<()> {
        let mut state = self.lock();
        state.history.push(format!("goto:{path}"));
        state.pending.clear();
        if self.failing_routes.contains(path) {
            return Err(ShopError::NavigationError {
                url: join_url(&self.base_url, path),
                message: "net::ERR_CONNECTION_REFUSED".to_string(),
            });
        }
        state.doc.navigate(path);
        Ok(())
    }

    async fn locate(&self, selector: &Selector) -> ShopResult<Option<ElementHandle>> {
        let mut state = self.lock();
        state.settle();
        let generation = state.doc.navigations;
        let Some(el) = state.doc.elements.iter_mut().find(|e| e.matches(selector)) else {
            return Ok(None);
        };
        if el.reveal_after > 0 {
            el.reveal_after -= 1;
        }
        let mut handle = ElementHandle::new(selector.clone(), self.id.clone(), generation);
        handle.visible = el.visible && el.reveal_after == 0;
        handle.text = Some(el.text.clone());
        handle.value = Some(el.value.clone());
        Ok(Some(handle))
    }

    async fn interact(&self, handle: &ElementHandle, action: Interaction) -> ShopResult<()> {
        let mut state = self.lock();
        state.settle();
        if handle.generation != state.doc.navigations || handle.session_id != self.id {
            return Err(ShopError::StaleElement {
                selector: handle.selector.to_string(),
            });
        }
        let not_found = || ShopError::ElementNotFound {
            selector: handle.selector.to_string(),
            state: "attached".to_string(),
            timeout_ms: 0,
        };
        match action {
            Interaction::Fill(text) => {
                let el = state.doc.find_mut(&handle.selector).ok_or_else(not_found)?;
                el.value.clone_from(&text);
                state.history.push(format!("fill:{}={text}", handle.selector));
            }
            Interaction::Click => {
                if state.doc.find_mut(&handle.selector).is_none() {
                    return Err(not_found());
                }
                state.history.push(format!("click:{}", handle.selector));
                if let Some(reaction) = self.reactions.get(&handle.selector).cloned() {
                    if self.click_latency.is_zero() {
                        reaction(&mut state.doc);
                    } else {
                        let at = Instant::now() + self.click_latency;
                        state.pending.push((at, reaction));
                    }
                }
            }
            Interaction::WaitVisible => {
                let visible = state
                    .doc
                    .find_mut(&handle.selector)
                    .is_some_and(|el| el.visible && el.reveal_after == 0);
                if !visible {
                    return Err(ShopError::ElementNotFound {
                        selector: handle.selector.to_string(),
                        state: "visible".to_string(),
                        timeout_ms: 0,
                    });
                }
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> ShopResult<String> {
        let mut state = self.lock();
        state.settle();
        if state.doc.navigations == 0 {
            return Ok("about:blank".to_string());
        }
        Ok(join_url(&self.base_url, &state.doc.path))
    }

    async fn close(&self) -> ShopResult<()> {
        let mut state = self.lock();
        state.closed = true;
        state.history.push("close".to_string());
        Ok(())
    }
}

/// Factory producing a fresh [`MockSession`] per case
pub struct MockSessionFactory<F> {
    make: F,
    opened: AtomicUsize,
}

impl<F> fmt::Debug for MockSessionFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSessionFactory")
            .field("opened", &self.opened.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<F> MockSessionFactory<F>
where
    F: Fn() -> MockSession + Send + Sync,
{
    /// Create a factory from a constructor closure
    pub const fn new(make: F) -> Self {
        Self {
            make,
            opened: AtomicUsize::new(0),
        }
    }

    /// Number of sessions opened so far
    #[must_use]
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<F> SessionFactory for MockSessionFactory<F>
where
    F: Fn() -> MockSession + Send + Sync,
{
    async fn open(&self) -> ShopResult<Arc<dyn Session>> {
        let _ = self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new((self.make)()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod join_url_tests {
        use super::*;

        #[test]
        fn test_join_variants() {
            assert_eq!(join_url("https://shop.test/", "/login"), "https://shop.test/login");
            assert_eq!(join_url("https://shop.test", "login"), "https://shop.test/login");
            assert_eq!(join_url("https://shop.test", ""), "https://shop.test");
            assert_eq!(join_url("https://shop.test", "http://other/x"), "http://other/x");
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_fill_debug_hides_value() {
            let debug = format!("{:?}", Interaction::Fill("hunter2".into()));
            assert_eq!(debug, "Fill(<7 chars>)");
            assert!(!debug.contains("hunter2"));
        }

        #[test]
        fn test_names() {
            assert_eq!(Interaction::Click.name(), "click");
            assert_eq!(Interaction::WaitVisible.name(), "wait_visible");
        }
    }

    mod mock_element_tests {
        use super::*;

        #[test]
        fn test_attribute_match() {
            let submit = MockElement::new("input")
                .with_class("button-1")
                .with_class("login-button")
                .with_attribute("type", "submit");
            let sel: Selector = AttributeSelector::tag("input")
                .with_class("login-button")
                .with_attribute("type", "submit")
                .into();
            assert!(submit.matches(&sel));
            let wrong: Selector = AttributeSelector::tag("button").with_class("login-button").into();
            assert!(!submit.matches(&wrong));
        }

        #[test]
        fn test_descendant_match() {
            let msg = MockElement::validation_message("Email");
            let sel: Selector = AttributeSelector::any()
                .with_attribute("data-valmsg-for", "Email")
                .descendant("span")
                .into();
            assert!(msg.matches(&sel));
            let other: Selector = AttributeSelector::any()
                .with_attribute("data-valmsg-for", "Password")
                .descendant("span")
                .into();
            assert!(!msg.matches(&other));
        }

        #[test]
        fn test_text_match_requires_text() {
            assert!(!MockElement::new("div").matches(&Selector::text("")));
            assert!(MockElement::new("a").with_text("Log out").matches(&Selector::text("log")));
        }

        #[test]
        fn test_input_has_name() {
            let input = MockElement::input("Email");
            assert!(input.matches(&Selector::id("Email")));
            assert_eq!(input.attribute("name"), Some("Email"));
        }
    }

    mod mock_session_tests {
        use super::*;

        fn login_session() -> MockSession {
            MockSession::new("https://shop.test")
                .with_route(
                    "/login",
                    vec![
                        MockElement::input("Email"),
                        MockElement::new("a").with_text("Log out").hidden(),
                    ],
                )
                .with_reaction(Selector::id("Email"), |doc| {
                    doc.show(&Selector::text("Log out"), None);
                })
                .with_failing_route("/down")
        }

        #[tokio::test]
        async fn test_locate_before_navigation() {
            let session = login_session();
            assert!(session.locate(&Selector::id("Email")).await.unwrap().is_none());
            assert_eq!(session.current_url().await.unwrap(), "about:blank");
        }

        #[tokio::test]
        async fn test_goto_and_locate() {
            let session = login_session();
            session.goto("/login").await.unwrap();
            let handle = session.locate(&Selector::id("Email")).await.unwrap().unwrap();
            assert!(handle.visible);
            assert_eq!(handle.generation, 1);
            assert_eq!(handle.session_id, session.id());
            assert_eq!(session.current_url().await.unwrap(), "https://shop.test/login");
        }

        #[tokio::test]
        async fn test_failing_route() {
            let session = login_session();
            let err = session.goto("/down").await.unwrap_err();
            assert!(matches!(err, ShopError::NavigationError { ref url, .. } if url == "https://shop.test/down"));
        }

        #[tokio::test]
        async fn test_fill_sets_value() {
            let session = login_session();
            session.goto("/login").await.unwrap();
            let handle = session.locate(&Selector::id("Email")).await.unwrap().unwrap();
            session
                .interact(&handle, Interaction::Fill("me@shop.test".into()))
                .await
                .unwrap();
            assert_eq!(session.document().value_of("Email"), "me@shop.test");
        }

        #[tokio::test]
        async fn test_click_runs_reaction() {
            let session = login_session();
            session.goto("/login").await.unwrap();
            let logout = session.locate(&Selector::text("Log out")).await.unwrap().unwrap();
            assert!(!logout.visible);

            let handle = session.locate(&Selector::id("Email")).await.unwrap().unwrap();
            session.interact(&handle, Interaction::Click).await.unwrap();

            let logout = session.locate(&Selector::text("Log out")).await.unwrap().unwrap();
            assert!(logout.visible);
        }

        #[tokio::test]
        async fn test_click_latency_delays_reaction() {
            let session = login_session().with_click_latency(Duration::from_millis(60));
            session.goto("/login").await.unwrap();
            let handle = session.locate(&Selector::id("Email")).await.unwrap().unwrap();
            session.interact(&handle, Interaction::Click).await.unwrap();

            let logout = session.locate(&Selector::text("Log out")).await.unwrap().unwrap();
            assert!(!logout.visible);

            tokio::time::sleep(Duration::from_millis(80)).await;
            let logout = session.locate(&Selector::text("Log out")).await.unwrap().unwrap();
            assert!(logout.visible);
        }

        #[tokio::test]
        async fn test_navigation_drops_pending_reaction() {
            let session = login_session().with_click_latency(Duration::from_millis(20));
            session.goto("/login").await.unwrap();
            let handle = session.locate(&Selector::id("Email")).await.unwrap().unwrap();
            session.interact(&handle, Interaction::Click).await.unwrap();
            session.goto("/login").await.unwrap();

            tokio::time::sleep(Duration::from_millis(40)).await;
            let logout = session.locate(&Selector::text("Log out")).await.unwrap().unwrap();
            assert!(!logout.visible);
        }

        #[tokio::test]
        async fn test_stale_handle_after_navigation() {
            let session = login_session();
            session.goto("/login").await.unwrap();
            let handle = session.locate(&Selector::id("Email")).await.unwrap().unwrap();
            session.goto("/login").await.unwrap();
            let err = session.interact(&handle, Interaction::Click).await.unwrap_err();
            assert!(matches!(err, ShopError::StaleElement { .. }));
        }

        #[tokio::test]
        async fn test_wait_visible_is_single_shot() {
            let session = login_session();
            session.goto("/login").await.unwrap();
            let hidden = session.locate(&Selector::text("Log out")).await.unwrap().unwrap();
            let err = session.interact(&hidden, Interaction::WaitVisible).await.unwrap_err();
            assert!(matches!(err, ShopError::ElementNotFound { timeout_ms: 0, .. }));
        }

        #[tokio::test]
        async fn test_cookies_survive_navigation() {
            let mut doc = MockDocument::default();
            doc.set_cookie("auth", "1");
            doc.navigate("/");
            assert_eq!(doc.cookie("auth"), Some("1"));
            assert_eq!(doc.navigations(), 1);
        }

        #[test]
        fn test_set_route_affects_later_navigation() {
            let mut doc = MockDocument::default();
            doc.navigate("/login");
            assert!(doc.find_mut(&Selector::text("Log out")).is_none());
            doc.set_route("/login", vec![MockElement::new("a").with_text("Log out")]);
            assert!(doc.find_mut(&Selector::text("Log out")).is_none());
            doc.navigate("/login");
            assert!(doc.find_mut(&Selector::text("Log out")).is_some());
        }

        #[tokio::test]
        async fn test_close_is_recorded() {
            let session = login_session();
            session.close().await.unwrap();
            assert!(session.is_closed());
            assert!(session.was_called("close"));
        }

        #[tokio::test]
        async fn test_factory_opens_fresh_sessions() {
            let factory = MockSessionFactory::new(login_session);
            let a = factory.open().await.unwrap();
            let b = factory.open().await.unwrap();
            assert_ne!(a.id(), b.id());
            assert_eq!(factory.opened(), 2);
        }
    }
}
