//! Chromium backend over the Chrome DevTools Protocol.
//!
//! One browser process is shared by the whole run; every session lives in
//! its own browser context (separate cookies and storage) and is disposed
//! when the case finishes. All DOM work goes through `Runtime.evaluate`
//! using the expression produced by [`Selector::to_query`].

use crate::config::BrowserOptions;
use crate::locator::Selector;
use crate::result::{ShopError, ShopResult};
use crate::session::{join_url, ElementHandle, Interaction, Session, SessionFactory};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::sync::Mutex;

/// Marker stored on `window` to tell documents apart
const DOC_MARKER: &str = "window.__shopwrightDoc";

/// How long a click on a link or submit control may take to start a navigation
const CLICK_NAVIGATION_GRACE: Duration = Duration::from_millis(500);

const CLICK_POLL_INTERVAL: Duration = Duration::from_millis(25);

fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

fn doc_token_js() -> String {
    format!("({DOC_MARKER} || ({DOC_MARKER} = Math.random().toString(36).slice(2)))")
}

fn locate_js(selector: &Selector) -> String {
    format!(
        "(() => {{ \
         const doc = {doc}; \
         const el = {query}; \
         if (!el) return JSON.stringify({{ doc, found: false }}); \
         const st = window.getComputedStyle(el); \
         const r = el.getBoundingClientRect(); \
         const visible = st.display !== 'none' && st.visibility !== 'hidden' \
           && (r.width > 0 || r.height > 0); \
         const text = (el.innerText !== undefined ? el.innerText : el.textContent) || ''; \
         const value = ('value' in el) ? String(el.value) : null; \
         return JSON.stringify({{ doc, found: true, visible, text, value }}); \
         }})()",
        doc = doc_token_js(),
        query = selector.to_query(),
    )
}

fn interact_js(selector: &Selector, expected_doc: &str, action: &Interaction) -> String {
    let act = match action {
        Interaction::Fill(text) => format!(
            "el.focus(); el.value = {}; \
             el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
             el.dispatchEvent(new Event('change', {{ bubbles: true }}));",
            js_string(text)
        ),
        Interaction::Click => "const navigates = !!el.closest('a[href]') \
             || (!!el.form && (el.type === 'submit' || el.type === 'image')); \
             el.click(); \
             return JSON.stringify({ status: 'ok', navigates });"
            .to_string(),
        Interaction::WaitVisible => "const st = window.getComputedStyle(el); \
             const r = el.getBoundingClientRect(); \
             if (st.display === 'none' || st.visibility === 'hidden' \
               || (r.width === 0 && r.height === 0)) \
               return JSON.stringify({ status: 'hidden' });"
            .to_string(),
    };
    format!(
        "(() => {{ \
         if ({doc} !== {expected}) return JSON.stringify({{ status: 'stale' }}); \
         const el = {query}; \
         if (!el) return JSON.stringify({{ status: 'missing' }}); \
         {act} \
         return JSON.stringify({{ status: 'ok' }}); \
         }})()",
        doc = doc_token_js(),
        expected = js_string(expected_doc),
        query = selector.to_query(),
    )
}

#[derive(Debug, Deserialize)]
struct LocateReply {
    doc: String,
    found: bool,
    #[serde(default)]
    visible: bool,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

fn ready_js() -> String {
    format!(
        "JSON.stringify({{ doc: {doc}, complete: document.readyState === 'complete' }})",
        doc = doc_token_js()
    )
}

#[derive(Debug, Deserialize)]
struct InteractReply {
    status: String,
    #[serde(default)]
    navigates: bool,
}

#[derive(Debug, Deserialize)]
struct ReadyReply {
    doc: String,
    complete: bool,
}

#[derive(Debug, Default)]
struct DocState {
    token: Option<String>,
    generation: u64,
}

/// Session backed by one page in a private browser context
pub struct ChromiumSession {
    id: String,
    base_url: String,
    page: Page,
    context_id: Option<BrowserContextId>,
    browser: Arc<Mutex<Browser>>,
    navigation_timeout: Duration,
    doc: StdMutex<DocState>,
    closed: AtomicBool,
}

impl std::fmt::Debug for ChromiumSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumSession")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .field("context_id", &self.context_id)
            .finish_non_exhaustive()
    }
}

impl ChromiumSession {
    async fn evaluate<T: serde::de::DeserializeOwned>(&self, expr: String) -> ShopResult<T> {
        let result = self
            .page
            .evaluate(expr)
            .await
            .map_err(|e| ShopError::session(e.to_string()))?;
        let raw: String = result
            .into_value()
            .map_err(|e| ShopError::session(e.to_string()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Record the document token seen by the page, bumping the generation
    /// whenever it changes
    fn observe_doc(&self, token: &str) -> u64 {
        let mut doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
        if doc.token.as_deref() != Some(token) {
            doc.token = Some(token.to_string());
            doc.generation += 1;
        }
        doc.generation
    }

    /// Wait for the navigation a click may have started.
    ///
    /// Returns once a new document has finished loading, or when no new
    /// document showed up within the grace period.
    async fn settle_after_click(&self, clicked_doc: &str) {
        let start = tokio::time::Instant::now();
        let mut navigating = false;
        loop {
            let elapsed = start.elapsed();
            if elapsed >= self.navigation_timeout || (!navigating && elapsed >= CLICK_NAVIGATION_GRACE) {
                tracing::debug!(navigating, "click settled without a loaded document");
                return;
            }
            match self.evaluate::<ReadyReply>(ready_js()).await {
                Ok(reply) if reply.doc != clicked_doc => {
                    if reply.complete {
                        return;
                    }
                    navigating = true;
                }
                Ok(_) => {}
                // the old context is gone before the new one answers
                Err(_) => navigating = true,
            }
            tokio::time::sleep(CLICK_POLL_INTERVAL).await;
        }
    }

    fn current_doc(&self) -> (Option<String>, u64) {
        let doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
        (doc.token.clone(), doc.generation)
    }
}

#[async_trait]
impl Session for ChromiumSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn goto(&self, path: &str) -> ShopResult<()> {
        let url = join_url(&self.base_url, path);
        let navigation = tokio::time::timeout(self.navigation_timeout, self.page.goto(url.as_str()));
        match navigation.await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ShopError::NavigationError {
                url,
                message: e.to_string(),
            }),
            Err(_) => Err(ShopError::NavigationError {
                url,
                message: format!(
                    "timed out after {}ms",
                    self.navigation_timeout.as_millis()
                ),
            }),
        }
    }

    async fn locate(&self, selector: &Selector) -> ShopResult<Option<ElementHandle>> {
        // The document may be mid-navigation; report nothing and let the
        // caller poll again.
        let reply: LocateReply = match self.evaluate(locate_js(selector)).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::trace!(selector = %selector, error = %err, "locate during navigation");
                return Ok(None);
            }
        };
        let generation = self.observe_doc(&reply.doc);
        if !reply.found {
            return Ok(None);
        }
        let mut handle = ElementHandle::new(selector.clone(), self.id.clone(), generation);
        handle.visible = reply.visible;
        handle.text = reply.text;
        handle.value = reply.value;
        Ok(Some(handle))
    }

    async fn interact(&self, handle: &ElementHandle, action: Interaction) -> ShopResult<()> {
        let stale = || ShopError::StaleElement {
            selector: handle.selector.to_string(),
        };
        let (token, generation) = self.current_doc();
        let Some(token) = token.filter(|_| handle.generation == generation) else {
            return Err(stale());
        };

        let reply: InteractReply = self
            .evaluate(interact_js(&handle.selector, &token, &action))
            .await?;
        match reply.status.as_str() {
            "ok" => {
                if reply.navigates {
                    self.settle_after_click(&token).await;
                }
                Ok(())
            }
            "stale" => {
                let mut doc = self.doc.lock().unwrap_or_else(PoisonError::into_inner);
                doc.token = None;
                doc.generation += 1;
                Err(stale())
            }
            "hidden" => Err(ShopError::ElementNotFound {
                selector: handle.selector.to_string(),
                state: "visible".to_string(),
                timeout_ms: 0,
            }),
            _ => Err(ShopError::ElementNotFound {
                selector: handle.selector.to_string(),
                state: "attached".to_string(),
                timeout_ms: 0,
            }),
        }
    }

    async fn current_url(&self) -> ShopResult<String> {
        if let Ok(href) = self
            .evaluate::<String>("JSON.stringify(window.location.href)".to_string())
            .await
        {
            return Ok(href);
        }
        let url = self
            .page
            .url()
            .await
            .map_err(|e| ShopError::session(e.to_string()))?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn close(&self) -> ShopResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        match self.context_id.clone() {
            Some(id) => {
                let browser = self.browser.lock().await;
                browser
                    .execute(DisposeBrowserContextParams::new(id))
                    .await
                    .map_err(|e| ShopError::session(e.to_string()))?;
            }
            None => {
                self.page
                    .clone()
                    .close()
                    .await
                    .map_err(|e| ShopError::session(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Launches Chromium once and opens an isolated session per case
pub struct ChromiumSessionFactory {
    browser: Arc<Mutex<Browser>>,
    handle: tokio::task::JoinHandle<()>,
    base_url: String,
    navigation_timeout: Duration,
}

impl std::fmt::Debug for ChromiumSessionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChromiumSessionFactory")
            .field("base_url", &self.base_url)
            .field("navigation_timeout", &self.navigation_timeout)
            .finish_non_exhaustive()
    }
}

impl ChromiumSessionFactory {
    /// Launch the browser
    ///
    /// # Errors
    ///
    /// Returns `BrowserLaunch` if Chromium cannot be started
    pub async fn launch(
        options: &BrowserOptions,
        base_url: impl Into<String>,
        navigation_timeout: Duration,
    ) -> ShopResult<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(options.viewport_width, options.viewport_height);
        if !options.headless {
            builder = builder.with_head();
        }
        if !options.sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(ref path) = options.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|message| ShopError::BrowserLaunch { message })?;

        let (browser, mut handler) =
            Browser::launch(config)
                .await
                .map_err(|e| ShopError::BrowserLaunch {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        tracing::info!(headless = options.headless, "browser launched");
        Ok(Self {
            browser: Arc::new(Mutex::new(browser)),
            handle,
            base_url: base_url.into(),
            navigation_timeout,
        })
    }

    /// Close the browser process
    ///
    /// # Errors
    ///
    /// Returns error if the browser does not shut down cleanly
    pub async fn shutdown(&self) -> ShopResult<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| ShopError::session(e.to_string()))?;
        let _ = browser.wait().await;
        self.handle.abort();
        Ok(())
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self) -> ShopResult<Arc<dyn Session>> {
        let browser = self.browser.lock().await;
        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| ShopError::session(e.to_string()))?
            .result
            .browser_context_id;

        let mut target = CreateTargetParams::new("about:blank");
        target.browser_context_id = Some(context_id.clone());
        let page = browser
            .new_page(target)
            .await
            .map_err(|e| ShopError::session(e.to_string()))?;
        drop(browser);

        let session = ChromiumSession {
            id: uuid::Uuid::new_v4().to_string(),
            base_url: self.base_url.clone(),
            page,
            context_id: Some(context_id),
            browser: Arc::clone(&self.browser),
            navigation_timeout: self.navigation_timeout,
            doc: StdMutex::new(DocState::default()),
            closed: AtomicBool::new(false),
        };
        tracing::debug!(session = %session.id, "session opened");
        Ok(Arc::new(session))
    }
}
