//! Headless browser content extraction
//!
//! One [`BrowserContentExtractor`] owns one browser process and one isolated
//! browsing context, both created lazily on the first `extract` call. A mutex
//! serializes navigations so the pair is never driven concurrently; callers
//! that need throughput use several extractors.
//!
//! Every extraction opens a fresh page inside the context and closes it again
//! on all paths through [`PageGuard`]. `cleanup` closes the browser and the
//! next `extract` relaunches it. Dropping the extractor without `cleanup`
//! aborts the CDP handler and drops the browser, which kills the process.

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::target::{CreateBrowserContextParams, CreateTargetParams};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures_util::StreamExt;
use std::ops::Deref;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{AnalyzerError, AnalyzerResult};
use crate::traits::ContentExtractor;
use crate::types::{BrowserOptions, ExtractorState, CONTENT_MARKER};

/// Hides the most common automation signal before any page script runs
const STEALTH_SCRIPT: &str = "Object.defineProperty(navigator, 'webdriver', { get: () => undefined });";

/// HTTP status of the main document, 0 when the browser does not report it
const NAVIGATION_STATUS_SCRIPT: &str =
    "(() => { const nav = performance.getEntriesByType('navigation')[0]; return nav && nav.responseStatus ? nav.responseStatus : 0; })()";

const BODY_TEXT_SCRIPT: &str = "document.body ? document.body.innerText.trim().length : 0";

const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(250);

struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    context: Option<BrowserContextId>,
}

struct ExtractorInner {
    state: ExtractorState,
    session: Option<BrowserSession>,
}

/// Content extractor backed by a headless Chromium
pub struct BrowserContentExtractor {
    options: BrowserOptions,
    inner: Mutex<ExtractorInner>,
}

impl BrowserContentExtractor {
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(ExtractorInner {
                state: ExtractorState::Uninitialized,
                session: None,
            }),
        }
    }

    pub async fn state(&self) -> ExtractorState {
        self.inner.lock().await.state
    }

    fn browser_config(&self) -> AnalyzerResult<BrowserConfig> {
        let mut builder = BrowserConfig::builder()
            .window_size(self.options.viewport_width, self.options.viewport_height)
            .viewport(Viewport {
                width: self.options.viewport_width,
                height: self.options.viewport_height,
                ..Viewport::default()
            })
            .request_timeout(self.options.navigation_timeout())
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--disable-dev-shm-usage");

        if !self.options.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &self.options.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(AnalyzerError::browser)
    }

    /// Walk the state machine up to `ContextReady`
    async fn ensure_session<'a>(&self, inner: &'a mut ExtractorInner) -> AnalyzerResult<&'a mut BrowserSession> {
        if inner.session.is_none() {
            let (browser, mut handler) = Browser::launch(self.browser_config()?)
                .await
                .map_err(AnalyzerError::browser)?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        debug!("Browser handler event error: {}", e);
                    }
                }
            });

            info!("🌐 Browser launched");
            inner.state = ExtractorState::BrowserLaunched;
            inner.session = Some(BrowserSession {
                browser,
                handler,
                context: None,
            });
        }

        let session = inner
            .session
            .as_mut()
            .ok_or_else(|| AnalyzerError::browser("browser session missing after launch"))?;

        if session.context.is_none() {
            let context = session
                .browser
                .create_browser_context(CreateBrowserContextParams::default())
                .await
                .map_err(AnalyzerError::browser)?;
            session.context = Some(context);
            inner.state = ExtractorState::ContextReady;
        }

        Ok(session)
    }

    async fn open_page(&self, session: &BrowserSession) -> AnalyzerResult<Page> {
        let mut target = CreateTargetParams::builder().url("about:blank");
        if let Some(context) = &session.context {
            target = target.browser_context_id(context.clone());
        }
        let target = target.build().map_err(AnalyzerError::browser)?;

        let page = session.browser.new_page(target).await.map_err(AnalyzerError::browser)?;

        page.execute(SetUserAgentOverrideParams::new(self.options.user_agent.clone()))
            .await
            .map_err(AnalyzerError::browser)?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(AnalyzerError::browser)?;

        Ok(page)
    }

    async fn load(&self, page: &Page, url: &str) -> AnalyzerResult<String> {
        let navigation_timeout = self.options.navigation_timeout();
        match tokio::time::timeout(navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(AnalyzerError::ExtractionError {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(AnalyzerError::NavigationTimeout {
                    url: url.to_string(),
                    timeout: navigation_timeout,
                })
            }
        }

        let status = evaluate_number(page, NAVIGATION_STATUS_SCRIPT).await;
        if status >= 400 {
            return Err(AnalyzerError::HttpStatus {
                url: url.to_string(),
                status: status as u16,
            });
        }

        self.wait_for_content(page, url).await?;
        tokio::time::sleep(self.options.settle_delay()).await;

        let html = page.content().await.map_err(|e| AnalyzerError::ExtractionError {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if html.trim().is_empty() {
            return Err(AnalyzerError::EmptyContent { url: url.to_string() });
        }
        Ok(html)
    }

    /// Wait for the content marker; pages without one pass if the body has text
    async fn wait_for_content(&self, page: &Page, url: &str) -> AnalyzerResult<()> {
        let content_timeout = self.options.content_timeout();
        let marker = tokio::time::timeout(content_timeout, async {
            loop {
                if page.find_element(CONTENT_MARKER).await.is_ok() {
                    return;
                }
                tokio::time::sleep(MARKER_POLL_INTERVAL).await;
            }
        })
        .await;

        if marker.is_ok() {
            return Ok(());
        }

        if evaluate_number(page, BODY_TEXT_SCRIPT).await > 0 {
            warn!("⚠️ No content marker on {} after {:?}, using page body", url, content_timeout);
            Ok(())
        } else {
            Err(AnalyzerError::ContentTimeout {
                url: url.to_string(),
                timeout: content_timeout,
            })
        }
    }
}

async fn evaluate_number(page: &Page, script: &str) -> i64 {
    match page.evaluate(script).await {
        Ok(result) => result.into_value::<i64>().unwrap_or(0),
        Err(e) => {
            debug!("Page evaluation failed: {}", e);
            0
        }
    }
}

#[async_trait]
impl ContentExtractor for BrowserContentExtractor {
    async fn extract(&self, url: &str) -> AnalyzerResult<String> {
        url::Url::parse(url).map_err(|e| AnalyzerError::ExtractionError {
            url: url.to_string(),
            reason: format!("invalid URL: {e}"),
        })?;

        let mut inner = self.inner.lock().await;
        let session = self.ensure_session(&mut inner).await?;
        let page = PageGuard::new(self.open_page(session).await?, url);

        info!("📄 Loading {}", url);
        let result = self.load(&page, url).await;
        page.close().await;

        inner.state = match result {
            Ok(_) => ExtractorState::PageLoaded,
            Err(_) => ExtractorState::ContextReady,
        };
        result
    }

    async fn cleanup(&self) -> AnalyzerResult<()> {
        let mut inner = self.inner.lock().await;
        let Some(mut session) = inner.session.take() else {
            if inner.state != ExtractorState::Uninitialized {
                inner.state = ExtractorState::Closed;
            }
            return Ok(());
        };

        inner.state = ExtractorState::Closed;

        let closed = session.browser.close().await;
        if let Err(e) = &closed {
            warn!("⚠️ Browser close failed, killing process: {}", e);
            let _ = session.browser.kill().await;
        }
        if let Err(e) = session.browser.wait().await {
            debug!("Browser wait failed: {}", e);
        }
        session.handler.abort();
        info!("🧹 Browser closed");

        closed.map(|_| ()).map_err(AnalyzerError::browser)
    }
}

impl Drop for BrowserContentExtractor {
    fn drop(&mut self) {
        if let Some(session) = self.inner.get_mut().session.take() {
            session.handler.abort();
            // Dropping the browser kills its child process
            drop(session.browser);
        }
    }
}

/// Closes a page on every path; `close` is the awaited path, `Drop` the fallback
struct PageGuard {
    page: Option<Page>,
    url: String,
}

impl PageGuard {
    fn new(page: Page, url: &str) -> Self {
        Self {
            page: Some(page),
            url: url.to_string(),
        }
    }

    async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("⚠️ Failed to close page for {}: {}", self.url, e);
            }
        }
    }
}

impl Deref for PageGuard {
    type Target = Page;

    fn deref(&self) -> &Self::Target {
        // `page` is only taken by `close`, which consumes the guard
        self.page.as_ref().expect("page present until close")
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let url = std::mem::take(&mut self.url);
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move {
                    if let Err(e) = page.close().await {
                        debug!("Page cleanup failed for {}: {}", url, e);
                    }
                });
            }
        }
    }
}
