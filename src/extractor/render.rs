//! Headless-browser network capture
//!
//! Third cascade tier. The page is loaded in an isolated Chromium session;
//! every network response whose URL looks like media is recorded, the
//! rendered DOM is scraped the same way as static HTML, and both lists are
//! merged.
//!
//! The network filter matches on URL substrings, not on `Content-Type`.
//! Manifest-only delivery can slip through and unrelated URLs containing a
//! marker can false-positive; that approximation is accepted.

use crate::extractor::models::{dedup_preserving_order, MediaCandidate, ResolutionRequest, SourceStrategy};
use crate::extractor::static_scraper::extract_media_sources;
use crate::extractor::traits::{PageRenderer, Strategy, TierOutcome};
use crate::utils::config::AppSettings;
use crate::utils::error::MediagrabError;
use crate::utils::platform::{self, BROWSER};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

/// Substrings that mark a response URL as media
pub const MEDIA_MARKERS: [&str; 4] = [".m3u8", ".mp4", ".webm", ".mp3"];

pub const INSTALL_GUIDANCE: &str = "No Chromium/Chrome executable was found. Install Chromium \
(e.g. `apt install chromium`, `brew install --cask chromium`) or Google Chrome, or point the \
CHROME environment variable (or `browser_path` in settings.json) at the browser binary.";

/// Heuristic used by the network observer.
pub fn is_media_response(url: &str) -> bool {
    let lower = url.to_lowercase();
    MEDIA_MARKERS.iter().any(|marker| lower.contains(marker))
}

fn is_blob(url: &str) -> bool {
    url.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("blob:"))
}

/// Network-observed URLs first, DOM-observed appended, `blob:` URLs dropped, duplicates removed.
pub fn merge_findings(network: Vec<String>, dom: Vec<String>) -> Vec<String> {
    dedup_preserving_order(network.into_iter().chain(dom).filter(|url| !is_blob(url)))
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One browser process with a throwaway profile
struct BrowserSession {
    browser: Browser,
    _handler: AbortOnDrop,
    _profile: TempDir,
}

impl BrowserSession {
    async fn launch(executable: &Path, request_timeout: Duration) -> Result<Self, MediagrabError> {
        let profile = TempDir::new()?;
        let config = BrowserConfig::builder()
            .chrome_executable(executable)
            .user_data_dir(profile.path())
            .request_timeout(request_timeout)
            .arg("--mute-audio")
            .arg("--autoplay-policy=no-user-gesture-required")
            .build()
            .map_err(MediagrabError::RenderingError)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| MediagrabError::RenderingError(format!("failed to launch browser: {}", e)))?;

        let handler = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        Ok(Self {
            browser,
            _handler: AbortOnDrop(handler),
            _profile: profile,
        })
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to reap browser process: {}", e);
        }
        debug!("Browser session closed");
    }
}

/// Drives Chromium to discover media a page only reveals at runtime
pub struct RenderingResolver {
    executable: PathBuf,
    settle_window: Duration,
}

impl RenderingResolver {
    /// Capability check: returns a resolver only when a browser executable exists.
    pub fn detect(settings: &AppSettings) -> Result<Self, MediagrabError> {
        match platform::find_tool(&BROWSER, settings.browser_path.as_deref()) {
            Some(executable) => {
                info!("Headless browser available at {}", executable.display());
                Ok(Self::new(executable, settings.settle_window()))
            }
            None => {
                warn!("No headless browser found; rendering tier disabled");
                Err(MediagrabError::RenderingUnavailable(INSTALL_GUIDANCE.to_string()))
            }
        }
    }

    pub fn new(executable: PathBuf, settle_window: Duration) -> Self {
        Self {
            executable,
            settle_window,
        }
    }

    async fn capture(
        &self,
        session: &BrowserSession,
        page_url: &str,
        base: &Url,
        timeout_ms: u64,
    ) -> Result<Vec<String>, MediagrabError> {
        let render_err = |e: chromiumoxide::error::CdpError| MediagrabError::RenderingError(e.to_string());

        let page = session.browser.new_page("about:blank").await.map_err(render_err)?;
        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(render_err)?;

        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);
        let _observer = AbortOnDrop(tokio::spawn(async move {
            while let Some(event) = responses.next().await {
                let url = &event.response.url;
                if is_media_response(url) {
                    debug!("Observed media response: {}", url);
                    sink.lock().await.push(url.clone());
                }
            }
        }));

        match tokio::time::timeout(Duration::from_millis(timeout_ms), page.goto(page_url.to_string())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(MediagrabError::RenderingError(format!("navigation failed: {}", e))),
            Err(_) => {
                return Err(MediagrabError::RenderingError(format!(
                    "navigation timed out after {}ms",
                    timeout_ms
                )))
            }
        }

        tokio::time::sleep(self.settle_window).await;

        let html = page.content().await.map_err(render_err)?;
        let dom = extract_media_sources(&html, base);
        let network = observed.lock().await.clone();
        debug!("Rendering saw {} network and {} DOM source(s)", network.len(), dom.len());

        Ok(merge_findings(network, dom))
    }
}

#[async_trait]
impl PageRenderer for RenderingResolver {
    async fn render(&self, page_url: &str, timeout_ms: u64) -> Result<Vec<String>, MediagrabError> {
        let base = Url::parse(page_url).map_err(|_| MediagrabError::InvalidUrl(page_url.to_string()))?;
        info!("Rendering {} in headless browser", page_url);

        let session = BrowserSession::launch(&self.executable, Duration::from_millis(timeout_ms)).await?;
        let outcome = self.capture(&session, page_url, &base, timeout_ms).await;
        session.close().await;

        outcome
    }
}

/// Third cascade tier: rendering, gated on browser availability and operator consent
pub struct RenderingTier {
    renderer: Result<Arc<dyn PageRenderer>, String>,
    timeout_ms: u64,
}

impl RenderingTier {
    pub fn new(renderer: Arc<dyn PageRenderer>, timeout_ms: u64) -> Self {
        Self {
            renderer: Ok(renderer),
            timeout_ms,
        }
    }

    /// Tier that is always skipped, carrying installation guidance.
    pub fn unavailable(guidance: impl Into<String>) -> Self {
        Self {
            renderer: Err(guidance.into()),
            timeout_ms: 0,
        }
    }

    /// Wraps the result of [`RenderingResolver::detect`].
    pub fn from_detection(detected: Result<RenderingResolver, MediagrabError>, timeout_ms: u64) -> Self {
        match detected {
            Ok(resolver) => Self::new(Arc::new(resolver), timeout_ms),
            Err(MediagrabError::RenderingUnavailable(guidance)) => Self::unavailable(guidance),
            Err(other) => Self::unavailable(other.to_string()),
        }
    }
}

#[async_trait]
impl Strategy for RenderingTier {
    fn tier(&self) -> SourceStrategy {
        SourceStrategy::Rendered
    }

    fn availability(&self) -> Result<(), MediagrabError> {
        match &self.renderer {
            Ok(_) => Ok(()),
            Err(guidance) => Err(MediagrabError::RenderingUnavailable(guidance.clone())),
        }
    }

    fn needs_consent(&self) -> bool {
        true
    }

    async fn attempt(&self, request: &ResolutionRequest) -> Result<TierOutcome, MediagrabError> {
        let renderer = self
            .renderer
            .as_ref()
            .map_err(|guidance| MediagrabError::RenderingUnavailable(guidance.clone()))?;
        let urls = renderer.render(&request.target_url, self.timeout_ms).await?;
        Ok(TierOutcome::from_candidates(MediaCandidate::collect(
            urls,
            SourceStrategy::Rendered,
        )))
    }
}
