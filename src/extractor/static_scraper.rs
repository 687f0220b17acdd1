//! Static HTML media-tag scraping
//!
//! Second cascade tier. The page is fetched once, parsed without running any
//! scripts, and every `<video>`/`<audio>` source (including nested
//! `<source>` alternatives) is resolved against the page URL.

use crate::extractor::models::{dedup_preserving_order, MediaCandidate, ResolutionRequest, SourceStrategy};
use crate::extractor::traits::{Strategy, TierOutcome};
use crate::utils::config::AppSettings;
use crate::utils::error::MediagrabError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use url::Url;

fn media_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("video, audio").expect("static selector"))
}

fn source_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("source").expect("static selector"))
}

/// Resolves a possibly relative reference against `base` (RFC 3986).
pub fn resolve_url(base: &Url, reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    match base.join(reference) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            debug!("Skipping unresolvable source {:?}: {}", reference, e);
            None
        }
    }
}

/// Collects media sources declared in `html`, in document order.
///
/// Each media element contributes its own `src` first, then the `src` of
/// each nested `<source>`. Parsing is best-effort: malformed markup still
/// produces a tree.
pub fn extract_media_sources(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut found = Vec::new();

    for media in document.select(media_selector()) {
        if let Some(src) = media.value().attr("src") {
            found.extend(resolve_url(base, src));
        }
        for source in media.select(source_selector()) {
            if let Some(src) = source.value().attr("src") {
                found.extend(resolve_url(base, src));
            }
        }
    }

    dedup_preserving_order(found)
}

/// Builds the HTTP client used for page and media requests.
pub fn build_client(settings: &AppSettings) -> Result<Client, MediagrabError> {
    Client::builder()
        .user_agent(settings.user_agent.clone())
        .timeout(settings.http_timeout())
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| MediagrabError::FetchError {
            url: String::new(),
            status: None,
            reason: format!("Failed to create HTTP client: {}", e),
        })
}

/// Fetches pages and scrapes their statically declared media
pub struct StaticScraper {
    client: Client,
}

impl StaticScraper {
    pub fn new(settings: &AppSettings) -> Result<Self, MediagrabError> {
        Ok(Self {
            client: build_client(settings)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Returns absolute media URLs declared on `page_url`.
    ///
    /// An empty vector means the page loaded but declared no media; a page
    /// that cannot be retrieved is a `FetchError`.
    pub async fn scrape(&self, page_url: &str) -> Result<Vec<String>, MediagrabError> {
        let base = Url::parse(page_url).map_err(|_| MediagrabError::InvalidUrl(page_url.to_string()))?;
        debug!("Fetching page for static scrape: {}", page_url);

        let response = self
            .client
            .get(base.clone())
            .send()
            .await
            .map_err(|e| MediagrabError::fetch(page_url, e))?;

        if !response.status().is_success() {
            warn!("Page fetch returned {}", response.status());
            return Err(MediagrabError::http_status(page_url, response.status()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MediagrabError::fetch(page_url, e))?;

        let sources = extract_media_sources(&body, &base);
        info!("Static scrape found {} media source(s)", sources.len());
        Ok(sources)
    }
}

#[async_trait]
impl Strategy for StaticScraper {
    fn tier(&self) -> SourceStrategy {
        SourceStrategy::StaticScrape
    }

    async fn attempt(&self, request: &ResolutionRequest) -> Result<TierOutcome, MediagrabError> {
        let urls = self.scrape(&request.target_url).await?;
        Ok(TierOutcome::from_candidates(MediaCandidate::collect(
            urls,
            SourceStrategy::StaticScrape,
        )))
    }
}
