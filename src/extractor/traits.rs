use crate::extractor::models::{MediaCandidate, ResolutionRequest, SourceStrategy, VideoInfo};
use crate::utils::error::MediagrabError;
use async_trait::async_trait;

/// What a tier hands back when it ran without error
#[derive(Debug, Clone, Default)]
pub struct TierOutcome {
    pub candidates: Vec<MediaCandidate>,
    /// Only the structured tier fills this in
    pub metadata: Option<VideoInfo>,
}

impl TierOutcome {
    pub fn from_candidates(candidates: Vec<MediaCandidate>) -> Self {
        Self {
            candidates,
            metadata: None,
        }
    }

    /// Structured metadata counts on its own; the scraping tiers need at least one URL.
    pub fn is_usable(&self) -> bool {
        self.metadata.is_some() || !self.candidates.is_empty()
    }
}

/// One tier of the resolution cascade
///
/// Every extraction strategy exposes the same capability interface so the
/// cascade can walk an ordered list of them.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Which tier this strategy represents
    fn tier(&self) -> SourceStrategy;

    /// Whether the capability behind this tier exists in the environment.
    ///
    /// An `Err` here means the tier is skipped and the error is reported.
    fn availability(&self) -> Result<(), MediagrabError> {
        Ok(())
    }

    /// Tiers that must be confirmed by the operator before they run
    fn needs_consent(&self) -> bool {
        false
    }

    /// Runs the strategy against the request
    async fn attempt(&self, request: &ResolutionRequest) -> Result<TierOutcome, MediagrabError>;
}

/// Site-aware metadata extraction and download (yt-dlp)
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    /// Extracts metadata without downloading
    async fn extract(&self, request: &ResolutionRequest) -> Result<VideoInfo, MediagrabError>;

    /// Downloads (and converts) the request's target with the extractor's own format selection
    async fn download(&self, request: &ResolutionRequest) -> Result<(), MediagrabError>;
}

/// Script-executing page loader that reports media URLs it observed
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, page_url: &str, timeout_ms: u64) -> Result<Vec<String>, MediagrabError>;
}
