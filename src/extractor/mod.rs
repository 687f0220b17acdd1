pub mod cascade;
pub mod models;
pub mod render;
pub mod static_scraper;
pub mod traits;
pub mod ytdlp;

pub use cascade::ResolutionCascade;
pub use models::{
    MediaCandidate, MediaKind, PlaylistPolicy, ResolutionRequest, ResolutionResult, SourceStrategy,
    VideoInfo,
};
pub use render::{RenderingResolver, RenderingTier};
pub use static_scraper::StaticScraper;
pub use traits::{PageRenderer, Strategy, StructuredExtractor, TierOutcome};
pub use ytdlp::{StructuredTier, YtDlpExtractor};
