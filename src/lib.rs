//! Mediagrab library

pub mod cli;
pub mod downloader;
pub mod extractor;
pub mod operator;
pub mod pipeline;
pub mod utils;

// Re-export main types for easier use
pub use downloader::{DirectFetcher, DownloadProgress, DownloadStatus, FfmpegConverter};
pub use extractor::{
    MediaCandidate, MediaKind, PlaylistPolicy, ResolutionCascade, ResolutionRequest, ResolutionResult,
    SourceStrategy, VideoInfo, YtDlpExtractor,
};
pub use operator::Operator;
pub use pipeline::{DownloadPipeline, DownloadReport};
pub use utils::{AppSettings, MediagrabError};
