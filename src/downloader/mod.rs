//! Download side: direct fetching, progress, audio conversion

pub mod convert;
pub mod fetcher;
pub mod progress;
pub mod traits;

// Re-export for convenience
pub use convert::FfmpegConverter;
pub use fetcher::DirectFetcher;
pub use progress::{DownloadProgress, DownloadStatus, ProgressSender};
pub use traits::{AudioConverter, MediaFetcher};
