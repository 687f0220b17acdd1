//! Selection & download pipeline
//!
//! Consumes a [`ResolutionResult`]. Structured results are handed back to
//! yt-dlp wholesale; everything else goes candidate by candidate through the
//! direct fetcher, with optional audio conversion afterwards.

pub mod selection;

use crate::downloader::traits::{AudioConverter, MediaFetcher};
use crate::extractor::models::{MediaCandidate, MediaKind, ResolutionRequest, ResolutionResult, SourceStrategy};
use crate::extractor::traits::StructuredExtractor;
use crate::operator::Operator;
use crate::utils::error::MediagrabError;
use selection::{parse_selection, Selection};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

pub use selection::SelectionOutcome;

/// A candidate that did not make it to disk (or was not converted)
#[derive(Debug)]
pub struct FailedItem {
    pub url: String,
    pub error: MediagrabError,
}

/// What one pipeline run produced
#[derive(Debug, Default)]
pub struct DownloadReport {
    /// yt-dlp handled the download itself
    pub delegated: bool,
    pub completed: Vec<PathBuf>,
    pub failed: Vec<FailedItem>,
    /// Files that were fetched but could not be converted; they stay on disk
    pub conversion_failures: Vec<FailedItem>,
}

impl DownloadReport {
    /// True when at least one download path completed
    pub fn is_success(&self) -> bool {
        self.delegated || !self.completed.is_empty()
    }
}

pub struct DownloadPipeline {
    structured: Option<Arc<dyn StructuredExtractor>>,
    fetcher: Arc<dyn MediaFetcher>,
    converter: Arc<dyn AudioConverter>,
}

impl DownloadPipeline {
    pub fn new(
        structured: Option<Arc<dyn StructuredExtractor>>,
        fetcher: Arc<dyn MediaFetcher>,
        converter: Arc<dyn AudioConverter>,
    ) -> Self {
        Self {
            structured,
            fetcher,
            converter,
        }
    }

    pub async fn run(
        &self,
        request: &ResolutionRequest,
        result: &ResolutionResult,
        operator: &dyn Operator,
    ) -> Result<DownloadReport, MediagrabError> {
        let output_dir = request.ensure_output_directory().await?;
        info!("Saving into {}", output_dir.display());

        if result.strategy_used == SourceStrategy::Structured {
            let extractor = self.structured.as_ref().ok_or(MediagrabError::YtDlpNotFound)?;
            if let Some(info) = result.structured_metadata.as_ref().filter(|i| i.is_playlist()) {
                operator.notify(&format!(
                    "Playlist \"{}\" with {} entries",
                    info.title,
                    info.entries.len()
                ));
            }
            let verb = match request.desired_kind {
                MediaKind::Video => "video",
                MediaKind::Audio => "audio",
            };
            operator.notify(&format!("Downloading {}...", verb));
            extractor.download(request).await?;
            return Ok(DownloadReport {
                delegated: true,
                ..Default::default()
            });
        }

        if result.candidates.is_empty() {
            return Err(MediagrabError::NoMedia(request.target_url.clone()));
        }

        let answer = operator.choose(&result.candidates);
        let outcome = parse_selection(&answer, result.candidates.len());
        if let Some(warning) = &outcome.warning {
            warn!("{}", warning);
            operator.notify(warning);
        }

        let mut report = DownloadReport::default();
        match outcome.selection {
            Selection::One(_) => {
                let candidate = outcome.selection.apply(&result.candidates)[0];
                let path = self.fetch_one(request, candidate).await?;
                self.finish(request, candidate, path, &mut report, operator).await;
            }
            Selection::All => {
                let total = result.candidates.len();
                for (i, candidate) in result.candidates.iter().enumerate() {
                    info!("Downloading {}/{}: {}", i + 1, total, candidate.url);
                    match self.fetch_one(request, candidate).await {
                        Ok(path) => self.finish(request, candidate, path, &mut report, operator).await,
                        Err(e) => {
                            error!("Download of {} failed: {}", candidate.url, e);
                            operator.notify(&format!("Failed to download {}: {}", candidate.url, e));
                            report.failed.push(FailedItem {
                                url: candidate.url.clone(),
                                error: e,
                            });
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    async fn fetch_one(
        &self,
        request: &ResolutionRequest,
        candidate: &MediaCandidate,
    ) -> Result<PathBuf, MediagrabError> {
        self.fetcher
            .fetch(&candidate.url, &request.output_directory, None)
            .await
    }

    /// Records a fetched file, converting it first when audio was requested.
    async fn finish(
        &self,
        request: &ResolutionRequest,
        candidate: &MediaCandidate,
        path: PathBuf,
        report: &mut DownloadReport,
        operator: &dyn Operator,
    ) {
        if request.desired_kind != MediaKind::Audio {
            report.completed.push(path);
            return;
        }

        match self.converter.convert(&path).await {
            Ok(converted) => report.completed.push(converted),
            Err(e) => {
                warn!("Keeping {} unconverted: {}", path.display(), e);
                operator.notify(&format!("Could not convert {} to audio: {}", path.display(), e));
                report.conversion_failures.push(FailedItem {
                    url: candidate.url.clone(),
                    error: e,
                });
                report.completed.push(path);
            }
        }
    }
}
