//! yt-dlp wrapper for structured extraction
//!
//! This module is the first cascade tier: it asks yt-dlp for metadata and,
//! when that succeeds, delegates the whole download and conversion to it.

use crate::downloader::progress::{self, DownloadProgress, ProgressSender};
use crate::extractor::models::{
    MediaCandidate, MediaKind, PlaylistPolicy, ResolutionRequest, SourceStrategy, VideoInfo,
};
use crate::extractor::traits::{Strategy, StructuredExtractor, TierOutcome};
use crate::utils::config::AppSettings;
use crate::utils::error::MediagrabError;
use crate::utils::platform::{self, YTDLP};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, info};

/// Structured extractor backed by the yt-dlp executable
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
    settings: AppSettings,
    progress_tx: Option<ProgressSender>,
}

impl YtDlpExtractor {
    /// Locate yt-dlp and build an extractor around it
    pub fn new(settings: AppSettings) -> Result<Self, MediagrabError> {
        let ytdlp_path = match platform::find_tool(&YTDLP, settings.ytdlp_path.as_deref()) {
            Some(path) => {
                info!("Found yt-dlp at: {}", path.display());
                path
            }
            None => {
                error!("yt-dlp not found anywhere!");
                return Err(MediagrabError::YtDlpNotFound);
            }
        };

        Ok(Self::with_path(ytdlp_path, settings))
    }

    pub fn with_path(ytdlp_path: PathBuf, settings: AppSettings) -> Self {
        Self {
            ytdlp_path,
            settings,
            progress_tx: None,
        }
    }

    /// Report download progress parsed from yt-dlp output
    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &PathBuf {
        &self.ytdlp_path
    }

    /// Options shared by extraction and download
    fn common_args(&self, request: &ResolutionRequest) -> Vec<String> {
        let mut args = vec!["--no-warnings".to_string()];
        if self.settings.geo_bypass {
            args.push("--geo-bypass".to_string());
        }
        if !self.settings.check_certificates {
            args.push("--no-check-certificate".to_string());
        }
        args.push("--http-chunk-size".to_string());
        args.push(self.settings.chunk_size_hint.clone());
        if let Some(cookies) = &request.credential_artifact {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }
        args.push(
            match request.playlist_policy {
                PlaylistPolicy::Single => "--no-playlist",
                PlaylistPolicy::AllowPlaylist => "--yes-playlist",
            }
            .to_string(),
        );
        args
    }

    /// Arguments for `yt-dlp --dump-single-json`
    pub fn extract_args(&self, request: &ResolutionRequest) -> Vec<String> {
        let mut args = self.common_args(request);
        args.push("--dump-single-json".to_string());
        args.push("--no-download".to_string());
        if request.playlist_policy == PlaylistPolicy::AllowPlaylist {
            args.push("--flat-playlist".to_string());
        }
        args.push("--".to_string());
        args.push(request.target_url.clone());
        args
    }

    /// Arguments for the actual download, including format selection and post-processing
    pub fn download_args(&self, request: &ResolutionRequest) -> Vec<String> {
        let mut args = self.common_args(request);
        let template = request.output_directory.join("%(title)s.%(ext)s");
        args.extend([
            "--newline".to_string(),
            "--progress".to_string(),
            "-o".to_string(),
            template.to_string_lossy().into_owned(),
        ]);

        match request.desired_kind {
            MediaKind::Video => {
                let height = self.settings.max_video_height;
                args.extend([
                    "-f".to_string(),
                    format!(
                        "bestvideo[height<={h}]+bestaudio/best[height<={h}]",
                        h = height
                    ),
                    "--merge-output-format".to_string(),
                    "mp4".to_string(),
                ]);
            }
            MediaKind::Audio => {
                args.extend([
                    "-f".to_string(),
                    "bestaudio/best".to_string(),
                    "--extract-audio".to_string(),
                    "--audio-format".to_string(),
                    self.settings.audio_codec.clone(),
                    "--audio-quality".to_string(),
                    format!("{}K", self.settings.audio_bitrate_kbps),
                ]);
            }
        }

        args.push("--".to_string());
        args.push(request.target_url.clone());
        args
    }
}

#[async_trait]
impl StructuredExtractor for YtDlpExtractor {
    /// Extract video information without downloading
    async fn extract(&self, request: &ResolutionRequest) -> Result<VideoInfo, MediagrabError> {
        debug!("Extracting video info for URL: {}", request.target_url);

        let output = AsyncCommand::new(&self.ytdlp_path)
            .args(self.extract_args(request))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| MediagrabError::ExtractionError(format!("failed to run yt-dlp: {}", e)))?;

        if !output.status.success() {
            let error_msg = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("yt-dlp extraction failed: {}", error_msg);
            return Err(MediagrabError::ExtractionError(error_msg));
        }

        let video_info: VideoInfo = serde_json::from_slice(&output.stdout)?;
        Ok(video_info)
    }

    async fn download(&self, request: &ResolutionRequest) -> Result<(), MediagrabError> {
        info!("Delegating download of {} to yt-dlp", request.target_url);

        let mut child = AsyncCommand::new(&self.ytdlp_path)
            .args(self.download_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| MediagrabError::ExtractionError(format!("failed to run yt-dlp: {}", e)))?;

        // Drain stderr alongside stdout
        let stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf).await;
                buf
            })
        });

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            let mut current = DownloadProgress::new(request.target_url.clone(), 0);
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(dest) = line.strip_prefix("[download] Destination: ") {
                    current = DownloadProgress::new(dest.to_string(), 0);
                    continue;
                }
                match progress::parse_ytdlp_progress(&line) {
                    Some((pct, speed_bps, total_bytes)) => {
                        current.total_bytes = total_bytes;
                        current.update((pct / 100.0 * total_bytes as f64) as u64, speed_bps);
                        progress::report(self.progress_tx.as_ref(), &current);
                    }
                    None => debug!("yt-dlp: {}", line),
                }
            }
        }

        let status = child.wait().await?;
        let stderr = match stderr_task {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        if status.success() {
            info!("yt-dlp download finished");
            Ok(())
        } else {
            let error_msg = stderr.trim().to_string();
            error!("yt-dlp download failed ({:?}): {}", status.code(), error_msg);
            Err(MediagrabError::ExtractionError(if error_msg.is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                error_msg
            }))
        }
    }
}

/// First cascade tier: structured extraction through a [`StructuredExtractor`]
pub struct StructuredTier {
    extractor: Option<Arc<dyn StructuredExtractor>>,
}

impl StructuredTier {
    pub fn new(extractor: Arc<dyn StructuredExtractor>) -> Self {
        Self {
            extractor: Some(extractor),
        }
    }

    /// Tier whose extractor could not be located; it reports `YtDlpNotFound`.
    pub fn missing() -> Self {
        Self { extractor: None }
    }
}

#[async_trait]
impl Strategy for StructuredTier {
    fn tier(&self) -> SourceStrategy {
        SourceStrategy::Structured
    }

    fn availability(&self) -> Result<(), MediagrabError> {
        match self.extractor {
            Some(_) => Ok(()),
            None => Err(MediagrabError::YtDlpNotFound),
        }
    }

    async fn attempt(&self, request: &ResolutionRequest) -> Result<TierOutcome, MediagrabError> {
        let extractor = self.extractor.as_ref().ok_or(MediagrabError::YtDlpNotFound)?;
        let info = extractor.extract(request).await?;
        if info.is_playlist() {
            info!("Playlist \"{}\" with {} entries", info.title, info.entries.len());
        } else {
            info!("Structured metadata for \"{}\" ({} formats)", info.title, info.formats.len());
        }

        Ok(TierOutcome {
            candidates: MediaCandidate::collect(info.media_urls(), SourceStrategy::Structured),
            metadata: Some(info),
        })
    }
}
