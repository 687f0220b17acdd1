//! Data structures shared by every resolution tier

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Cascade tier that produced a candidate or a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceStrategy {
    Structured,
    StaticScrape,
    Rendered,
}

impl SourceStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceStrategy::Structured => "structured",
            SourceStrategy::StaticScrape => "static-scrape",
            SourceStrategy::Rendered => "rendered",
        }
    }
}

impl fmt::Display for SourceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered, directly fetchable media URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaCandidate {
    pub url: String,
    pub source_strategy: SourceStrategy,
}

impl MediaCandidate {
    pub fn new(url: impl Into<String>, source_strategy: SourceStrategy) -> Self {
        Self {
            url: url.into(),
            source_strategy,
        }
    }

    /// Tags a list of URLs with their tier, dropping repeats while keeping first-seen order.
    pub fn collect<I, S>(urls: I, source_strategy: SourceStrategy) -> Vec<MediaCandidate>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        dedup_preserving_order(urls.into_iter().map(Into::into))
            .into_iter()
            .map(|url| MediaCandidate::new(url, source_strategy))
            .collect()
    }
}

/// Removes duplicate URLs, keeping the first occurrence of each.
pub fn dedup_preserving_order<I>(urls: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// What the operator wants to end up with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Parses the operator's answer to the kind prompt.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "video" | "mp4" => Some(MediaKind::Video),
            "mp3" | "audio" => Some(MediaKind::Audio),
            _ => None,
        }
    }
}

/// Whether a playlist URL should expand to all of its entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaylistPolicy {
    Single,
    AllowPlaylist,
}

impl PlaylistPolicy {
    /// Parses the `1`/`2` answer to the playlist prompt.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(PlaylistPolicy::Single),
            "2" => Some(PlaylistPolicy::AllowPlaylist),
            _ => None,
        }
    }
}

/// Immutable description of one resolution pass
#[derive(Debug, Clone)]
pub struct ResolutionRequest {
    pub target_url: String,
    /// Cookie file handed to yt-dlp untouched
    pub credential_artifact: Option<PathBuf>,
    pub output_directory: PathBuf,
    pub desired_kind: MediaKind,
    pub playlist_policy: PlaylistPolicy,
}

impl ResolutionRequest {
    pub fn new(target_url: impl Into<String>, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            target_url: target_url.into(),
            credential_artifact: None,
            output_directory: output_directory.into(),
            desired_kind: MediaKind::Video,
            playlist_policy: PlaylistPolicy::Single,
        }
    }

    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.desired_kind = kind;
        self
    }

    pub fn with_playlist_policy(mut self, policy: PlaylistPolicy) -> Self {
        self.playlist_policy = policy;
        self
    }

    pub fn with_credential_artifact(mut self, path: Option<PathBuf>) -> Self {
        self.credential_artifact = path;
        self
    }

    /// Creates the output directory if it does not exist yet.
    pub async fn ensure_output_directory(&self) -> std::io::Result<&Path> {
        tokio::fs::create_dir_all(&self.output_directory).await?;
        Ok(&self.output_directory)
    }
}

/// Metadata reported by yt-dlp (`--dump-single-json`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub webpage_url: Option<String>,
    /// Direct media URL, when the extractor resolved a single one
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub formats: Vec<Format>,
    /// Flat playlist entries (`_type: playlist`)
    #[serde(default)]
    pub entries: Vec<VideoInfo>,
    #[serde(default, rename = "_type")]
    pub kind: Option<String>,
}

impl VideoInfo {
    pub fn is_playlist(&self) -> bool {
        self.kind.as_deref() == Some("playlist")
    }

    /// Every distinct direct URL the metadata exposes, formats first.
    pub fn media_urls(&self) -> Vec<String> {
        let format_urls = self.formats.iter().filter_map(|f| f.url.clone());
        dedup_preserving_order(format_urls.chain(self.url.clone()))
    }
}

/// Video format information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub url: Option<String>,
    pub resolution: Option<String>,
    pub height: Option<u32>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub format_note: Option<String>,
}

/// Outcome of a successful cascade
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    pub strategy_used: SourceStrategy,
    pub candidates: Vec<MediaCandidate>,
    pub structured_metadata: Option<VideoInfo>,
}
