//! Application configuration

use crate::utils::platform;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// User-Agent sent by the scraper and the direct fetcher
    pub user_agent: String,

    /// HTTP request timeout (seconds)
    pub http_timeout_secs: u64,

    /// Browser navigation timeout (milliseconds)
    pub render_timeout_ms: u64,

    /// Wait after navigation for lazy players (milliseconds)
    pub settle_window_ms: u64,

    /// Height ceiling for structured video downloads
    pub max_video_height: u32,

    /// Target codec for audio conversion
    pub audio_codec: String,

    /// Target bitrate for audio conversion (kbps)
    pub audio_bitrate_kbps: u32,

    /// yt-dlp `--http-chunk-size` value
    pub chunk_size_hint: String,

    pub geo_bypass: bool,

    pub check_certificates: bool,

    /// Explicit tool locations; discovered on PATH when unset
    pub ytdlp_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub browser_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http_timeout_secs: 15,
            render_timeout_ms: 15_000,
            settle_window_ms: 3_000,
            max_video_height: 1440,
            audio_codec: "mp3".to_string(),
            audio_bitrate_kbps: 192,
            chunk_size_hint: "10M".to_string(),
            geo_bypass: true,
            check_certificates: false,
            ytdlp_path: None,
            ffmpeg_path: None,
            browser_path: None,
        }
    }
}

impl AppSettings {
    /// Loads settings from `path`, or from `settings.json` in the config directory.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| platform::config_dir().join("settings.json"));

        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        info!("Loaded settings from {}", path.display());
        Ok(settings.sanitized())
    }

    /// Replaces zero timeouts with the defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.http_timeout_secs == 0 {
            self.http_timeout_secs = defaults.http_timeout_secs;
        }
        if self.render_timeout_ms == 0 {
            self.render_timeout_ms = defaults.render_timeout_ms;
        }
        if self.audio_bitrate_kbps == 0 {
            self.audio_bitrate_kbps = defaults.audio_bitrate_kbps;
        }
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }
}
