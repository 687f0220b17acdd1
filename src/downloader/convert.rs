//! Best-effort audio extraction with ffmpeg

use crate::downloader::traits::AudioConverter;
use crate::utils::config::AppSettings;
use crate::utils::error::MediagrabError;
use crate::utils::platform::{self, FFMPEG};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, info, warn};

/// Converts fetched media files to an audio-only file
pub struct FfmpegConverter {
    ffmpeg: Option<PathBuf>,
    codec: String,
    bitrate_kbps: u32,
}

impl FfmpegConverter {
    pub fn new(settings: &AppSettings) -> Self {
        let ffmpeg = platform::find_tool(&FFMPEG, settings.ffmpeg_path.as_deref());
        match &ffmpeg {
            Some(path) => debug!("Found ffmpeg at: {}", path.display()),
            None => warn!("ffmpeg not found; audio conversion will be skipped"),
        }
        Self {
            ffmpeg,
            codec: settings.audio_codec.clone(),
            bitrate_kbps: settings.audio_bitrate_kbps,
        }
    }

    pub fn with_ffmpeg(ffmpeg: Option<PathBuf>, codec: impl Into<String>, bitrate_kbps: u32) -> Self {
        Self {
            ffmpeg,
            codec: codec.into(),
            bitrate_kbps,
        }
    }

    pub fn output_path(&self, input: &Path) -> PathBuf {
        input.with_extension(&self.codec)
    }

    fn encoder(&self) -> &str {
        match self.codec.as_str() {
            "mp3" => "libmp3lame",
            "opus" => "libopus",
            "m4a" | "aac" => "aac",
            other => other,
        }
    }

    pub fn args(&self, input: &Path, output: &Path) -> Vec<OsString> {
        vec![
            "-hide_banner".into(),
            "-loglevel".into(),
            "error".into(),
            "-y".into(),
            "-i".into(),
            input.as_os_str().to_owned(),
            "-vn".into(),
            "-codec:a".into(),
            self.encoder().into(),
            "-b:a".into(),
            format!("{}k", self.bitrate_kbps).into(),
            output.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl AudioConverter for FfmpegConverter {
    async fn convert(&self, input: &Path) -> Result<PathBuf, MediagrabError> {
        let ffmpeg = self.ffmpeg.as_ref().ok_or_else(|| {
            MediagrabError::ConversionError("ffmpeg not found; install ffmpeg to convert audio".to_string())
        })?;

        let already_converted = input
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.codec));
        if already_converted {
            debug!("{} is already {}", input.display(), self.codec);
            return Ok(input.to_path_buf());
        }

        let output = self.output_path(input);
        let result = AsyncCommand::new(ffmpeg)
            .args(self.args(input, &output))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| MediagrabError::ConversionError(format!("failed to run ffmpeg: {}", e)))?;

        if !result.status.success() {
            let _ = tokio::fs::remove_file(&output).await;
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(MediagrabError::ConversionError(if stderr.is_empty() {
                format!("ffmpeg exited with {}", result.status)
            } else {
                stderr
            }));
        }

        // Same outcome as yt-dlp's --extract-audio: only the audio file remains
        if let Err(e) = tokio::fs::remove_file(input).await {
            warn!("Converted, but could not remove {}: {}", input.display(), e);
        }
        info!("Converted {} -> {}", input.display(), output.display());
        Ok(output)
    }
}
