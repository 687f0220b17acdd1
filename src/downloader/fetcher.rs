//! Direct HTTP download of a single media URL

use crate::downloader::progress::{self, DownloadProgress, ProgressSender};
use crate::downloader::traits::MediaFetcher;
use crate::utils::config::AppSettings;
use crate::utils::error::MediagrabError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

/// Name used when the URL has no usable last path segment
pub const FALLBACK_FILENAME: &str = "download";

/// Makes a name safe to create on every platform.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Derives a file name from the last path segment of `url`.
pub fn filename_from_url(url: &str) -> String {
    let segment = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|s| match urlencoding::decode(s) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => s.to_string(),
            })
    });

    match segment {
        Some(segment) => sanitize_filename(&segment),
        None => FALLBACK_FILENAME.to_string(),
    }
}

/// `clip.mp4` -> `clip (n).mp4`
fn numbered(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", name, n),
    }
}

/// Creates a file named `name` in `dir` without touching existing files,
/// numbering the name until it is free.
pub async fn create_unique(dir: &Path, name: &str) -> Result<(File, PathBuf), MediagrabError> {
    let mut n = 0u32;
    loop {
        let candidate = if n == 0 {
            dir.join(name)
        } else {
            dir.join(numbered(name, n))
        };
        match OpenOptions::new().write(true).create_new(true).open(&candidate).await {
            Ok(file) => return Ok((file, candidate)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && n < 10_000 => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Streams a response body straight to disk
pub struct DirectFetcher {
    client: Client,
    progress_tx: Option<ProgressSender>,
}

impl DirectFetcher {
    pub fn new(settings: &AppSettings) -> Result<Self, MediagrabError> {
        // Connect timeout only; the body itself may stream for as long as it needs
        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.http_timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| MediagrabError::FetchError {
                url: String::new(),
                status: None,
                reason: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            progress_tx: None,
        }
    }

    pub fn with_progress(mut self, tx: ProgressSender) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    /// Writes the body chunk by chunk; memory use is bounded by the chunk size.
    async fn stream_to_file(
        &self,
        url: &str,
        response: Response,
        file: &mut File,
        progress: &mut DownloadProgress,
    ) -> Result<(), MediagrabError> {
        let start_time = Instant::now();
        let mut last_update_time = start_time;
        let mut downloaded = 0u64;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| MediagrabError::fetch(url, e))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            let now = Instant::now();
            if now.duration_since(last_update_time) >= Duration::from_millis(500) {
                let elapsed = now.duration_since(start_time).as_secs_f64();
                let speed = if elapsed > 0.0 {
                    downloaded as f64 / elapsed
                } else {
                    0.0
                };
                progress.update(downloaded, speed);
                progress::report(self.progress_tx.as_ref(), progress);
                last_update_time = now;
            }
        }

        file.flush().await?;

        let elapsed = start_time.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            downloaded as f64 / elapsed
        } else {
            0.0
        };
        progress.update(downloaded, speed);
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for DirectFetcher {
    async fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        filename: Option<&str>,
    ) -> Result<PathBuf, MediagrabError> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MediagrabError::fetch(url, e))?;

        if !response.status().is_success() {
            return Err(MediagrabError::http_status(url, response.status()));
        }

        let name = match filename {
            Some(name) => sanitize_filename(name),
            None => filename_from_url(url),
        };
        let (mut file, output_path) = create_unique(output_dir, &name).await?;
        if output_path.file_name() != Some(std::ffi::OsStr::new(&name)) {
            debug!("{} already exists, saving as {}", name, output_path.display());
        }

        let mut progress = DownloadProgress::new(name, response.content_length().unwrap_or(0));
        progress::report(self.progress_tx.as_ref(), &progress);

        match self.stream_to_file(url, response, &mut file, &mut progress).await {
            Ok(()) => {
                progress.complete();
                progress::report(self.progress_tx.as_ref(), &progress);
                info!(
                    "Saved {} ({} bytes)",
                    output_path.display(),
                    progress.downloaded_bytes
                );
                Ok(output_path)
            }
            Err(e) => {
                drop(file);
                if let Err(remove_err) = tokio::fs::remove_file(&output_path).await {
                    warn!(
                        "Failed to remove partial file {}: {}",
                        output_path.display(),
                        remove_err
                    );
                }
                progress.failed(e.to_string());
                progress::report(self.progress_tx.as_ref(), &progress);
                Err(e)
            }
        }
    }
}
