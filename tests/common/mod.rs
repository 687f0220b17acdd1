//! Shared fixtures: a local HTTP server and scripted collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{Html, Redirect};
use axum::routing::get;
use axum::Router;
use mediagrab::downloader::{AudioConverter, MediaFetcher};
use mediagrab::extractor::{MediaCandidate, PageRenderer, ResolutionRequest, StructuredExtractor, VideoInfo};
use mediagrab::operator::Operator;
use mediagrab::utils::MediagrabError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const WATCH_PAGE: &str = r#"<!doctype html>
<html>
  <head><title>Watch</title></head>
  <body>
    <video controls src="/media/clip.mp4">
      <source src="clip-low.webm" type="video/webm">
    </video>
    <audio><source src="https://cdn.example.com/theme.mp3"></audio>
    <video src="/media/clip.mp4"></video>
  </body>
</html>"#;

pub const CLIP_BYTES: &[u8] = b"not really an mp4 but close enough";
pub const LARGE_LEN: usize = 3 * 1024 * 1024 + 17;
pub const HD_BYTES: &[u8] = b"HD-BYTES";
pub const SD_BYTES: &[u8] = b"SD-BYTES";
pub const SLOW_CHUNK: usize = 256 * 1024;
pub const SLOW_CHUNKS: usize = 10;

/// Body sent in `SLOW_CHUNKS` pieces with a pause between them
fn slow_body() -> Body {
    let chunks = futures::stream::unfold(0usize, |i| async move {
        if i == SLOW_CHUNKS {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
        Some((Ok::<_, std::io::Error>(vec![1u8; SLOW_CHUNK]), i + 1))
    });
    Body::from_stream(chunks)
}

/// Body that sends one chunk and then breaks
fn broken_body() -> Body {
    let chunks = futures::stream::iter(vec![
        Ok(b"partial".to_vec()),
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection dropped")),
    ]);
    Body::from_stream(chunks)
}

/// Starts a server on an ephemeral port and returns its base URL.
pub async fn spawn_server() -> String {
    let app = Router::new()
        .route("/watch", get(|| async { Html(WATCH_PAGE) }))
        .route(
            "/plain",
            get(|| async { Html("<html><body><p>Nothing to play here.</p></body></html>") }),
        )
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/media/clip.mp4", get(|| async { CLIP_BYTES }))
        .route("/media/large.bin", get(|| async { vec![7u8; LARGE_LEN] }))
        .route("/go", get(|| async { Redirect::temporary("/media/clip.mp4") }))
        .route("/hd/clip.mp4", get(|| async { HD_BYTES }))
        .route("/sd/clip.mp4", get(|| async { SD_BYTES }))
        .route("/cut/clip.mp4", get(|| async { broken_body() }))
        .route("/media/slow.bin", get(|| async { slow_body() }))
        .route("/", get(|| async { CLIP_BYTES }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

/// Operator with canned answers that records what it was told
pub struct ScriptedOperator {
    pub consent: bool,
    pub choice: String,
    pub consent_requests: AtomicUsize,
    pub choose_requests: AtomicUsize,
    pub notes: Mutex<Vec<String>>,
    pub consent_reasons: Mutex<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new(consent: bool, choice: &str) -> Self {
        Self {
            consent,
            choice: choice.to_string(),
            consent_requests: AtomicUsize::new(0),
            choose_requests: AtomicUsize::new(0),
            notes: Mutex::new(Vec::new()),
            consent_reasons: Mutex::new(Vec::new()),
        }
    }

    pub fn notes(&self) -> Vec<String> {
        self.notes.lock().unwrap().clone()
    }
}

impl Operator for ScriptedOperator {
    fn confirm_rendering(&self, _page_url: &str, reason: &str) -> bool {
        self.consent_requests.fetch_add(1, Ordering::SeqCst);
        self.consent_reasons.lock().unwrap().push(reason.to_string());
        self.consent
    }

    fn choose(&self, _candidates: &[MediaCandidate]) -> String {
        self.choose_requests.fetch_add(1, Ordering::SeqCst);
        self.choice.clone()
    }

    fn notify(&self, message: &str) {
        self.notes.lock().unwrap().push(message.to_string());
    }
}

/// Renderer that returns fixed URLs and counts how often it ran
pub struct FakeRenderer {
    pub urls: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeRenderer {
    pub fn new(urls: &[&str]) -> Self {
        Self {
            urls: urls.iter().map(|u| u.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn render(&self, _page_url: &str, _timeout_ms: u64) -> Result<Vec<String>, MediagrabError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.urls.clone())
    }
}

/// Structured extractor whose extraction either yields `info` or fails
pub struct FakeExtractor {
    pub info: Option<VideoInfo>,
    pub failure: String,
    pub downloads: AtomicUsize,
}

impl FakeExtractor {
    pub fn succeeding(info: VideoInfo) -> Self {
        Self {
            info: Some(info),
            failure: String::new(),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            info: None,
            failure: message.to_string(),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StructuredExtractor for FakeExtractor {
    async fn extract(&self, _request: &ResolutionRequest) -> Result<VideoInfo, MediagrabError> {
        self.info
            .clone()
            .ok_or_else(|| MediagrabError::ExtractionError(self.failure.clone()))
    }

    async fn download(&self, _request: &ResolutionRequest) -> Result<(), MediagrabError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Writes a small file per URL, failing for URLs containing `fail_marker`
pub struct FakeFetcher {
    pub fail_marker: Option<String>,
    pub attempted: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new(fail_marker: Option<&str>) -> Self {
        Self {
            fail_marker: fail_marker.map(str::to_string),
            attempted: Mutex::new(Vec::new()),
        }
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaFetcher for FakeFetcher {
    async fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        _filename: Option<&str>,
    ) -> Result<PathBuf, MediagrabError> {
        self.attempted.lock().unwrap().push(url.to_string());
        if self.fail_marker.as_deref().is_some_and(|m| url.contains(m)) {
            return Err(MediagrabError::FetchError {
                url: url.to_string(),
                status: Some(reqwest::StatusCode::NOT_FOUND),
                reason: "HTTP error: 404 Not Found".to_string(),
            });
        }
        let name = url.rsplit('/').next().unwrap_or("download");
        let path = output_dir.join(name);
        tokio::fs::write(&path, b"media").await?;
        Ok(path)
    }
}

/// Converter that always fails, leaving the input untouched
pub struct BrokenConverter;

#[async_trait]
impl AudioConverter for BrokenConverter {
    async fn convert(&self, _input: &Path) -> Result<PathBuf, MediagrabError> {
        Err(MediagrabError::ConversionError("ffmpeg not found".to_string()))
    }
}

/// Converter that renames the input to `.mp3`
pub struct RenamingConverter;

#[async_trait]
impl AudioConverter for RenamingConverter {
    async fn convert(&self, input: &Path) -> Result<PathBuf, MediagrabError> {
        let output = input.with_extension("mp3");
        tokio::fs::rename(input, &output).await?;
        Ok(output)
    }
}
