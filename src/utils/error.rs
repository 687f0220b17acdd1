//! Error handling for mediagrab

use crate::extractor::models::SourceStrategy;
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// Main error type for mediagrab
#[derive(Debug, Error)]
pub enum MediagrabError {
    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("Failed to extract video info: {0}")]
    ExtractionError(String),

    #[error("Failed to fetch {url}: {reason}")]
    FetchError {
        url: String,
        status: Option<StatusCode>,
        reason: String,
    },

    #[error("Headless browser not available: {0}")]
    RenderingUnavailable(String),

    #[error("Rendering failed: {0}")]
    RenderingError(String),

    #[error("Rendering skipped by operator")]
    RenderingDeclined,

    #[error("No media found on {0}")]
    NoMedia(String),

    #[error("Audio conversion failed: {0}")]
    ConversionError(String),

    #[error("{0}")]
    CascadeExhausted(CascadeFailure),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl MediagrabError {
    /// Builds a `FetchError` from a transport-level reqwest failure.
    pub fn fetch(url: &str, err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            format!("request timed out ({})", err)
        } else {
            err.to_string()
        };
        Self::FetchError {
            url: url.to_string(),
            status: err.status(),
            reason,
        }
    }

    /// Builds a `FetchError` for a non-success HTTP status.
    pub fn http_status(url: &str, status: StatusCode) -> Self {
        Self::FetchError {
            url: url.to_string(),
            status: Some(status),
            reason: format!("HTTP error: {}", status),
        }
    }

    /// HTTP status attached to a fetch failure, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::FetchError { status, .. } => *status,
            _ => None,
        }
    }
}

/// One tier's reason for not producing candidates.
#[derive(Debug)]
pub struct TierFailure {
    pub tier: SourceStrategy,
    pub error: MediagrabError,
}

/// Terminal report produced when every attempted tier failed or came up empty.
#[derive(Debug)]
pub struct CascadeFailure {
    pub target_url: String,
    pub failures: Vec<TierFailure>,
}

impl CascadeFailure {
    /// Root cause reported by the structured tier.
    pub fn structured_cause(&self) -> Option<&MediagrabError> {
        self.failures
            .iter()
            .find(|f| f.tier == SourceStrategy::Structured)
            .map(|f| &f.error)
    }

    /// Installation guidance when the rendering tier was skipped for lack of a browser.
    pub fn install_guidance(&self) -> Option<&str> {
        self.failures.iter().find_map(|f| match &f.error {
            MediagrabError::RenderingUnavailable(guidance) => Some(guidance.as_str()),
            _ => None,
        })
    }
}

impl fmt::Display for CascadeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not resolve any media from {}", self.target_url)?;
        for failure in &self.failures {
            write!(f, "\n  [{}] {}", failure.tier, failure.error)?;
        }
        Ok(())
    }
}
