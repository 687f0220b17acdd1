use crate::utils::error::MediagrabError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Saves one URL into a directory
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Returns the path of the written file
    async fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        filename: Option<&str>,
    ) -> Result<PathBuf, MediagrabError>;
}

/// Post-download audio extraction
#[async_trait]
pub trait AudioConverter: Send + Sync {
    /// Converts `input` and returns the path of the converted file
    async fn convert(&self, input: &Path) -> Result<PathBuf, MediagrabError>;
}
