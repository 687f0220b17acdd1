//! Utility modules for error handling, configuration and platform lookups

pub mod config;
pub mod error;
pub mod platform;

// Re-export for convenience
pub use config::AppSettings;
pub use error::{CascadeFailure, MediagrabError, TierFailure};
pub use platform::{default_videos_dir, find_tool, resolve_output_dir};
