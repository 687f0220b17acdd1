//! Platform-specific utilities for mediagrab
//!
//! This module provides cross-platform abstractions for:
//! - Configuration and default output directories
//! - Locating external tools (yt-dlp, ffmpeg, Chromium)

use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Returns the configuration directory
/// - macOS: ~/Library/Application Support/mediagrab
/// - Windows: %APPDATA%\mediagrab
/// - Linux: ~/.config/mediagrab
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mediagrab")
}

/// Returns the default output directory (the user's Videos folder)
pub fn default_videos_dir() -> PathBuf {
    dirs::video_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Videos")))
        .unwrap_or_else(|| {
            warn!("Could not determine Videos directory, using current directory");
            PathBuf::from(".")
        })
}

/// Turns an operator-typed directory into an absolute path.
///
/// Blank input selects [`default_videos_dir`]; a leading `~` expands to home.
pub fn resolve_output_dir(input: &str) -> PathBuf {
    let input = input.trim();
    if input.is_empty() {
        return default_videos_dir();
    }

    let expanded = match input.strip_prefix("~") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
            None => PathBuf::from(input),
        },
        None => PathBuf::from(input),
    };

    expanded
        .absolutize()
        .map(|p| p.into_owned())
        .unwrap_or(expanded)
}

/// Description of an external executable and where it usually lives
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Names tried on PATH, in order
    pub names: &'static [&'static str],
    /// Environment variable that may point at the executable
    pub env_var: Option<&'static str>,
    pub common_paths: &'static [&'static str],
}

pub const YTDLP: ToolSpec = ToolSpec {
    names: &["yt-dlp"],
    env_var: Some("YTDLP"),
    common_paths: &[
        // macOS Homebrew (Apple Silicon)
        "/opt/homebrew/bin/yt-dlp",
        // macOS Homebrew (Intel)
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
        "/Library/Frameworks/Python.framework/Versions/Current/bin/yt-dlp",
        "~/.local/bin/yt-dlp",
    ],
};

pub const FFMPEG: ToolSpec = ToolSpec {
    names: &["ffmpeg"],
    env_var: Some("FFMPEG"),
    common_paths: &[
        "/opt/homebrew/bin/ffmpeg",
        "/usr/local/bin/ffmpeg",
        "/usr/bin/ffmpeg",
    ],
};

pub const BROWSER: ToolSpec = ToolSpec {
    names: &[
        "chromium",
        "chromium-browser",
        "google-chrome",
        "google-chrome-stable",
        "chrome",
        "msedge",
    ],
    env_var: Some("CHROME"),
    common_paths: &[
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/snap/bin/chromium",
        "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe",
        "C:\\Program Files (x86)\\Microsoft\\Edge\\Application\\msedge.exe",
    ],
};

/// Find an external tool with priority:
/// 1. Explicit path from settings
/// 2. Environment variable
/// 3. Bundled next to the current executable
/// 4. System PATH
/// 5. Common installation paths
pub fn find_tool(spec: &ToolSpec, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        if is_executable(path) {
            return Some(path.to_path_buf());
        }
        warn!("Configured tool path is not executable: {}", path.display());
    }

    if let Some(var) = spec.env_var {
        if let Some(value) = std::env::var_os(var) {
            let path = PathBuf::from(value);
            if is_executable(&path) {
                debug!("Using {} from ${}", path.display(), var);
                return Some(path);
            }
        }
    }

    if let Some(bundled) = find_bundled(spec) {
        return Some(bundled);
    }

    for name in spec.names {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    spec.common_paths
        .iter()
        .map(|p| expand_home(p))
        .find(|p| is_executable(p))
}

fn find_bundled(spec: &ToolSpec) -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    spec.names.iter().find_map(|name| {
        let candidate = exe_dir.join(format!("{}{}", name, exe_extension()));
        is_executable(&candidate).then_some(candidate)
    })
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Check if a file is executable
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

/// Platform-specific executable extension
pub fn exe_extension() -> &'static str {
    #[cfg(target_os = "windows")]
    {
        ".exe"
    }
    #[cfg(not(target_os = "windows"))]
    {
        ""
    }
}
