//! Progress tracking for downloads

use tokio::sync::mpsc;

/// Channel end that download code reports progress through
pub type ProgressSender = mpsc::Sender<DownloadProgress>;

/// Progress tracking structure
#[derive(Debug, Clone)]
pub struct DownloadProgress {
    /// File name or title being downloaded
    pub label: String,
    /// 0 when the server did not announce a length
    pub total_bytes: u64,
    pub downloaded_bytes: u64,
    pub speed: f64, // bytes per second
    pub status: DownloadStatus,
}

impl DownloadProgress {
    pub fn new(label: impl Into<String>, total_bytes: u64) -> Self {
        Self {
            label: label.into(),
            total_bytes,
            downloaded_bytes: 0,
            speed: 0.0,
            status: DownloadStatus::Initializing,
        }
    }

    /// Update progress with new data
    pub fn update(&mut self, downloaded_bytes: u64, speed: f64) {
        self.downloaded_bytes = downloaded_bytes;
        self.speed = speed;
        self.status = DownloadStatus::Downloading;
    }

    /// Mark as completed
    pub fn complete(&mut self) {
        self.status = DownloadStatus::Completed;
        if self.total_bytes == 0 {
            self.total_bytes = self.downloaded_bytes;
        }
        self.downloaded_bytes = self.total_bytes;
    }

    /// Mark as failed
    pub fn failed(&mut self, error: String) {
        self.status = DownloadStatus::Failed(error);
    }

    /// Get progress percentage (0.0 to 1.0)
    pub fn percentage(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        (self.downloaded_bytes as f64 / self.total_bytes as f64).min(1.0)
    }

    /// One-line human readable rendering for the terminal
    pub fn describe(&self) -> String {
        let mib = |bytes: u64| bytes as f64 / 1024.0 / 1024.0;
        match &self.status {
            DownloadStatus::Completed => format!("{}: done ({:.2} MiB)", self.label, mib(self.total_bytes)),
            DownloadStatus::Failed(e) => format!("{}: failed ({})", self.label, e),
            _ if self.total_bytes > 0 => format!(
                "{}: {:.1}% of {:.2} MiB at {:.2} MiB/s",
                self.label,
                self.percentage() * 100.0,
                mib(self.total_bytes),
                self.speed / 1024.0 / 1024.0
            ),
            _ => format!(
                "{}: {:.2} MiB at {:.2} MiB/s",
                self.label,
                mib(self.downloaded_bytes),
                self.speed / 1024.0 / 1024.0
            ),
        }
    }
}

/// Download status
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DownloadStatus {
    #[default]
    Initializing,
    Downloading,
    Completed,
    Failed(String),
}

/// Sends without waiting; progress is dropped when the consumer lags behind.
pub fn report(tx: Option<&ProgressSender>, progress: &DownloadProgress) {
    if let Some(tx) = tx {
        let _ = tx.try_send(progress.clone());
    }
}

/// Parses a yt-dlp progress line into `(percent, speed_bps, total_bytes)`.
///
/// Expected format: `[download]  42.5% of ~ 150.00MiB at  5.20MiB/s ETA 00:15`
pub fn parse_ytdlp_progress(line: &str) -> Option<(f64, f64, u64)> {
    let rest = line.trim_start().strip_prefix("[download]")?;
    let pct_pos = rest.find('%')?;
    let pct = rest[..pct_pos].trim().parse::<f64>().ok()?;

    let mut total_bytes = 0;
    let mut speed_bps = 0.0;
    let mut tokens = rest[pct_pos + 1..].split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        match token {
            "of" => {
                if tokens.peek() == Some(&"~") {
                    tokens.next();
                }
                if let Some(size) = tokens.next() {
                    total_bytes = parse_size(size.trim_start_matches('~')).unwrap_or(0);
                }
            }
            "at" => {
                if let Some(speed) = tokens.next() {
                    speed_bps = speed
                        .strip_suffix("/s")
                        .and_then(parse_size)
                        .unwrap_or(0) as f64;
                }
            }
            _ => {}
        }
    }

    Some((pct, speed_bps, total_bytes))
}

/// Parses sizes such as `150.00MiB`, `512KiB`, `3.1GB` into bytes.
fn parse_size(token: &str) -> Option<u64> {
    let split = token
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(token.len());
    let num = token[..split].parse::<f64>().ok()?;
    let multiplier = match token[split..].trim() {
        "" | "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "KB" | "kB" => 1_000.0,
        "MB" => 1_000_000.0,
        "GB" => 1_000_000_000.0,
        _ => return None,
    };
    Some((num * multiplier) as u64)
}
