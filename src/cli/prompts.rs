//! Console prompts and the terminal-backed [`Operator`]

use crate::extractor::models::{MediaCandidate, MediaKind, PlaylistPolicy, ResolutionRequest};
use crate::operator::Operator;
use crate::utils::platform::{default_videos_dir, resolve_output_dir};
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};
use std::path::PathBuf;
use std::sync::Mutex;

pub const BANNER: &str = "Media Downloader CLI\n====================";

struct Console<R, W> {
    input: R,
    output: W,
}

/// Reads answers from `R` and writes prompts to `W`
pub struct ConsoleOperator<R, W> {
    console: Mutex<Console<R, W>>,
}

impl ConsoleOperator<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead + Send, W: Write + Send> ConsoleOperator<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            console: Mutex::new(Console { input, output }),
        }
    }

    pub fn into_inner(self) -> (R, W) {
        let console = self
            .console
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        (console.input, console.output)
    }

    fn with_console<T>(&self, f: impl FnOnce(&mut Console<R, W>) -> T) -> T {
        let mut guard = self
            .console
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }

    /// Prints `prompt` and reads one line. End of input is `UnexpectedEof`.
    pub fn ask(&self, prompt: &str) -> io::Result<String> {
        self.with_console(|console| {
            write!(console.output, "{}", prompt)?;
            console.output.flush()?;

            let mut line = String::new();
            if console.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
            }
            Ok(line.trim().to_string())
        })
    }

    pub fn say(&self, message: &str) {
        self.with_console(|console| {
            let _ = writeln!(console.output, "{}", message);
        });
    }
}

impl<R: BufRead + Send, W: Write + Send> Operator for ConsoleOperator<R, W> {
    fn confirm_rendering(&self, page_url: &str, reason: &str) -> bool {
        if reason.is_empty() {
            self.say(&format!("Static scraping found nothing usable on {}.", page_url));
        } else {
            self.say(&format!("Static scraping found nothing usable on {}: {}", page_url, reason));
        }
        match self.ask("Try rendering the page in a headless browser? This can take a while [y/N]: ") {
            Ok(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }

    fn choose(&self, candidates: &[MediaCandidate]) -> String {
        self.say(&format!("Found {} media source(s):", candidates.len()));
        for (i, candidate) in candidates.iter().enumerate() {
            self.say(&format!("  {}. {}", i + 1, candidate.url));
        }
        self.ask("Select a number to download, or press Enter for all: ")
            .unwrap_or_default()
    }

    fn notify(&self, message: &str) {
        self.say(message);
    }
}

/// Walks the operator through the request prompts.
///
/// Returns `Ok(None)` when no URL was given.
pub fn collect_request<R: BufRead + Send, W: Write + Send>(
    console: &ConsoleOperator<R, W>,
) -> io::Result<Option<ResolutionRequest>> {
    console.say(BANNER);

    let url = match console.ask("Enter media URL: ") {
        Ok(url) => url,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => String::new(),
        Err(e) => return Err(e),
    };
    if url.is_empty() {
        console.say("No URL provided. Exiting.");
        return Ok(None);
    }

    let kind = loop {
        let answer = console.ask("Download as MP4 (video) or MP3 (audio)? [mp4/mp3]: ")?;
        match MediaKind::parse(&answer) {
            Some(kind) => break kind,
            None => console.say("Invalid choice. Please enter 'mp4' or 'mp3'."),
        }
    };

    let policy = loop {
        let answer = console.ask("Download: 1. Single video 2. Playlist (if applicable) [1/2]: ")?;
        match PlaylistPolicy::parse(&answer) {
            Some(policy) => break policy,
            None => console.say("Invalid choice. Please enter '1' or '2'."),
        }
    };

    let output = console.ask(&format!(
        "Output directory (press Enter for '{}'): ",
        default_videos_dir().display()
    ))?;

    let cookies = console.ask("Cookie file for sites that need a login (press Enter to skip): ")?;
    let cookies = (!cookies.is_empty()).then(|| PathBuf::from(cookies));

    Ok(Some(
        ResolutionRequest::new(url, resolve_output_dir(&output))
            .with_kind(kind)
            .with_playlist_policy(policy)
            .with_credential_artifact(cookies),
    ))
}
