//! Mediagrab - media downloader with a fallback resolution cascade
//!
//! Asks for a page URL, resolves it through yt-dlp, the page's static HTML,
//! or a headless browser (in that order), then downloads what was found.

use anyhow::Result;
use clap::Parser;
use mediagrab::cli::{collect_request, ConsoleOperator};
use mediagrab::downloader::{DirectFetcher, DownloadProgress, DownloadStatus, FfmpegConverter};
use mediagrab::extractor::{
    RenderingResolver, RenderingTier, ResolutionCascade, ResolutionRequest, StaticScraper,
    StructuredExtractor, StructuredTier, YtDlpExtractor,
};
use mediagrab::operator::Operator;
use mediagrab::pipeline::DownloadPipeline;
use mediagrab::utils::{AppSettings, MediagrabError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn, Level};

#[derive(Parser)]
#[command(name = "mediagrab", version, about)]
struct Args {
    /// Settings file (default: <config dir>/mediagrab/settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Never fall back to the headless browser
    #[arg(long)]
    no_render: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so prompts on stdout stay readable
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let settings = AppSettings::load(args.config.as_deref())?;
    let console = ConsoleOperator::stdio();

    let Some(request) = collect_request(&console)? else {
        return Ok(ExitCode::FAILURE);
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(resolve_and_download(settings, request, &console, args.no_render))
}

async fn resolve_and_download(
    settings: AppSettings,
    request: ResolutionRequest,
    operator: &dyn Operator,
    no_render: bool,
) -> Result<ExitCode> {
    let (progress_tx, mut progress_rx) = mpsc::channel::<DownloadProgress>(100);

    // Spawn progress reporter
    let printer = tokio::spawn(async move {
        while let Some(progress) = progress_rx.recv().await {
            match progress.status {
                DownloadStatus::Completed | DownloadStatus::Failed(_) => {
                    eprintln!("\r{}", progress.describe())
                }
                _ => {
                    eprint!("\r{}", progress.describe());
                    let _ = std::io::stderr().flush();
                }
            }
        }
    });

    let structured: Option<Arc<dyn StructuredExtractor>> = match YtDlpExtractor::new(settings.clone()) {
        Ok(extractor) => {
            let extractor: Arc<dyn StructuredExtractor> =
                Arc::new(extractor.with_progress(progress_tx.clone()));
            Some(extractor)
        }
        Err(e) => {
            warn!("{}; structured extraction will be skipped", e);
            None
        }
    };

    let structured_tier = structured
        .clone()
        .map(StructuredTier::new)
        .unwrap_or_else(StructuredTier::missing);
    let rendering = (!no_render).then(|| {
        RenderingTier::from_detection(RenderingResolver::detect(&settings), settings.render_timeout_ms)
    });
    let cascade = ResolutionCascade::standard(structured_tier, StaticScraper::new(&settings)?, rendering);

    let result = match cascade.resolve(&request, operator).await {
        Ok(result) => result,
        Err(MediagrabError::CascadeExhausted(failure)) => {
            // The rendered tier's line already carries any install guidance
            operator.notify(&failure.to_string());
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };
    drop(cascade);
    info!("Resolved via the {} tier", result.strategy_used);

    let fetcher = DirectFetcher::new(&settings)?.with_progress(progress_tx.clone());
    let pipeline = DownloadPipeline::new(
        structured,
        Arc::new(fetcher),
        Arc::new(FfmpegConverter::new(&settings)),
    );
    let outcome = pipeline.run(&request, &result, operator).await;

    // Close every sender so the reporter drains and exits
    drop(pipeline);
    drop(progress_tx);
    let _ = printer.await;

    let report = outcome?;
    if !report.failed.is_empty() {
        operator.notify(&format!("{} download(s) failed", report.failed.len()));
    }
    if !report.conversion_failures.is_empty() {
        operator.notify(&format!(
            "{} file(s) were kept in their original format",
            report.conversion_failures.len()
        ));
    }

    if report.is_success() {
        operator.notify("Download completed successfully!");
        Ok(ExitCode::SUCCESS)
    } else {
        operator.notify("Nothing was downloaded.");
        Ok(ExitCode::FAILURE)
    }
}
