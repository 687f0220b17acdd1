//! Selection and download behaviour over resolved candidates.

mod common;

use common::{BrokenConverter, FakeExtractor, FakeFetcher, RenamingConverter, ScriptedOperator};
use mediagrab::downloader::AudioConverter;
use mediagrab::extractor::{
    MediaCandidate, MediaKind, ResolutionRequest, ResolutionResult, SourceStrategy, StructuredExtractor,
    VideoInfo,
};
use mediagrab::pipeline::DownloadPipeline;
use mediagrab::utils::MediagrabError;
use std::sync::Arc;
use tempfile::TempDir;

const A: &str = "https://cdn.example.com/a.mp4";
const B: &str = "https://cdn.example.com/b.mp4";
const C: &str = "https://cdn.example.com/c.mp4";

fn scraped(urls: &[&str]) -> ResolutionResult {
    ResolutionResult {
        strategy_used: SourceStrategy::StaticScrape,
        candidates: MediaCandidate::collect(urls.iter().copied(), SourceStrategy::StaticScrape),
        structured_metadata: None,
    }
}

fn pipeline(fetcher: Arc<FakeFetcher>, converter: Arc<dyn AudioConverter>) -> DownloadPipeline {
    DownloadPipeline::new(None, fetcher, converter)
}

#[tokio::test]
async fn batch_continues_past_a_failed_candidate() {
    let temp = TempDir::new().unwrap();
    let request = ResolutionRequest::new("https://example.com/watch", temp.path());
    let fetcher = Arc::new(FakeFetcher::new(Some("/b.mp4")));
    let operator = ScriptedOperator::new(false, "");

    let report = pipeline(fetcher.clone(), Arc::new(BrokenConverter))
        .run(&request, &scraped(&[A, B, C]), &operator)
        .await
        .unwrap();

    assert_eq!(fetcher.attempted(), [A, B, C]);
    assert_eq!(report.completed, [temp.path().join("a.mp4"), temp.path().join("c.mp4")]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].url, B);
    assert!(report.is_success());
    assert!(operator.notes().iter().any(|n| n.contains(B)));
}

#[tokio::test]
async fn out_of_range_selection_downloads_everything_with_a_warning() {
    let temp = TempDir::new().unwrap();
    let request = ResolutionRequest::new("https://example.com/watch", temp.path());
    let fetcher = Arc::new(FakeFetcher::new(None));
    let operator = ScriptedOperator::new(false, "5");

    let report = pipeline(fetcher.clone(), Arc::new(BrokenConverter))
        .run(&request, &scraped(&[A, B]), &operator)
        .await
        .unwrap();

    assert_eq!(fetcher.attempted(), [A, B]);
    assert_eq!(report.completed.len(), 2);
    assert!(operator.notes().iter().any(|n| n.contains("out of range")));
}

#[tokio::test]
async fn single_selection_fetches_only_that_candidate() {
    let temp = TempDir::new().unwrap();
    let request = ResolutionRequest::new("https://example.com/watch", temp.path());
    let fetcher = Arc::new(FakeFetcher::new(None));
    let operator = ScriptedOperator::new(false, "2");

    let report = pipeline(fetcher.clone(), Arc::new(BrokenConverter))
        .run(&request, &scraped(&[A, B, C]), &operator)
        .await
        .unwrap();

    assert_eq!(fetcher.attempted(), [B]);
    assert_eq!(report.completed, [temp.path().join("b.mp4")]);
}

#[tokio::test]
async fn single_selection_failure_is_fatal() {
    let temp = TempDir::new().unwrap();
    let request = ResolutionRequest::new("https://example.com/watch", temp.path());
    let fetcher = Arc::new(FakeFetcher::new(Some("/a.mp4")));
    let operator = ScriptedOperator::new(false, "1");

    let err = pipeline(fetcher, Arc::new(BrokenConverter))
        .run(&request, &scraped(&[A, B]), &operator)
        .await
        .unwrap_err();
    assert!(matches!(err, MediagrabError::FetchError { .. }));
}

#[tokio::test]
async fn batch_where_everything_fails_is_not_a_success() {
    let temp = TempDir::new().unwrap();
    let request = ResolutionRequest::new("https://example.com/watch", temp.path());
    let fetcher = Arc::new(FakeFetcher::new(Some("cdn.example.com")));
    let operator = ScriptedOperator::new(false, "");

    let report = pipeline(fetcher, Arc::new(BrokenConverter))
        .run(&request, &scraped(&[A, B]), &operator)
        .await
        .unwrap();
    assert_eq!(report.failed.len(), 2);
    assert!(!report.is_success());
}

#[tokio::test]
async fn failed_audio_conversion_keeps_the_download() {
    let temp = TempDir::new().unwrap();
    let request = ResolutionRequest::new("https://example.com/watch", temp.path()).with_kind(MediaKind::Audio);
    let fetcher = Arc::new(FakeFetcher::new(None));
    let operator = ScriptedOperator::new(false, "");

    let report = pipeline(fetcher, Arc::new(BrokenConverter))
        .run(&request, &scraped(&[A]), &operator)
        .await
        .unwrap();

    let kept = temp.path().join("a.mp4");
    assert_eq!(report.completed, [kept.clone()]);
    assert!(kept.exists());
    assert_eq!(report.conversion_failures.len(), 1);
    assert!(operator.notes().iter().any(|n| n.contains("Could not convert")));
}

#[tokio::test]
async fn audio_request_converts_fetched_files() {
    let temp = TempDir::new().unwrap();
    let request = ResolutionRequest::new("https://example.com/watch", temp.path()).with_kind(MediaKind::Audio);
    let fetcher = Arc::new(FakeFetcher::new(None));
    let operator = ScriptedOperator::new(false, "");

    let report = pipeline(fetcher, Arc::new(RenamingConverter))
        .run(&request, &scraped(&[A]), &operator)
        .await
        .unwrap();
    assert_eq!(report.completed, [temp.path().join("a.mp3")]);
    assert!(report.conversion_failures.is_empty());
}

#[tokio::test]
async fn structured_result_is_delegated_without_a_selection_prompt() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("nested").join("out");
    let request = ResolutionRequest::new("https://example.com/watch", &out);
    let extractor = Arc::new(FakeExtractor::succeeding(VideoInfo::default()));
    let structured: Arc<dyn StructuredExtractor> = extractor.clone();
    let fetcher = Arc::new(FakeFetcher::new(None));
    let operator = ScriptedOperator::new(false, "");

    let result = ResolutionResult {
        strategy_used: SourceStrategy::Structured,
        candidates: Vec::new(),
        structured_metadata: Some(VideoInfo {
            title: "Mix".to_string(),
            kind: Some("playlist".to_string()),
            entries: vec![VideoInfo::default(), VideoInfo::default()],
            ..Default::default()
        }),
    };

    let report = DownloadPipeline::new(Some(structured), fetcher.clone(), Arc::new(BrokenConverter))
        .run(&request, &result, &operator)
        .await
        .unwrap();

    assert!(report.delegated);
    assert!(report.is_success());
    assert!(out.is_dir());
    assert_eq!(extractor.downloads(), 1);
    assert!(fetcher.attempted().is_empty());
    assert_eq!(operator.choose_requests.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert!(operator.notes().iter().any(|n| n.contains("2 entries")));
}
