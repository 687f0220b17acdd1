//! Tier ordering, gating and failure aggregation of the resolution cascade.

mod common;

use common::{spawn_server, FakeExtractor, FakeRenderer, ScriptedOperator};
use mediagrab::extractor::render::INSTALL_GUIDANCE;
use mediagrab::extractor::{
    RenderingTier, ResolutionCascade, ResolutionRequest, SourceStrategy, StaticScraper, StructuredTier,
    VideoInfo,
};
use mediagrab::utils::{AppSettings, CascadeFailure, MediagrabError};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn scraper() -> StaticScraper {
    StaticScraper::new(&AppSettings::default()).expect("client")
}

fn request(url: String) -> ResolutionRequest {
    ResolutionRequest::new(url, "/tmp/unused")
}

fn exhausted(err: MediagrabError) -> CascadeFailure {
    match err {
        MediagrabError::CascadeExhausted(failure) => failure,
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

fn cascade(structured: StructuredTier, rendering: RenderingTier) -> ResolutionCascade {
    ResolutionCascade::standard(structured, scraper(), Some(rendering))
}

#[tokio::test]
async fn structured_success_short_circuits() {
    let base = spawn_server().await;
    let renderer = Arc::new(FakeRenderer::new(&["https://cdn/never.mp4"]));
    let info = VideoInfo {
        title: "A talk".to_string(),
        url: Some("https://cdn.example.com/talk.mp4".to_string()),
        ..Default::default()
    };

    let cascade = cascade(
        StructuredTier::new(Arc::new(FakeExtractor::succeeding(info))),
        RenderingTier::new(renderer.clone(), 1_000),
    );
    let operator = ScriptedOperator::new(true, "");

    let result = cascade.resolve(&request(format!("{}/watch", base)), &operator).await.unwrap();
    assert_eq!(result.strategy_used, SourceStrategy::Structured);
    assert_eq!(result.structured_metadata.unwrap().title, "A talk");
    assert_eq!(result.candidates[0].url, "https://cdn.example.com/talk.mp4");
    assert_eq!(renderer.calls(), 0);
    assert_eq!(operator.consent_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn static_success_never_invokes_rendering() {
    let base = spawn_server().await;
    let renderer = Arc::new(FakeRenderer::new(&["https://cdn/never.mp4"]));
    let cascade = cascade(
        StructuredTier::new(Arc::new(FakeExtractor::failing("Unsupported URL"))),
        RenderingTier::new(renderer.clone(), 1_000),
    );
    let operator = ScriptedOperator::new(true, "");

    let result = cascade.resolve(&request(format!("{}/watch", base)), &operator).await.unwrap();
    assert_eq!(result.strategy_used, SourceStrategy::StaticScrape);
    assert_eq!(result.candidates.len(), 3);
    assert!(result.structured_metadata.is_none());
    assert_eq!(renderer.calls(), 0);
    assert_eq!(operator.consent_requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rendering_runs_after_consent_when_static_is_empty() {
    let base = spawn_server().await;
    let renderer = Arc::new(FakeRenderer::new(&["https://cdn/live.m3u8"]));
    let cascade = cascade(StructuredTier::missing(), RenderingTier::new(renderer.clone(), 1_000));
    let operator = ScriptedOperator::new(true, "");

    let result = cascade.resolve(&request(format!("{}/plain", base)), &operator).await.unwrap();
    assert_eq!(result.strategy_used, SourceStrategy::Rendered);
    assert_eq!(result.candidates[0].url, "https://cdn/live.m3u8");
    assert_eq!(result.candidates[0].source_strategy, SourceStrategy::Rendered);
    assert_eq!(renderer.calls(), 1);
    assert_eq!(operator.consent_requests.load(Ordering::SeqCst), 1);
    assert!(operator.consent_reasons.lock().unwrap()[0].starts_with("No media found"));
}

#[tokio::test]
async fn declined_rendering_ends_in_exhaustion() {
    let base = spawn_server().await;
    let renderer = Arc::new(FakeRenderer::new(&["https://cdn/live.m3u8"]));
    let cascade = cascade(StructuredTier::missing(), RenderingTier::new(renderer.clone(), 1_000));
    let operator = ScriptedOperator::new(false, "");

    let err = cascade
        .resolve(&request(format!("{}/plain", base)), &operator)
        .await
        .unwrap_err();
    let failure = exhausted(err);
    assert_eq!(renderer.calls(), 0);
    let last = failure.failures.last().unwrap();
    assert_eq!(last.tier, SourceStrategy::Rendered);
    assert!(matches!(last.error, MediagrabError::RenderingDeclined));
}

#[tokio::test]
async fn unavailable_rendering_is_skipped_and_named() {
    let base = spawn_server().await;
    let cascade = cascade(StructuredTier::missing(), RenderingTier::unavailable(INSTALL_GUIDANCE));
    let operator = ScriptedOperator::new(true, "");

    let err = cascade
        .resolve(&request(format!("{}/plain", base)), &operator)
        .await
        .unwrap_err();
    let failure = exhausted(err);
    assert_eq!(operator.consent_requests.load(Ordering::SeqCst), 0);
    assert_eq!(failure.install_guidance(), Some(INSTALL_GUIDANCE));
    assert!(failure.to_string().contains("Headless browser not available"));
}

#[tokio::test]
async fn exhaustion_reports_every_tier_and_the_structured_cause() {
    let base = spawn_server().await;
    let cascade = cascade(
        StructuredTier::new(Arc::new(FakeExtractor::failing("ERROR: Unsupported URL"))),
        RenderingTier::new(Arc::new(FakeRenderer::new(&[])), 1_000),
    );
    let operator = ScriptedOperator::new(true, "");

    let err = cascade
        .resolve(&request(format!("{}/missing", base)), &operator)
        .await
        .unwrap_err();
    let failure = exhausted(err);

    let tiers: Vec<_> = failure.failures.iter().map(|f| f.tier).collect();
    assert_eq!(
        tiers,
        [SourceStrategy::Structured, SourceStrategy::StaticScrape, SourceStrategy::Rendered]
    );
    assert!(failure
        .structured_cause()
        .unwrap()
        .to_string()
        .contains("ERROR: Unsupported URL"));
    assert_eq!(failure.failures[1].error.status(), Some(reqwest::StatusCode::NOT_FOUND));
    assert!(matches!(failure.failures[2].error, MediagrabError::NoMedia(_)));
    assert_eq!(operator.consent_requests.load(Ordering::SeqCst), 1);
    assert!(operator.consent_reasons.lock().unwrap()[0].contains("404"));

    let report = failure.to_string();
    assert!(report.contains("[structured]"));
    assert!(report.contains("[static-scrape]"));
    assert!(report.contains("[rendered]"));
}

#[tokio::test]
async fn missing_ytdlp_falls_through_to_static_scrape() {
    let base = spawn_server().await;
    let cascade = ResolutionCascade::standard(StructuredTier::missing(), scraper(), None);
    let operator = ScriptedOperator::new(false, "");

    let result = cascade.resolve(&request(format!("{}/watch", base)), &operator).await.unwrap();
    assert_eq!(result.strategy_used, SourceStrategy::StaticScrape);
}
