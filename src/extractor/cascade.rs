//! The resolution cascade
//!
//! Holds an ordered list of tiers and walks it until one produces something
//! usable. Tiers are never reordered; a tier whose capability is missing is
//! skipped and reported rather than attempted.

use crate::extractor::models::{ResolutionRequest, ResolutionResult};
use crate::extractor::render::RenderingTier;
use crate::extractor::static_scraper::StaticScraper;
use crate::extractor::traits::Strategy;
use crate::extractor::ytdlp::StructuredTier;
use crate::operator::Operator;
use crate::utils::error::{CascadeFailure, MediagrabError, TierFailure};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ResolutionCascade {
    tiers: Vec<Arc<dyn Strategy>>,
}

impl ResolutionCascade {
    /// Create a cascade over `tiers`, tried in the given order
    pub fn new(tiers: Vec<Arc<dyn Strategy>>) -> Self {
        Self { tiers }
    }

    /// Standard ordering: structured, then static scrape, then (optionally) rendering
    pub fn standard(
        structured: StructuredTier,
        scraper: StaticScraper,
        rendering: Option<RenderingTier>,
    ) -> Self {
        let mut tiers: Vec<Arc<dyn Strategy>> = vec![Arc::new(structured), Arc::new(scraper)];
        if let Some(rendering) = rendering {
            tiers.push(Arc::new(rendering));
        }
        Self::new(tiers)
    }

    pub fn tiers(&self) -> impl Iterator<Item = &Arc<dyn Strategy>> {
        self.tiers.iter()
    }

    /// Resolve the request's target into a result from the first tier that succeeds.
    ///
    /// Fails with `CascadeExhausted` when every tier failed, came up empty,
    /// was unavailable, or was declined.
    pub async fn resolve(
        &self,
        request: &ResolutionRequest,
        operator: &dyn Operator,
    ) -> Result<ResolutionResult, MediagrabError> {
        let mut failures = Vec::new();

        for strategy in &self.tiers {
            let tier = strategy.tier();

            if let Err(reason) = strategy.availability() {
                warn!("Skipping {} tier: {}", tier, reason);
                failures.push(TierFailure { tier, error: reason });
                continue;
            }

            let reason = failures
                .last()
                .map(|f: &TierFailure| f.error.to_string())
                .unwrap_or_default();
            if strategy.needs_consent() && !operator.confirm_rendering(&request.target_url, &reason) {
                info!("Operator declined the {} tier", tier);
                failures.push(TierFailure {
                    tier,
                    error: MediagrabError::RenderingDeclined,
                });
                continue;
            }

            debug!("Attempting {} tier for {}", tier, request.target_url);
            match strategy.attempt(request).await {
                Ok(outcome) if outcome.is_usable() => {
                    info!(
                        "{} tier succeeded with {} candidate(s)",
                        tier,
                        outcome.candidates.len()
                    );
                    return Ok(ResolutionResult {
                        strategy_used: tier,
                        candidates: outcome.candidates,
                        structured_metadata: outcome.metadata,
                    });
                }
                Ok(_) => {
                    info!("{} tier found no media", tier);
                    failures.push(TierFailure {
                        tier,
                        error: MediagrabError::NoMedia(request.target_url.clone()),
                    });
                }
                Err(error) => {
                    warn!("{} tier failed: {}", tier, error);
                    failures.push(TierFailure { tier, error });
                }
            }
        }

        Err(MediagrabError::CascadeExhausted(CascadeFailure {
            target_url: request.target_url.clone(),
            failures,
        }))
    }
}
