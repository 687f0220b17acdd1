//! Decisions the core needs from the person running the tool

use crate::extractor::models::MediaCandidate;

/// Answers mid-run questions; the console implementation lives in `cli`
pub trait Operator: Send + Sync {
    /// Asked before the (slow) rendering tier runs; `reason` says why the
    /// cheaper tiers came up short
    fn confirm_rendering(&self, page_url: &str, reason: &str) -> bool;

    /// Shown the candidate list; returns the raw answer (an index, or empty for all)
    fn choose(&self, candidates: &[MediaCandidate]) -> String;

    /// Non-fatal messages the operator should see
    fn notify(&self, message: &str);
}
