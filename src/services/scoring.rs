use crate::error::MatchError;
use crate::models::{AuditorProfile, MatchingCriteria};
use async_trait::async_trait;
use std::collections::HashMap;

/// Sub-score for one candidate from one scoring backend
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub auditor_id: String,
    /// In [0, 1]; 0.0 when `degraded`
    pub score: f64,
    pub reason: Option<String>,
    pub feature_importance: HashMap<String, f64>,
    /// The backend could not score this candidate and substituted its
    /// neutral fallback
    pub degraded: bool,
}

/// Common lifecycle and scoring surface of the structured and semantic
/// backends
#[async_trait]
pub trait ScoringModel: Send + Sync {
    fn name(&self) -> &'static str;

    /// Acquire whatever the backend needs to score. Called at most once.
    async fn initialize(&self) -> Result<(), MatchError>;

    /// Score every candidate. The result is index-aligned with `candidates`.
    ///
    /// Per-candidate failures are absorbed into degraded scores; an `Err`
    /// means the whole batch is unusable.
    async fn score(
        &self,
        criteria: &MatchingCriteria,
        candidates: &[AuditorProfile],
    ) -> Result<Vec<CandidateScore>, MatchError>;

    /// Release held resources. Safe to call repeatedly.
    fn dispose(&self);
}
