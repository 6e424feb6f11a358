use crate::config::Settings;
use crate::core::{combiner::combine, ranking::rank};
use crate::error::MatchError;
use crate::models::{AuditorProfile, MatchResult, MatchingCriteria, ModelMetrics};
use crate::services::{
    embedding::HttpEmbeddingClient,
    model::FileModelLoader,
    scoring::{CandidateScore, ScoringModel},
    semantic::{SemanticOptions, SemanticScorer, FALLBACK_REASON},
    structured::StructuredScorer,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of a matching engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Uninitialized,
    Initializing,
    Ready,
    /// Initialization failed. Terminal; build a new engine to retry.
    Error,
    Disposed,
}

/// Matching orchestrator - fans candidates out to both scorers, combines
/// and ranks
///
/// # Pipeline Stages
/// 1. Readiness and input checks
/// 2. Semantic scoring over the whole batch, concurrently with
///    structured scoring per candidate
/// 3. Score combination
/// 4. Deterministic ranking
pub struct MatchingEngine {
    structured: Arc<StructuredScorer>,
    semantic: Arc<SemanticScorer>,
    state: RwLock<EngineState>,
    init: OnceCell<Result<ModelMetrics, MatchError>>,
    deadline: Option<Duration>,
}

impl MatchingEngine {
    pub fn new(structured: StructuredScorer, semantic: SemanticScorer) -> Self {
        Self {
            structured: Arc::new(structured),
            semantic: Arc::new(semantic),
            state: RwLock::new(EngineState::Uninitialized),
            init: OnceCell::new(),
            deadline: None,
        }
    }

    /// Apply a deadline to every `find_matches` call
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Build an engine wired to the HTTP embedding provider and the
    /// on-disk model artifact
    pub fn from_settings(settings: &Settings) -> Result<Self, MatchError> {
        let provider = HttpEmbeddingClient::new(&settings.embedding)
            .map_err(|e| MatchError::Initialization(e.to_string()))?;

        let structured = StructuredScorer::new(
            Arc::new(FileModelLoader::new(&settings.structured.artifact_path)),
            settings.matching.max_concurrency,
        );
        let semantic = SemanticScorer::new(
            Arc::new(provider),
            SemanticOptions::from(&settings.embedding),
        );

        Ok(Self::new(structured, semantic).with_deadline(settings.matching.deadline()))
    }

    pub fn state(&self) -> EngineState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Metrics of the loaded structured model, once Ready
    pub fn metrics(&self) -> Option<ModelMetrics> {
        if self.state() != EngineState::Ready {
            return None;
        }
        match self.init.get() {
            Some(Ok(metrics)) => Some(*metrics),
            _ => None,
        }
    }

    /// Bring both scorers to Ready
    ///
    /// Runs at most once per instance. Concurrent callers await the
    /// in-flight initialization and observe its outcome; a failure is
    /// reported to every later caller as well.
    pub async fn initialize(&self) -> Result<ModelMetrics, MatchError> {
        if self.state() == EngineState::Disposed {
            return Err(MatchError::Disposed);
        }

        self.init
            .get_or_init(|| async {
                self.transition(EngineState::Initializing);
                tracing::info!("Initializing matching engine");

                let result = self.initialize_backends().await;

                let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
                if *state == EngineState::Disposed {
                    drop(state);
                    self.release();
                    return Err(MatchError::Disposed);
                }

                match &result {
                    Ok(_) => {
                        *state = EngineState::Ready;
                        tracing::info!("Matching engine ready");
                    }
                    Err(e) => {
                        *state = EngineState::Error;
                        tracing::error!("Matching engine initialization failed: {}", e);
                    }
                }
                result
            })
            .await
            .clone()
    }

    async fn initialize_backends(&self) -> Result<ModelMetrics, MatchError> {
        let backends: [&dyn ScoringModel; 2] = [self.structured.as_ref(), self.semantic.as_ref()];
        futures::future::try_join_all(backends.iter().map(|b| b.initialize())).await?;

        self.structured.metrics().ok_or_else(|| {
            MatchError::Initialization("structured model produced no metrics".into())
        })
    }

    /// Rank `candidates` against `criteria`, best first
    ///
    /// Applies the configured deadline, if any.
    pub async fn find_matches<'a>(
        &self,
        criteria: &MatchingCriteria,
        candidates: &'a [AuditorProfile],
    ) -> Result<Vec<MatchResult<'a>>, MatchError> {
        let cancel = CancellationToken::new();
        let call = self.find_matches_with_cancel(criteria, candidates, &cancel);

        match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, call).await.map_err(|_| {
                MatchError::Cancelled(format!("deadline of {:?} exceeded", deadline))
            })?,
            None => call.await,
        }
    }

    /// Like `find_matches`, aborting in-flight work when `cancel` fires
    pub async fn find_matches_with_cancel<'a>(
        &self,
        criteria: &MatchingCriteria,
        candidates: &'a [AuditorProfile],
        cancel: &CancellationToken,
    ) -> Result<Vec<MatchResult<'a>>, MatchError> {
        let metrics = self.ready_metrics()?;
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let span = tracing::info_span!(
            "find_matches",
            request_id = %Uuid::new_v4(),
            candidates = candidates.len()
        );

        async move {
            validate_inputs(criteria, candidates)?;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(MatchError::Cancelled("cancelled by caller".into())),
                result = self.score_all(criteria, candidates, metrics) => result,
            };

            if let Err(e) = &result {
                tracing::error!(kind = e.kind(), "Matching failed: {}", e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn score_all<'a>(
        &self,
        criteria: &MatchingCriteria,
        candidates: &'a [AuditorProfile],
        metrics: ModelMetrics,
    ) -> Result<Vec<MatchResult<'a>>, MatchError> {
        let (semantic, structured) = tokio::try_join!(
            self.semantic.score(criteria, candidates),
            self.structured.score(criteria, candidates),
        )?;

        if semantic.len() != candidates.len() || structured.len() != candidates.len() {
            return Err(MatchError::FatalBatch(format!(
                "scorers returned {} semantic and {} structured scores for {} candidates",
                semantic.len(),
                structured.len(),
                candidates.len()
            )));
        }

        let degraded_semantic = semantic.iter().filter(|s| s.degraded).count();
        let degraded_structured = structured.iter().filter(|s| s.degraded).count();

        let mut results: Vec<MatchResult<'a>> = candidates
            .iter()
            .zip(structured)
            .zip(semantic)
            .map(|((auditor, structured), semantic)| build_result(auditor, structured, semantic, metrics))
            .collect();

        rank(&mut results);

        tracing::debug!(
            "Ranked {} candidates ({} semantic and {} structured scores degraded)",
            results.len(),
            degraded_semantic,
            degraded_structured
        );

        Ok(results)
    }

    fn ready_metrics(&self) -> Result<ModelMetrics, MatchError> {
        match self.state() {
            EngineState::Disposed => Err(MatchError::Disposed),
            EngineState::Ready => match self.init.get() {
                Some(Ok(metrics)) => Ok(*metrics),
                _ => Err(MatchError::NotInitialized),
            },
            _ => Err(MatchError::NotInitialized),
        }
    }

    /// Release both scorers. Idempotent.
    pub fn dispose(&self) {
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if *state == EngineState::Disposed {
                return;
            }
            *state = EngineState::Disposed;
        }

        self.release();
        tracing::info!("Matching engine disposed");
    }

    fn release(&self) {
        let backends: [&dyn ScoringModel; 2] = [self.structured.as_ref(), self.semantic.as_ref()];
        for backend in backends {
            backend.dispose();
            tracing::debug!("Released {} scorer", backend.name());
        }
    }

    /// Move to `next` unless the engine has been disposed
    fn transition(&self, next: EngineState) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if *state != EngineState::Disposed {
            *state = next;
        }
    }
}

fn build_result<'a>(
    auditor: &'a AuditorProfile,
    structured: CandidateScore,
    semantic: CandidateScore,
    metrics: ModelMetrics,
) -> MatchResult<'a> {
    let combined_score = combine(structured.score, semantic.score);

    let recommendation_reason = semantic
        .reason
        .filter(|r| !r.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_REASON.to_string());

    MatchResult {
        auditor,
        structured_score: crate::core::combiner::sanitize(structured.score),
        semantic_score: crate::core::combiner::sanitize(semantic.score),
        combined_score,
        recommendation_reason,
        feature_importance: structured.feature_importance,
        precision_metrics: metrics,
    }
}

/// Reject malformed criteria and candidate lists before any scoring
fn validate_inputs(
    criteria: &MatchingCriteria,
    candidates: &[AuditorProfile],
) -> Result<(), MatchError> {
    criteria
        .validate()
        .map_err(|e| MatchError::FatalBatch(format!("invalid criteria: {}", e)))?;

    let mut ids = HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        candidate.validate().map_err(|e| {
            MatchError::FatalBatch(format!("invalid auditor profile '{}': {}", candidate.id, e))
        })?;
        if !ids.insert(candidate.id.as_str()) {
            return Err(MatchError::FatalBatch(format!(
                "duplicate auditor id '{}'",
                candidate.id
            )));
        }
    }
    Ok(())
}
