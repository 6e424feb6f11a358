use crate::config::EmbeddingSettings;
use crate::error::{EmbeddingError, MatchError};
use crate::models::{AuditorProfile, MatchingCriteria};
use crate::services::embedding::EmbeddingProvider;
use crate::services::retry::RetryPolicy;
use crate::services::scoring::{CandidateScore, ScoringModel};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Reason attached to candidates whose semantic score fell back to neutral
pub const FALLBACK_REASON: &str = "Standard matching algorithm applied";

/// Below this similarity the rationale reports limited overlap
pub const LOW_SIMILARITY: f64 = 0.3;
/// At or above this similarity the alignment is reported as strong
pub const STRONG_SIMILARITY: f64 = 0.75;

const MAX_REASON_TERMS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "about", "also", "been", "being", "both", "from", "have", "into", "just", "more", "most",
    "much", "need", "needs", "only", "other", "over", "some", "such", "than", "that", "their",
    "them", "then", "there", "these", "they", "this", "those", "very", "want", "were", "what",
    "when", "where", "which", "will", "with", "within", "would", "your",
];

#[derive(Debug, Clone, Copy)]
pub struct SemanticOptions {
    /// Candidate descriptions per embedding request
    pub batch_size: usize,
    /// Embedding requests in flight at once
    pub max_concurrent_requests: usize,
    pub retry: RetryPolicy,
}

impl Default for SemanticOptions {
    fn default() -> Self {
        Self {
            batch_size: 16,
            max_concurrent_requests: 4,
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&EmbeddingSettings> for SemanticOptions {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
            max_concurrent_requests: settings.max_concurrent_requests.max(1),
            retry: settings.retry.into(),
        }
    }
}

/// Scores free-text similarity between the project and each candidate
pub struct SemanticScorer {
    provider: Arc<dyn EmbeddingProvider>,
    options: SemanticOptions,
    ready: AtomicBool,
}

impl SemanticScorer {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, options: SemanticOptions) -> Self {
        Self {
            provider,
            options: SemanticOptions {
                batch_size: options.batch_size.max(1),
                max_concurrent_requests: options.max_concurrent_requests.max(1),
                ..options
            },
            ready: AtomicBool::new(false),
        }
    }

    /// Score every candidate description against the project description
    ///
    /// Embeddings are cached for the duration of this call only. Failing to
    /// embed the project description fails the batch; failing to embed a
    /// candidate degrades that candidate to the neutral fallback.
    pub async fn score_batch(
        &self,
        project_description: &str,
        candidates: &[AuditorProfile],
    ) -> Result<Vec<CandidateScore>, MatchError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(MatchError::NotInitialized);
        }
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let project_text = project_description.trim();
        let project_vector = self
            .options
            .retry
            .run("project embedding", || self.embed_one(project_text))
            .await
            .map_err(|e| {
                MatchError::FatalBatch(format!("failed to embed project description: {}", e))
            })?;

        let mut cache: HashMap<&str, Result<Vec<f32>, EmbeddingError>> = HashMap::new();
        cache.insert(project_text, Ok(project_vector));

        let mut seen = HashSet::new();
        let pending: Vec<&str> = candidates
            .iter()
            .map(|c| c.description.trim())
            .filter(|text| !text.is_empty() && !cache.contains_key(text) && seen.insert(*text))
            .collect();

        tracing::debug!(
            "Embedding {} unique descriptions for {} candidates",
            pending.len(),
            candidates.len()
        );

        let chunk_futures: Vec<_> = pending
            .chunks(self.options.batch_size)
            .map(|chunk| self.embed_chunk(chunk))
            .collect();
        let resolved: Vec<_> = stream::iter(chunk_futures)
            .buffer_unordered(self.options.max_concurrent_requests)
            .collect()
            .await;

        for (text, result) in resolved.into_iter().flatten() {
            cache.insert(text, result);
        }

        let project_terms: HashSet<String> = salient_terms(project_text).into_iter().collect();
        let Some(Ok(project_vector)) = cache.get(project_text) else {
            return Err(MatchError::FatalBatch("project embedding missing from cache".into()));
        };

        let scores = candidates
            .iter()
            .map(|auditor| {
                let text = auditor.description.trim();
                if text.is_empty() {
                    return fallback(auditor);
                }

                match cache.get(text) {
                    Some(Ok(vector)) => {
                        let similarity = normalize_similarity(cosine_similarity(project_vector, vector));
                        CandidateScore {
                            auditor_id: auditor.id.clone(),
                            score: similarity,
                            reason: Some(explain(similarity, &project_terms, text)),
                            feature_importance: HashMap::new(),
                            degraded: false,
                        }
                    }
                    Some(Err(err)) => {
                        let err = MatchError::TransientScoring {
                            auditor_id: auditor.id.clone(),
                            message: err.to_string(),
                        };
                        tracing::warn!("Semantic scoring degraded to neutral: {}", err);
                        fallback(auditor)
                    }
                    None => fallback(auditor),
                }
            })
            .collect();

        Ok(scores)
    }

    /// Embed a chunk with retries, then isolate failures
    ///
    /// When the chunk exhausts its retries on transient errors, or the
    /// provider returns the wrong number of vectors, each text gets one
    /// more individual attempt so only the failing ones degrade. A
    /// non-transient error degrades the whole chunk without further
    /// requests. No text is sent more than `max_attempts + 1` times.
    async fn embed_chunk<'t>(
        &self,
        chunk: &[&'t str],
    ) -> Vec<(&'t str, Result<Vec<f32>, EmbeddingError>)> {
        let texts: Vec<String> = chunk.iter().map(|t| t.to_string()).collect();

        let err = match self
            .options
            .retry
            .run("candidate embedding batch", || self.provider.embed(&texts))
            .await
        {
            Ok(vectors) if vectors.len() == chunk.len() => {
                return chunk.iter().copied().zip(vectors.into_iter().map(Ok)).collect();
            }
            Ok(vectors) => EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                chunk.len(),
                vectors.len()
            )),
            Err(err) => err,
        };

        let isolate = chunk.len() > 1
            && (err.is_transient() || matches!(err, EmbeddingError::InvalidResponse(_)));
        if !isolate {
            return chunk.iter().map(|t| (*t, Err(err.clone()))).collect();
        }

        tracing::debug!(
            "Embedding batch of {} failed ({}), retrying individually",
            chunk.len(),
            err
        );
        let mut out = Vec::with_capacity(chunk.len());
        for text in chunk {
            out.push((*text, self.embed_one(text).await));
        }
        out
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.provider.embed(&[text.to_string()]).await?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(EmbeddingError::InvalidResponse(
                "expected exactly one embedding".into(),
            )),
        }
    }
}

#[async_trait]
impl ScoringModel for SemanticScorer {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn initialize(&self) -> Result<(), MatchError> {
        self.provider
            .validate()
            .map_err(|e| MatchError::Initialization(format!("embedding provider: {}", e)))?;

        self.ready.store(true, Ordering::Release);
        tracing::info!(
            "Semantic scorer ready (batch size: {}, max concurrent requests: {})",
            self.options.batch_size,
            self.options.max_concurrent_requests
        );
        Ok(())
    }

    async fn score(
        &self,
        criteria: &MatchingCriteria,
        candidates: &[AuditorProfile],
    ) -> Result<Vec<CandidateScore>, MatchError> {
        self.score_batch(&criteria.project_description, candidates)
            .await
    }

    fn dispose(&self) {
        self.ready.store(false, Ordering::Release);
    }
}

fn fallback(auditor: &AuditorProfile) -> CandidateScore {
    CandidateScore {
        auditor_id: auditor.id.clone(),
        score: 0.0,
        reason: Some(FALLBACK_REASON.to_string()),
        feature_importance: HashMap::new(),
        degraded: true,
    }
}

/// Cosine similarity in [-1, 1]; 0.0 for empty, zero or mismatched vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Map cosine similarity onto [0, 1]. Negative correlation counts as none.
#[inline]
pub fn normalize_similarity(cosine: f64) -> f64 {
    if cosine.is_finite() {
        cosine.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Lower-cased words of four or more characters, stop words removed,
/// first occurrence order
pub fn salient_terms(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() >= 4 && !STOP_WORDS.contains(&w.as_str()))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Short rationale for a semantic score
pub fn explain(similarity: f64, project_terms: &HashSet<String>, candidate_description: &str) -> String {
    if similarity < LOW_SIMILARITY {
        return "Limited semantic overlap with the project scope".to_string();
    }

    let strength = if similarity >= STRONG_SIMILARITY { "Strong" } else { "Moderate" };
    let shared: Vec<String> = salient_terms(candidate_description)
        .into_iter()
        .filter(|t| project_terms.contains(t))
        .take(MAX_REASON_TERMS)
        .collect();

    if shared.is_empty() {
        format!("{} semantic alignment with the project scope", strength)
    } else {
        format!("{} alignment on {}", strength, shared.join(", "))
    }
}
