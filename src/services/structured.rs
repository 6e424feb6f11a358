use crate::core::features::{extract_features, FeatureVector};
use crate::error::MatchError;
use crate::models::{AuditorProfile, MatchingCriteria, ModelMetrics};
use crate::services::model::{ModelLoader, Prediction, TrainedModel};
use crate::services::scoring::{CandidateScore, ScoringModel};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

struct LoadedModel {
    model: Arc<dyn TrainedModel>,
    metrics: ModelMetrics,
}

/// Feature-engineered scorer backed by a trained model
///
/// Predictions run on the blocking pool, at most `max_concurrency` at a time.
pub struct StructuredScorer {
    loader: Arc<dyn ModelLoader>,
    max_concurrency: usize,
    loaded: RwLock<Option<LoadedModel>>,
}

impl StructuredScorer {
    pub fn new(loader: Arc<dyn ModelLoader>, max_concurrency: usize) -> Self {
        Self {
            loader,
            max_concurrency: max_concurrency.max(1),
            loaded: RwLock::new(None),
        }
    }

    /// Metrics computed when the model was loaded
    pub fn metrics(&self) -> Option<ModelMetrics> {
        self.read().as_ref().map(|l| l.metrics)
    }

    /// Score a single feature vector
    pub fn predict(&self, features: &FeatureVector) -> Result<Prediction, MatchError> {
        self.model()?.predict(features)
    }

    fn model(&self) -> Result<Arc<dyn TrainedModel>, MatchError> {
        self.read()
            .as_ref()
            .map(|l| Arc::clone(&l.model))
            .ok_or(MatchError::NotInitialized)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Option<LoadedModel>> {
        self.loaded.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ScoringModel for StructuredScorer {
    fn name(&self) -> &'static str {
        "structured"
    }

    async fn initialize(&self) -> Result<(), MatchError> {
        let model = self.loader.load().await?;
        let metrics = model.evaluate();

        tracing::info!(
            "Structured model ready (precision: {:.3}, recall: {:.3}, f1: {:.3})",
            metrics.precision,
            metrics.recall,
            metrics.f1_score
        );

        *self.loaded.write().unwrap_or_else(PoisonError::into_inner) =
            Some(LoadedModel { model, metrics });
        Ok(())
    }

    async fn score(
        &self,
        criteria: &MatchingCriteria,
        candidates: &[AuditorProfile],
    ) -> Result<Vec<CandidateScore>, MatchError> {
        let model = self.model()?;

        let features: Vec<_> = candidates
            .iter()
            .map(|auditor| extract_features(criteria, auditor))
            .collect();
        let predictions: Vec<_> = stream::iter(features)
            .map(move |features| {
                let model = Arc::clone(&model);
                tokio::task::spawn_blocking(move || model.predict(&features))
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let scores = candidates
            .iter()
            .zip(predictions)
            .map(|(auditor, joined)| {
                let outcome = joined
                    .map_err(|e| MatchError::Prediction(format!("prediction task failed: {}", e)))
                    .and_then(|result| result);

                match outcome {
                    Ok(prediction) => CandidateScore {
                        auditor_id: auditor.id.clone(),
                        score: prediction.match_score,
                        reason: None,
                        feature_importance: prediction.feature_importance,
                        degraded: false,
                    },
                    Err(err) => {
                        tracing::warn!(
                            "Structured scoring failed for auditor {}, using neutral score: {}",
                            auditor.id,
                            err
                        );
                        CandidateScore {
                            auditor_id: auditor.id.clone(),
                            score: 0.0,
                            reason: None,
                            feature_importance: HashMap::new(),
                            degraded: true,
                        }
                    }
                }
            })
            .collect();

        Ok(scores)
    }

    fn dispose(&self) {
        if self
            .loaded
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            tracing::debug!("Structured model released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, BudgetRange};
    use crate::services::model::LogisticModel;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const ARTIFACT: &str = r#"{
        "version": "test",
        "bias": -2.0,
        "weights": { "blockchain_expertise_score": 3.0 },
        "validation": [ { "features": { "blockchain_expertise_score": 1.0 }, "label": true } ]
    }"#;

    struct StaticLoader;

    #[async_trait]
    impl ModelLoader for StaticLoader {
        async fn load(&self) -> Result<Arc<dyn TrainedModel>, MatchError> {
            Ok(Arc::new(LogisticModel::from_json(ARTIFACT)?))
        }
    }

    fn criteria() -> MatchingCriteria {
        MatchingCriteria {
            blockchain: "ethereum".to_string(),
            project_type: "dex".to_string(),
            project_description: "AMM audit".to_string(),
            budget_range: BudgetRange { min: 0.0, max: 1.0 },
            timeline: String::new(),
            complexity: "low".to_string(),
            specific_requirements: vec![],
            quality_threshold: 0.5,
            experience_preference: "mid".to_string(),
            audit_type: vec![],
        }
    }

    fn auditor(id: &str, chains: &[&str], hourly_rate: f64) -> AuditorProfile {
        AuditorProfile {
            id: id.to_string(),
            description: String::new(),
            expertise: vec![],
            experience_years: 2,
            rating: 4.0,
            hourly_rate,
            availability: Availability::Available,
            specializations: vec![],
            past_audits: 3,
            success_rate: 0.7,
            response_time_avg: 2.0,
            blockchain_expertise: chains.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_predict_before_initialize_fails() {
        let scorer = StructuredScorer::new(Arc::new(StaticLoader), 2);
        let fv = extract_features(&criteria(), &auditor("a", &[], 10.0));
        assert!(matches!(scorer.predict(&fv), Err(MatchError::NotInitialized)));
        assert!(scorer.metrics().is_none());
    }

    #[tokio::test]
    async fn test_score_keeps_candidate_order() {
        let scorer = StructuredScorer::new(Arc::new(StaticLoader), 2);
        scorer.initialize().await.unwrap();

        let candidates = vec![
            auditor("a", &["solana"], 10.0),
            auditor("b", &["ethereum"], 10.0),
            auditor("c", &["ethereum"], 10.0),
        ];
        let scores = scorer.score(&criteria(), &candidates).await.unwrap();

        let ids: Vec<&str> = scores.iter().map(|s| s.auditor_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert!(scores[1].score > scores[0].score);
        assert!(scores.iter().all(|s| !s.degraded));
    }

    #[tokio::test]
    async fn test_failed_prediction_degrades_to_neutral() {
        let scorer = StructuredScorer::new(Arc::new(StaticLoader), 2);
        scorer.initialize().await.unwrap();

        let candidates = vec![auditor("bad", &["ethereum"], f64::NAN)];
        let scores = scorer.score(&criteria(), &candidates).await.unwrap();

        assert_eq!(scores[0].score, 0.0);
        assert!(scores[0].feature_importance.is_empty());
        assert!(scores[0].degraded);
    }

    /// Sleeps on every prediction and records how many run at once
    #[derive(Default)]
    struct SlowModel {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl TrainedModel for SlowModel {
        fn predict(&self, _features: &FeatureVector) -> Result<Prediction, MatchError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(10));
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Prediction {
                match_score: 0.5,
                feature_importance: HashMap::new(),
            })
        }

        fn evaluate(&self) -> ModelMetrics {
            ModelMetrics {
                precision: 1.0,
                recall: 1.0,
                f1_score: 1.0,
            }
        }
    }

    struct SlowLoader(Arc<SlowModel>);

    #[async_trait]
    impl ModelLoader for SlowLoader {
        async fn load(&self) -> Result<Arc<dyn TrainedModel>, MatchError> {
            let model: Arc<dyn TrainedModel> = self.0.clone();
            Ok(model)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_predictions_respect_concurrency_limit() {
        let model = Arc::new(SlowModel::default());
        let scorer = StructuredScorer::new(Arc::new(SlowLoader(Arc::clone(&model))), 3);
        scorer.initialize().await.unwrap();

        let candidates: Vec<AuditorProfile> = (0..12)
            .map(|i| auditor(&format!("a{}", i), &["ethereum"], 10.0))
            .collect();
        let scores = scorer.score(&criteria(), &candidates).await.unwrap();

        assert_eq!(scores.len(), 12);
        assert!(scores.iter().all(|s| !s.degraded));
        let peak = model.peak.load(Ordering::SeqCst);
        assert!(peak >= 1 && peak <= 3, "peak concurrent predictions: {}", peak);
    }

    #[tokio::test]
    async fn test_dispose_releases_model() {
        let scorer = StructuredScorer::new(Arc::new(StaticLoader), 1);
        scorer.initialize().await.unwrap();
        assert!(scorer.metrics().is_some());

        scorer.dispose();
        scorer.dispose();
        assert!(scorer.metrics().is_none());
    }
}
