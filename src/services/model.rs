//! Trained structured model artifact and its loaders.
//!
//! The artifact is a logistic model over the named features of
//! [`FeatureVector`], shipped as JSON together with a held-out validation
//! set used to report precision/recall/F1 at load time.

use crate::core::features::{FeatureVector, FEATURE_NAMES};
use crate::error::{ArtifactError, MatchError};
use crate::models::ModelMetrics;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Output of a single structured prediction
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub match_score: f64,
    pub feature_importance: HashMap<String, f64>,
}

/// Opaque trained model consumed at inference time
pub trait TrainedModel: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, MatchError>;

    /// Quality metrics on the model's validation data
    fn evaluate(&self) -> ModelMetrics;
}

/// Source of the trained model artifact
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn TrainedModel>, MatchError>;
}

/// Loads a [`LogisticModel`] from a JSON file
#[derive(Debug, Clone)]
pub struct FileModelLoader {
    path: PathBuf,
}

impl FileModelLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ModelLoader for FileModelLoader {
    async fn load(&self) -> Result<Arc<dyn TrainedModel>, MatchError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ArtifactError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        let model = LogisticModel::from_json(&raw)?;
        tracing::info!(
            "Loaded structured model {} from {}",
            model.version,
            self.path.display()
        );
        Ok(Arc::new(model))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelArtifact {
    version: String,
    bias: f64,
    weights: HashMap<String, f64>,
    #[serde(default = "default_threshold")]
    threshold: f64,
    validation: Vec<ValidationSample>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ValidationSample {
    features: HashMap<String, f64>,
    label: bool,
}

fn default_threshold() -> f64 { 0.5 }

/// Logistic regression over the raw feature vector
#[derive(Debug, Clone)]
pub struct LogisticModel {
    version: String,
    bias: f64,
    weights: [f64; FEATURE_COUNT],
    threshold: f64,
    validation: Vec<([f64; FEATURE_COUNT], bool)>,
}

impl LogisticModel {
    /// Parse and check a JSON artifact
    pub fn from_json(raw: &str) -> Result<Self, ArtifactError> {
        let artifact: ModelArtifact = serde_json::from_str(raw)?;

        if !artifact.bias.is_finite() {
            return Err(ArtifactError::Invalid("bias is not finite".into()));
        }
        if !(0.0..=1.0).contains(&artifact.threshold) {
            return Err(ArtifactError::Invalid(format!(
                "threshold {} outside [0, 1]",
                artifact.threshold
            )));
        }
        if artifact.validation.is_empty() {
            return Err(ArtifactError::Invalid("validation set is empty".into()));
        }

        let weights = to_dense(&artifact.weights)?;
        let validation = artifact
            .validation
            .iter()
            .map(|sample| Ok((to_dense(&sample.features)?, sample.label)))
            .collect::<Result<Vec<_>, ArtifactError>>()?;

        Ok(Self {
            version: artifact.version,
            bias: artifact.bias,
            weights,
            threshold: artifact.threshold,
            validation,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    #[inline]
    fn probability(&self, values: &[f64; FEATURE_COUNT]) -> f64 {
        let logit = self.bias
            + self
                .weights
                .iter()
                .zip(values.iter())
                .map(|(w, x)| w * x)
                .sum::<f64>();
        1.0 / (1.0 + (-logit).exp())
    }
}

impl TrainedModel for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction, MatchError> {
        let named = features.named();
        let mut values = [0.0; FEATURE_COUNT];
        for (i, (name, value)) in named.iter().enumerate() {
            if !value.is_finite() {
                return Err(MatchError::Prediction(format!(
                    "feature '{}' is not finite",
                    name
                )));
            }
            values[i] = *value;
        }

        let feature_importance = named
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, w)| **w != 0.0)
            .map(|((name, value), w)| (name.to_string(), (w * value).abs()))
            .collect();

        Ok(Prediction {
            match_score: self.probability(&values),
            feature_importance,
        })
    }

    fn evaluate(&self) -> ModelMetrics {
        let (mut tp, mut fp, mut fn_) = (0u32, 0u32, 0u32);
        for (values, label) in &self.validation {
            let predicted = self.probability(values) >= self.threshold;
            match (predicted, *label) {
                (true, true) => tp += 1,
                (true, false) => fp += 1,
                (false, true) => fn_ += 1,
                (false, false) => {}
            }
        }

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        ModelMetrics {
            precision,
            recall,
            f1_score,
        }
    }
}

#[inline]
fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Map named values onto `FEATURE_NAMES` order; absent names are 0.0
fn to_dense(named: &HashMap<String, f64>) -> Result<[f64; FEATURE_COUNT], ArtifactError> {
    let mut dense = [0.0; FEATURE_COUNT];
    for (name, value) in named {
        let idx = FEATURE_NAMES
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| ArtifactError::UnknownFeature(name.clone()))?;
        if !value.is_finite() {
            return Err(ArtifactError::Invalid(format!("value for '{}' is not finite", name)));
        }
        dense[idx] = *value;
    }
    Ok(dense)
}
