use thiserror::Error;

/// Errors surfaced by the matching engine
#[derive(Debug, Clone, Error)]
pub enum MatchError {
    /// Model artifact missing or corrupt, or embedding configuration invalid.
    /// The engine instance is unusable afterwards.
    #[error("initialization failed: {0}")]
    Initialization(String),

    #[error("engine is not initialized")]
    NotInitialized,

    #[error("engine has been disposed")]
    Disposed,

    /// Recoverable per-candidate failure. Degraded locally, never returned
    /// from `find_matches`.
    #[error("transient scoring failure for auditor {auditor_id}: {message}")]
    TransientScoring { auditor_id: String, message: String },

    /// A single structured prediction failed. Converted to the neutral score.
    #[error("prediction failed: {0}")]
    Prediction(String),

    /// The ranking as a whole cannot be produced
    #[error("matching batch failed: {0}")]
    FatalBatch(String),

    #[error("matching cancelled: {0}")]
    Cancelled(String),
}

impl MatchError {
    /// Stable error kind for logs and API bodies
    pub fn kind(&self) -> &'static str {
        match self {
            MatchError::Initialization(_) => "initialization_error",
            MatchError::NotInitialized => "not_initialized",
            MatchError::Disposed => "disposed",
            MatchError::TransientScoring { .. } => "transient_scoring_error",
            MatchError::Prediction(_) => "prediction_error",
            MatchError::FatalBatch(_) => "fatal_batch_error",
            MatchError::Cancelled(_) => "cancelled",
        }
    }
}

/// Errors from the embedding provider
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Timeouts, connection failures, rate limiting, 5xx responses
    #[error("transient embedding failure: {0}")]
    Transient(String),

    /// The provider refused the request; retrying will not help
    #[error("embedding request rejected: {0}")]
    Rejected(String),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("invalid embedding configuration: {0}")]
    Config(String),
}

impl EmbeddingError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EmbeddingError::Transient(_))
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return EmbeddingError::Transient(err.to_string());
        }
        match err.status() {
            Some(status) if status.as_u16() == 429 || status.is_server_error() => {
                EmbeddingError::Transient(err.to_string())
            }
            Some(_) => EmbeddingError::Rejected(err.to_string()),
            None if err.is_decode() => EmbeddingError::InvalidResponse(err.to_string()),
            None => EmbeddingError::Transient(err.to_string()),
        }
    }
}

/// Errors while loading the structured model artifact
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model artifact references unknown feature '{0}'")]
    UnknownFeature(String),

    #[error("model artifact is invalid: {0}")]
    Invalid(String),
}

impl From<ArtifactError> for MatchError {
    fn from(err: ArtifactError) -> Self {
        MatchError::Initialization(err.to_string())
    }
}
