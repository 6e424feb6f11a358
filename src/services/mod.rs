// Service exports
pub mod embedding;
pub mod model;
pub mod retry;
pub mod scoring;
pub mod semantic;
pub mod structured;

pub use embedding::{EmbeddingProvider, HttpEmbeddingClient};
pub use model::{FileModelLoader, LogisticModel, ModelLoader, Prediction, TrainedModel};
pub use retry::RetryPolicy;
pub use scoring::{CandidateScore, ScoringModel};
pub use semantic::{SemanticOptions, SemanticScorer, FALLBACK_REASON};
pub use structured::StructuredScorer;
