//! Audit Match - auditor to project matching and ranking engine
//!
//! Fuses a feature-engineered structured model score with a semantic
//! similarity score over free-text descriptions, then ranks candidates
//! deterministically. Per-candidate scoring failures degrade to neutral
//! scores instead of failing the whole ranking.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{combine, extract_features, EngineState, MatchingEngine};
pub use error::{EmbeddingError, MatchError};
pub use models::{AuditorProfile, Availability, BudgetRange, MatchResult, MatchingCriteria, ModelMetrics};
