// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{AuditorProfile, Availability, BudgetRange, MatchResult, MatchingCriteria, ModelMetrics};
pub use requests::FindMatchesRequest;
pub use responses::{ErrorResponse, FindMatchesResponse, HealthResponse};
