// Core algorithm exports
pub mod combiner;
pub mod features;
pub mod matcher;
pub mod ranking;

pub use combiner::combine;
pub use features::{extract_features, AuditorFeatures, FeatureVector, ProjectFeatures};
pub use matcher::{EngineState, MatchingEngine};
pub use ranking::rank;
