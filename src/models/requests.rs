use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{AuditorProfile, MatchingCriteria};

/// Request to rank a candidate pool for a project
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct FindMatchesRequest {
    #[validate(nested)]
    pub criteria: MatchingCriteria,
    #[validate(nested)]
    #[serde(default)]
    pub candidates: Vec<AuditorProfile>,
    #[validate(range(min = 1))]
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_limit_rejected() {
        let request: FindMatchesRequest = serde_json::from_value(serde_json::json!({
            "criteria": {
                "blockchain": "solana",
                "projectType": "nft",
                "projectDescription": "Marketplace program",
                "budgetRange": { "min": 0.0, "max": 100.0 },
                "complexity": "low",
                "qualityThreshold": 0.5,
                "experiencePreference": "mid"
            },
            "limit": 0
        }))
        .unwrap();

        assert!(request.candidates.is_empty());
        assert!(request.validate().is_err());
    }
}
