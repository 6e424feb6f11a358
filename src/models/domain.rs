use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::{Validate, ValidationError};

/// Project budget bounds in the caller's currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
}

/// Project-side audit request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_criteria"))]
pub struct MatchingCriteria {
    pub blockchain: String,
    #[serde(rename = "projectType")]
    pub project_type: String,
    #[serde(rename = "projectDescription")]
    pub project_description: String,
    #[serde(rename = "budgetRange")]
    pub budget_range: BudgetRange,
    #[serde(default)]
    pub timeline: String,
    pub complexity: String,
    #[serde(rename = "specificRequirements", default)]
    pub specific_requirements: Vec<String>,
    #[serde(rename = "qualityThreshold")]
    pub quality_threshold: f64,
    #[serde(rename = "experiencePreference")]
    pub experience_preference: String,
    #[serde(rename = "auditType", default)]
    pub audit_type: Vec<String>,
}

/// Candidate availability as reported by the profile source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Busy,
    Unavailable,
}

/// Candidate auditor record. Read-only for the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_profile"))]
pub struct AuditorProfile {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(rename = "experienceYears")]
    pub experience_years: u32,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: f64,
    #[validate(range(min = 0.0))]
    #[serde(rename = "hourlyRate")]
    pub hourly_rate: f64,
    pub availability: Availability,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(rename = "pastAudits")]
    pub past_audits: u32,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(rename = "successRate")]
    pub success_rate: f64,
    #[validate(range(min = 0.0))]
    #[serde(rename = "responseTimeAvg")]
    pub response_time_avg: f64,
    #[serde(rename = "blockchainExpertise", default)]
    pub blockchain_expertise: Vec<String>,
}

impl AuditorProfile {
    /// Case-insensitive membership check against the auditor's chains
    pub fn knows_chain(&self, chain: &str) -> bool {
        self.blockchain_expertise
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(chain.trim()))
    }
}

/// Quality metrics of the structured model, computed once per initialization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1Score")]
    pub f1_score: f64,
}

/// Ranked match for one candidate. Borrows the candidate it scores.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult<'a> {
    pub auditor: &'a AuditorProfile,
    #[serde(rename = "structuredScore")]
    pub structured_score: f64,
    #[serde(rename = "semanticScore")]
    pub semantic_score: f64,
    #[serde(rename = "combinedScore")]
    pub combined_score: f64,
    #[serde(rename = "recommendationReason")]
    pub recommendation_reason: String,
    #[serde(rename = "featureImportance")]
    pub feature_importance: HashMap<String, f64>,
    #[serde(rename = "precisionMetrics")]
    pub precision_metrics: ModelMetrics,
}

fn validate_criteria(criteria: &MatchingCriteria) -> Result<(), ValidationError> {
    if criteria.project_description.trim().is_empty() {
        return Err(ValidationError::new("project_description_blank"));
    }
    if !criteria.quality_threshold.is_finite() {
        return Err(ValidationError::new("quality_threshold_not_finite"));
    }

    let budget = criteria.budget_range;
    if !budget.min.is_finite() || !budget.max.is_finite() || budget.min < 0.0 {
        return Err(ValidationError::new("budget_range_invalid"));
    }
    if budget.min > budget.max {
        return Err(ValidationError::new("budget_range_inverted"));
    }
    Ok(())
}

/// Range checks pass NaN through, so every numeric attribute is checked here
fn validate_profile(profile: &AuditorProfile) -> Result<(), ValidationError> {
    let numeric = [
        ("rating", profile.rating),
        ("hourly_rate", profile.hourly_rate),
        ("success_rate", profile.success_rate),
        ("response_time_avg", profile.response_time_avg),
    ];
    for (field, value) in numeric {
        if !value.is_finite() {
            let mut err = ValidationError::new("not_finite");
            err.add_param("field".into(), &field);
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria_json() -> serde_json::Value {
        serde_json::json!({
            "blockchain": "ethereum",
            "projectType": "defi",
            "projectDescription": "Lending protocol with flash loans",
            "budgetRange": { "min": 5000.0, "max": 20000.0 },
            "timeline": "2 weeks",
            "complexity": "high",
            "specificRequirements": ["solidity"],
            "qualityThreshold": 0.8,
            "experiencePreference": "senior",
            "auditType": ["smart-contract"]
        })
    }

    #[test]
    fn test_criteria_deserializes_and_validates() {
        let criteria: MatchingCriteria = serde_json::from_value(criteria_json()).unwrap();
        assert_eq!(criteria.blockchain, "ethereum");
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn test_criteria_rejects_unknown_field() {
        let mut json = criteria_json();
        json["unexpected"] = serde_json::json!(true);
        assert!(serde_json::from_value::<MatchingCriteria>(json).is_err());
    }

    #[test]
    fn test_inverted_budget_fails_validation() {
        let mut json = criteria_json();
        json["budgetRange"] = serde_json::json!({ "min": 100.0, "max": 10.0 });
        let criteria: MatchingCriteria = serde_json::from_value(json).unwrap();
        assert!(criteria.validate().is_err());
    }

    #[test]
    fn test_blank_description_fails_validation() {
        let mut json = criteria_json();
        json["projectDescription"] = serde_json::json!("   ");
        let criteria: MatchingCriteria = serde_json::from_value(json).unwrap();
        assert!(criteria.validate().is_err());
    }

    fn profile() -> AuditorProfile {
        AuditorProfile {
            id: "auditor-1".to_string(),
            description: "Solidity reviewer".to_string(),
            expertise: vec!["Solidity".to_string()],
            experience_years: 4,
            rating: 4.2,
            hourly_rate: 120.0,
            availability: Availability::Available,
            specializations: vec![],
            past_audits: 12,
            success_rate: 0.85,
            response_time_avg: 3.0,
            blockchain_expertise: vec!["ethereum".to_string()],
        }
    }

    #[test]
    fn test_profile_rejects_non_finite_numbers() {
        assert!(profile().validate().is_ok());

        let mut nan_rating = profile();
        nan_rating.rating = f64::NAN;
        assert!(nan_rating.validate().is_err());

        let mut nan_success = profile();
        nan_success.success_rate = f64::NAN;
        assert!(nan_success.validate().is_err());

        let mut infinite_rate = profile();
        infinite_rate.hourly_rate = f64::INFINITY;
        assert!(infinite_rate.validate().is_err());

        let mut infinite_response = profile();
        infinite_response.response_time_avg = f64::INFINITY;
        assert!(infinite_response.validate().is_err());
    }

    #[test]
    fn test_availability_lowercase() {
        let a: Availability = serde_json::from_str("\"busy\"").unwrap();
        assert_eq!(a, Availability::Busy);
        assert!(serde_json::from_str::<Availability>("\"asleep\"").is_err());
    }
}
