use crate::models::{AuditorProfile, Availability, MatchingCriteria};
use serde::Serialize;

/// Names of every feature the structured model can weight, in vector order
pub const FEATURE_NAMES: [&str; 13] = [
    "experience_years",
    "rating",
    "hourly_rate",
    "past_audits",
    "success_rate",
    "response_time_avg",
    "availability_score",
    "blockchain_expertise_score",
    "skill_match_score",
    "complexity_score",
    "timeline_urgency",
    "blockchain_type_score",
    "experience_preference_score",
];

/// Candidate-side features. Raw attributes pass through unscaled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AuditorFeatures {
    pub experience_years: f64,
    pub rating: f64,
    pub hourly_rate: f64,
    pub past_audits: f64,
    pub success_rate: f64,
    pub response_time_avg: f64,
    pub availability_score: f64,
    pub blockchain_expertise_score: f64,
    pub skill_match_score: f64,
}

/// Project-side features derived from the criteria alone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectFeatures {
    pub complexity_score: f64,
    pub timeline_urgency: f64,
    pub blockchain_type_score: f64,
    pub experience_preference_score: f64,
}

/// Features of one criteria/candidate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector {
    pub auditor: AuditorFeatures,
    pub project: ProjectFeatures,
}

impl FeatureVector {
    /// Feature values paired with their names, in `FEATURE_NAMES` order
    pub fn named(&self) -> [(&'static str, f64); 13] {
        let a = &self.auditor;
        let p = &self.project;
        [
            (FEATURE_NAMES[0], a.experience_years),
            (FEATURE_NAMES[1], a.rating),
            (FEATURE_NAMES[2], a.hourly_rate),
            (FEATURE_NAMES[3], a.past_audits),
            (FEATURE_NAMES[4], a.success_rate),
            (FEATURE_NAMES[5], a.response_time_avg),
            (FEATURE_NAMES[6], a.availability_score),
            (FEATURE_NAMES[7], a.blockchain_expertise_score),
            (FEATURE_NAMES[8], a.skill_match_score),
            (FEATURE_NAMES[9], p.complexity_score),
            (FEATURE_NAMES[10], p.timeline_urgency),
            (FEATURE_NAMES[11], p.blockchain_type_score),
            (FEATURE_NAMES[12], p.experience_preference_score),
        ]
    }
}

/// Extract the feature vector for a criteria/candidate pair
///
/// Pure and total: every input produces a vector, unknown enum-like
/// strings fall back to neutral defaults.
pub fn extract_features(criteria: &MatchingCriteria, auditor: &AuditorProfile) -> FeatureVector {
    FeatureVector {
        auditor: extract_auditor_features(criteria, auditor),
        project: extract_project_features(criteria),
    }
}

pub fn extract_auditor_features(
    criteria: &MatchingCriteria,
    auditor: &AuditorProfile,
) -> AuditorFeatures {
    AuditorFeatures {
        experience_years: auditor.experience_years as f64,
        rating: auditor.rating,
        hourly_rate: auditor.hourly_rate,
        past_audits: auditor.past_audits as f64,
        success_rate: auditor.success_rate,
        response_time_avg: auditor.response_time_avg,
        availability_score: availability_score(auditor.availability),
        blockchain_expertise_score: blockchain_expertise_score(&criteria.blockchain, auditor),
        skill_match_score: skill_match_score(&criteria.specific_requirements, &auditor.expertise),
    }
}

pub fn extract_project_features(criteria: &MatchingCriteria) -> ProjectFeatures {
    ProjectFeatures {
        complexity_score: complexity_score(&criteria.complexity),
        timeline_urgency: timeline_urgency(&criteria.timeline),
        blockchain_type_score: blockchain_type_score(&criteria.blockchain),
        experience_preference_score: experience_preference_score(&criteria.experience_preference),
    }
}

/// 1.0 for a direct chain match, 0.3 partial credit otherwise
#[inline]
pub fn blockchain_expertise_score(blockchain: &str, auditor: &AuditorProfile) -> f64 {
    if auditor.knows_chain(blockchain) {
        1.0
    } else {
        0.3
    }
}

/// Fraction of requirements covered by at least one expertise term
///
/// A requirement is covered when it appears, case-insensitively, inside an
/// expertise term: "DeFi" covers "defi" and "solidity auditing" covers
/// "solidity". Short terms never cover longer requirements ("Go" does not
/// cover "governance").
pub fn skill_match_score(requirements: &[String], expertise: &[String]) -> f64 {
    let expertise: Vec<String> = expertise
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    let matched = requirements
        .iter()
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .filter(|r| expertise.iter().any(|e| e.contains(r.as_str())))
        .count();

    matched as f64 / requirements.len().max(1) as f64
}

#[inline]
pub fn complexity_score(complexity: &str) -> f64 {
    match complexity.trim().to_lowercase().as_str() {
        "low" => 0.3,
        "medium" => 0.6,
        "high" => 1.0,
        _ => 0.5,
    }
}

/// "week" is checked before "month"
#[inline]
pub fn timeline_urgency(timeline: &str) -> f64 {
    let timeline = timeline.to_lowercase();
    if timeline.contains("week") {
        1.0
    } else if timeline.contains("month") {
        0.6
    } else {
        0.3
    }
}

#[inline]
pub fn blockchain_type_score(blockchain: &str) -> f64 {
    match blockchain.trim().to_lowercase().as_str() {
        "ethereum" => 0.9,
        "solana" => 0.8,
        "polygon" => 0.7,
        "arbitrum" => 0.6,
        "optimism" => 0.5,
        _ => 0.5,
    }
}

#[inline]
pub fn experience_preference_score(preference: &str) -> f64 {
    match preference.trim().to_lowercase().as_str() {
        "junior" => 0.3,
        "mid" => 0.5,
        "senior" => 0.8,
        "expert" => 1.0,
        _ => 0.5,
    }
}

#[inline]
pub fn availability_score(availability: Availability) -> f64 {
    match availability {
        Availability::Available => 1.0,
        Availability::Busy => 0.5,
        Availability::Unavailable => 0.0,
    }
}
