/// Weight of the structured model score in the combined ranking key
pub const STRUCTURED_WEIGHT: f64 = 0.6;
/// Weight of the semantic similarity score in the combined ranking key
pub const SEMANTIC_WEIGHT: f64 = 0.4;

/// Combine the two sub-scores into the ranking key
///
/// combined = 0.6 * structured + 0.4 * semantic, clamped to [0, 1].
/// Non-finite inputs count as 0.0.
#[inline]
pub fn combine(structured_score: f64, semantic_score: f64) -> f64 {
    let structured = sanitize(structured_score);
    let semantic = sanitize(semantic_score);

    (STRUCTURED_WEIGHT * structured + SEMANTIC_WEIGHT * semantic).clamp(0.0, 1.0)
}

/// Clamp a sub-score into [0, 1], mapping NaN and infinities to 0.0
#[inline]
pub fn sanitize(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
