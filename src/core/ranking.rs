use crate::models::MatchResult;
use std::cmp::Ordering;

/// Sort results best-first
///
/// Order: combined score (descending), structured score (descending),
/// average response time (ascending), auditor id (ascending).
pub fn rank(results: &mut [MatchResult<'_>]) {
    results.sort_by(compare);
}

/// Total ordering used by `rank`
pub fn compare(a: &MatchResult<'_>, b: &MatchResult<'_>) -> Ordering {
    b.combined_score
        .total_cmp(&a.combined_score)
        .then_with(|| b.structured_score.total_cmp(&a.structured_score))
        .then_with(|| {
            a.auditor
                .response_time_avg
                .total_cmp(&b.auditor.response_time_avg)
        })
        .then_with(|| a.auditor.id.cmp(&b.auditor.id))
}
