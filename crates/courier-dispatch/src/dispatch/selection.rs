use std::cmp::Ordering;

use super::domain::DriverId;
use super::scoring::ScoreResult;

/// Chooses one driver from scored candidates.
///
/// Order: highest `total_score`, then the lower `count_for_day`, then the
/// lexicographically smaller driver id. The result never depends on the
/// order the candidates arrive in.
pub struct AssignmentSelector;

impl AssignmentSelector {
    pub fn pick_best(scores: &[ScoreResult]) -> Option<DriverId> {
        Self::best_candidate(scores).map(|score| score.driver_id.clone())
    }

    pub fn best_candidate(scores: &[ScoreResult]) -> Option<&ScoreResult> {
        scores
            .iter()
            .filter(|score| score.eligible())
            .min_by(|left, right| Self::rank(left, right))
    }

    /// `Less` means `left` is preferred.
    pub fn rank(left: &ScoreResult, right: &ScoreResult) -> Ordering {
        right
            .total_score
            .total_cmp(&left.total_score)
            .then_with(|| left.count_for_day.cmp(&right.count_for_day))
            .then_with(|| left.driver_id.cmp(&right.driver_id))
    }

    /// Sort for display: eligible drivers first in selection order, then the
    /// excluded ones by id.
    pub fn sort_for_display(scores: &mut [ScoreResult]) {
        scores.sort_by(|left, right| match (left.eligible(), right.eligible()) {
            (true, true) => Self::rank(left, right),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => left.driver_id.cmp(&right.driver_id),
        });
    }
}
