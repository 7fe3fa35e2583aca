//! Converting priority scores into integer question counts.

use crate::{Allocation, PriorityScores};

/// A topic whose priority exceeds this threshold is guaranteed at least
/// one question; a topic at or below it receives zero.
pub const DEFAULT_MIN_ALLOCATION_SCORE: f64 = 0.1;

/// Allocate a question count per topic from priority scores.
///
/// Each topic receives `floor(score / total_priority * total)`, with two
/// policy overrides:
/// - score above `min_score` is bumped to at least 1;
/// - score at or below `min_score` is zeroed.
///
/// Because of the independent flooring and the minimum-1 override, the
/// sum of counts only approximates `total`; that is accepted behavior,
/// deliberately not corrected by redistributing the remainder.
///
/// Degenerate input (all scores zero) falls back to exactly one question
/// per topic, ignoring `total`.
pub fn allocate_questions(scores: &PriorityScores, total: u32, min_score: f64) -> Allocation {
    let total_priority: f64 = scores.values().sum();
    if total_priority == 0.0 {
        return scores.keys().map(|topic| (topic.clone(), 1)).collect();
    }

    scores
        .iter()
        .map(|(topic, score)| {
            let proportional = ((score / total_priority) * f64::from(total)) as u32;
            let count = if *score > min_score {
                proportional.max(1)
            } else {
                0
            };
            (topic.clone(), count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(entries: &[(&str, f64)]) -> PriorityScores {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn all_zero_scores_allocate_one_each() {
        let scores = scores(&[("A", 0.0), ("B", 0.0), ("C", 0.0)]);
        let allocation = allocate_questions(&scores, 25, DEFAULT_MIN_ALLOCATION_SCORE);
        assert!(allocation.values().all(|&c| c == 1));
        assert_eq!(allocation.len(), 3);
    }

    #[test]
    fn score_above_threshold_gets_at_least_one() {
        // C's proportional share of 10 floors to 0, but 0.15 > 0.1.
        let scores = scores(&[("A", 1.0), ("B", 0.9), ("C", 0.15)]);
        let allocation = allocate_questions(&scores, 10, DEFAULT_MIN_ALLOCATION_SCORE);
        assert!(allocation["C"] >= 1);
    }

    #[test]
    fn score_at_or_below_threshold_gets_zero() {
        let scores = scores(&[("A", 1.0), ("B", 0.1), ("C", 0.05)]);
        let allocation = allocate_questions(&scores, 10, DEFAULT_MIN_ALLOCATION_SCORE);
        assert_eq!(allocation["B"], 0);
        assert_eq!(allocation["C"], 0);
    }

    #[test]
    fn proportional_split_approximates_total() {
        let scores = scores(&[("A", 1.0), ("B", 0.5)]);
        let allocation = allocate_questions(&scores, 10, DEFAULT_MIN_ALLOCATION_SCORE);
        // 1.0/1.5 * 10 = 6.67 -> 6; 0.5/1.5 * 10 = 3.33 -> 3
        assert_eq!(allocation["A"], 6);
        assert_eq!(allocation["B"], 3);
        // Sum is 9, not 10 — approximation is accepted, not rebalanced.
        let sum: u32 = allocation.values().sum();
        assert_eq!(sum, 9);
    }

    #[test]
    fn empty_scores_empty_allocation() {
        let allocation =
            allocate_questions(&PriorityScores::new(), 10, DEFAULT_MIN_ALLOCATION_SCORE);
        assert!(allocation.is_empty());
    }
}
