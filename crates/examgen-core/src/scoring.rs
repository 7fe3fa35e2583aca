//! Priority scoring: normalized hours and normalized frequency combined
//! into a single deterministic score per topic.

use serde::{Deserialize, Serialize};

use crate::{FrequencyTable, PriorityScores, TopicHours};

/// Weights for the priority formula.
///
/// The prototype variants disagreed on the split (0.5/0.5 vs 0.6/0.4),
/// so the coefficients are configuration, not code. Default follows the
/// backend service: 0.6 hours, 0.4 frequency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub hours: f64,
    pub frequency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            hours: 0.6,
            frequency: 0.4,
        }
    }
}

/// Compute per-topic priority scores in [0, 1].
///
/// `priority = w_h * hours/max_hours + w_f * freq/max(max_freq, 1)`.
/// The frequency normalizer floors at 1 so an empty frequency table
/// yields a zero frequency component rather than a division by zero.
/// Scores are rounded to 3 decimals for reproducibility. An empty
/// syllabus returns an empty map.
pub fn compute_priority_scores(
    syllabus: &TopicHours,
    frequency: &FrequencyTable,
    weights: &ScoringWeights,
) -> PriorityScores {
    let Some(max_hours) = syllabus.values().copied().max() else {
        return PriorityScores::new();
    };
    // All-zero hours is degenerate input; flooring the normalizer keeps
    // the function total (every score comes out 0).
    let max_hours = f64::from(max_hours.max(1));
    let max_freq = f64::from(frequency.values().copied().max().unwrap_or(0).max(1));

    syllabus
        .iter()
        .map(|(topic, hours)| {
            let hours_norm = f64::from(*hours) / max_hours;
            let freq_norm =
                f64::from(frequency.get(topic).copied().unwrap_or(0)) / max_freq;
            let priority = weights.hours * hours_norm + weights.frequency * freq_norm;
            (topic.clone(), round3(priority))
        })
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn syllabus(entries: &[(&str, u32)]) -> TopicHours {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn empty_syllabus_returns_empty() {
        let scores =
            compute_priority_scores(&TopicHours::new(), &FrequencyTable::new(), &ScoringWeights::default());
        assert!(scores.is_empty());
    }

    #[test]
    fn max_hours_and_max_freq_scores_one() {
        let syllabus = syllabus(&[("A", 10), ("B", 5)]);
        let frequency: FrequencyTable =
            [("A".to_string(), 2), ("B".to_string(), 1)].into_iter().collect();
        let scores =
            compute_priority_scores(&syllabus, &frequency, &ScoringWeights::default());
        assert_eq!(scores["A"], 1.0);
        assert_eq!(scores["B"], 0.5);
    }

    #[test]
    fn scores_stay_in_unit_interval() {
        let syllabus = syllabus(&[("A", 3), ("B", 17), ("C", 9)]);
        let frequency: FrequencyTable = [("C".to_string(), 7)].into_iter().collect();
        let scores =
            compute_priority_scores(&syllabus, &frequency, &ScoringWeights::default());
        for score in scores.values() {
            assert!((0.0..=1.0).contains(score), "score out of range: {score}");
        }
    }

    #[test]
    fn empty_frequency_reduces_to_hours_term() {
        let syllabus = syllabus(&[("A", 10), ("B", 5)]);
        let scores = compute_priority_scores(
            &syllabus,
            &FrequencyTable::new(),
            &ScoringWeights::default(),
        );
        assert_eq!(scores["A"], 0.6);
        assert_eq!(scores["B"], 0.3);
    }

    #[test]
    fn rounded_to_three_decimals() {
        let syllabus = syllabus(&[("A", 3), ("B", 7)]);
        let scores = compute_priority_scores(
            &syllabus,
            &FrequencyTable::new(),
            &ScoringWeights::default(),
        );
        // 0.6 * 3/7 = 0.2571... -> 0.257
        assert_eq!(scores["A"], 0.257);
    }

    #[test]
    fn equal_split_weights_are_honored() {
        let syllabus = syllabus(&[("A", 10)]);
        let frequency: FrequencyTable = [("A".to_string(), 4)].into_iter().collect();
        let weights = ScoringWeights {
            hours: 0.5,
            frequency: 0.5,
        };
        let scores = compute_priority_scores(&syllabus, &frequency, &weights);
        assert_eq!(scores["A"], 1.0);
    }

    #[test]
    fn all_zero_hours_is_total() {
        let mut syllabus = BTreeMap::new();
        syllabus.insert("A".to_string(), 0);
        let scores = compute_priority_scores(
            &syllabus,
            &FrequencyTable::new(),
            &ScoringWeights::default(),
        );
        assert_eq!(scores["A"], 0.0);
    }
}
