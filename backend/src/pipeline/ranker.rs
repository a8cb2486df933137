use crate::classifier::labels::LabelTable;
use crate::classifier::ProbabilityVector;
use shared::{ConditionLabel, ConditionScores};
use std::cmp::Ordering;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RankError {
    #[error("Classifier returned no probabilities")]
    Empty,
    #[error("Classifier returned {actual} probabilities for {expected} labels")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Probability at index {index} is not finite")]
    NonFinite { index: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedCondition {
    pub label: ConditionLabel,
    /// Position in the classifier output.
    pub index: usize,
    /// Unrounded percentage.
    pub percent: f64,
}

/// Conditions sorted by confidence, highest first. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult {
    ranked: Vec<RankedCondition>,
}

impl RankedResult {
    pub fn top(&self) -> &RankedCondition {
        &self.ranked[0]
    }

    pub fn top_condition(&self) -> ConditionLabel {
        self.top().label
    }

    /// Top confidence as a percentage rounded to two decimals.
    pub fn confidence(&self) -> f64 {
        round_percent(self.top().percent)
    }

    #[cfg(test)]
    pub fn ranked(&self) -> &[RankedCondition] {
        &self.ranked
    }

    pub fn all_conditions(&self) -> ConditionScores {
        ConditionScores(
            self.ranked
                .iter()
                .map(|c| (c.label.as_str().to_string(), round_percent(c.percent)))
                .collect(),
        )
    }

    /// One `label: 12.34%` line per condition, in rank order.
    pub fn condition_list(&self) -> Vec<String> {
        self.ranked
            .iter()
            .map(|c| format!("{}: {:.2}%", c.label, c.percent))
            .collect()
    }
}

pub fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pairs each probability with its label and sorts by confidence.
///
/// Equal confidences keep classifier output order, so identical input always
/// produces identical output. Rounding happens only when formatting.
pub fn rank(probabilities: &ProbabilityVector, labels: &LabelTable) -> Result<RankedResult, RankError> {
    let values = probabilities.as_slice();
    if values.is_empty() {
        return Err(RankError::Empty);
    }
    if values.len() != labels.len() {
        return Err(RankError::LengthMismatch {
            expected: labels.len(),
            actual: values.len(),
        });
    }

    let mut ranked = values
        .iter()
        .zip(labels.iter())
        .enumerate()
        .map(|(index, (&p, label))| {
            if !p.is_finite() {
                return Err(RankError::NonFinite { index });
            }
            Ok(RankedCondition {
                label,
                index,
                percent: f64::from(p) * 100.0,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    ranked.sort_by(|a, b| {
        b.percent
            .partial_cmp(&a.percent)
            .unwrap_or(Ordering::Equal)
            .then(a.index.cmp(&b.index))
    });

    Ok(RankedResult { ranked })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probs(values: &[f32]) -> ProbabilityVector {
        ProbabilityVector::new(values.to_vec())
    }

    #[test]
    fn dominant_last_index_wins_with_fifty_percent() {
        let result = rank(&probs(&[0.1, 0.1, 0.1, 0.1, 0.1, 0.5]), &LabelTable::default()).unwrap();
        assert_eq!(result.top_condition(), ConditionLabel::Normal);
        assert_eq!(result.confidence(), 50.00);
        assert_eq!(result.all_conditions().get("dry"), Some(10.0));
    }

    #[test]
    fn output_is_sorted_descending() {
        let result = rank(&probs(&[0.05, 0.3, 0.2, 0.15, 0.1, 0.2]), &LabelTable::default()).unwrap();
        let percents: Vec<f64> = result.ranked().iter().map(|c| c.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(result.top_condition(), ConditionLabel::Acne);
    }

    #[test]
    fn ties_break_by_output_index() {
        let result = rank(&probs(&[0.1, 0.1, 0.1, 0.1, 0.1, 0.5]), &LabelTable::default()).unwrap();
        let order: Vec<usize> = result.ranked().iter().map(|c| c.index).collect();
        assert_eq!(order, vec![5, 0, 1, 2, 3, 4]);

        let all_equal = rank(&probs(&[0.25; 6]), &LabelTable::default()).unwrap();
        assert_eq!(all_equal.top_condition(), ConditionLabel::Dry);
    }

    #[test]
    fn ranking_twice_is_identical() {
        let input = probs(&[0.17, 0.17, 0.3, 0.06, 0.2, 0.1]);
        let first = rank(&input, &LabelTable::default()).unwrap();
        let second = rank(&input, &LabelTable::default()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first.all_conditions()).unwrap(),
            serde_json::to_vec(&second.all_conditions()).unwrap()
        );
        assert_eq!(first.condition_list(), second.condition_list());
    }

    #[test]
    fn ranking_uses_full_precision() {
        // Both round to 33.33%, but the second is strictly larger.
        let result = rank(
            &probs(&[0.333_31, 0.333_34, 0.0, 0.0, 0.0, 0.333_6]),
            &LabelTable::default(),
        )
        .unwrap();
        let order: Vec<ConditionLabel> = result.ranked().iter().take(3).map(|c| c.label).collect();
        assert_eq!(
            order,
            vec![ConditionLabel::Normal, ConditionLabel::Acne, ConditionLabel::Dry]
        );
        assert_eq!(result.confidence(), 33.36);
    }

    #[test]
    fn map_keys_are_trimmed_labels_in_rank_order() {
        let table = LabelTable::from_names(&[
            "dry ",
            "acne",
            "pigmentation",
            "wrinkle",
            "dark circles",
            "normal",
        ])
        .unwrap();
        let result = rank(&probs(&[0.6, 0.0, 0.0, 0.0, 0.4, 0.0]), &table).unwrap();
        let scores = result.all_conditions();
        assert_eq!(scores.0[0].0, "dry");
        assert_eq!(scores.0[1].0, "dark circles");
        assert_eq!(result.condition_list()[0], "dry: 60.00%");
    }

    #[test]
    fn unnormalized_output_is_ranked_as_is() {
        let result = rank(&probs(&[0.9, 0.8, 0.0, 0.0, 0.0, 0.0]), &LabelTable::default()).unwrap();
        assert_eq!(result.confidence(), 90.0);
    }

    #[test]
    fn malformed_vectors_are_rejected() {
        let table = LabelTable::default();
        assert_eq!(rank(&probs(&[]), &table), Err(RankError::Empty));
        assert_eq!(
            rank(&probs(&[0.5, 0.5]), &table),
            Err(RankError::LengthMismatch {
                expected: 6,
                actual: 2
            })
        );
        assert_eq!(
            rank(&probs(&[0.1, f32::NAN, 0.1, 0.1, 0.1, 0.1]), &table),
            Err(RankError::NonFinite { index: 1 })
        );
    }
}
