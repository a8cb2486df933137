use shared::ConditionLabel;
use std::collections::HashSet;
use strum::IntoEnumIterator;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LabelTableError {
    #[error("Label {index} ({raw:?}) is not a known condition")]
    Unknown { index: usize, raw: String },
    #[error("Label {label} appears more than once")]
    Duplicate { label: ConditionLabel },
    #[error("Label table is missing {0}")]
    Missing(ConditionLabel),
}

/// Classifier output index to condition, as fixed by the training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<ConditionLabel>,
}

impl LabelTable {
    /// Parses labels in output order. Entries are trimmed, so padding left
    /// over from the training pipeline is harmless.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, LabelTableError> {
        let mut labels = Vec::with_capacity(names.len());
        let mut seen = HashSet::new();
        for (index, raw) in names.iter().enumerate() {
            let raw = raw.as_ref();
            let label = raw.parse::<ConditionLabel>().map_err(|_| LabelTableError::Unknown {
                index,
                raw: raw.to_string(),
            })?;
            if !seen.insert(label) {
                return Err(LabelTableError::Duplicate { label });
            }
            labels.push(label);
        }
        if let Some(missing) = ConditionLabel::iter().find(|l| !seen.contains(l)) {
            return Err(LabelTableError::Missing(missing));
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ConditionLabel> + '_ {
        self.labels.iter().copied()
    }
}

impl Default for LabelTable {
    /// Output order of the reference MobileNet export.
    fn default() -> Self {
        Self {
            labels: vec![
                ConditionLabel::Dry,
                ConditionLabel::Acne,
                ConditionLabel::Pigmentation,
                ConditionLabel::Wrinkle,
                ConditionLabel::DarkCircles,
                ConditionLabel::Normal,
            ],
        }
    }
}
