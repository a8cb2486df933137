use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use strum_macros::EnumIter;

/// Skin conditions the classifier can report.
///
/// The set is closed: a model whose label table names anything else is
/// rejected when its manifest is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLabel {
    Dry,
    Acne,
    Pigmentation,
    Wrinkle,
    #[serde(rename = "dark circles")]
    DarkCircles,
    Normal,
}

impl ConditionLabel {
    /// Label as emitted by the classifier and used as the result map key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionLabel::Dry => "dry",
            ConditionLabel::Acne => "acne",
            ConditionLabel::Pigmentation => "pigmentation",
            ConditionLabel::Wrinkle => "wrinkle",
            ConditionLabel::DarkCircles => "dark circles",
            ConditionLabel::Normal => "normal",
        }
    }

    /// URL-safe identifier used by the conditions catalog.
    pub fn id(&self) -> &'static str {
        match self {
            ConditionLabel::DarkCircles => "dark_circles",
            other => other.as_str(),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConditionLabel::Dry => "Dry Skin",
            ConditionLabel::Acne => "Acne",
            ConditionLabel::Pigmentation => "Pigmentation",
            ConditionLabel::Wrinkle => "Wrinkles",
            ConditionLabel::DarkCircles => "Dark Circles",
            ConditionLabel::Normal => "Normal/Healthy",
        }
    }

    pub fn summary(&self) -> &'static str {
        match self {
            ConditionLabel::Dry => "Skin that lacks moisture and natural oils",
            ConditionLabel::Acne => "Inflammatory skin condition with pimples and blemishes",
            ConditionLabel::Pigmentation => "Dark spots or uneven skin tone",
            ConditionLabel::Wrinkle => "Lines and creases in the skin",
            ConditionLabel::DarkCircles => "Darkening under the eyes",
            ConditionLabel::Normal => "Balanced, healthy-looking skin",
        }
    }
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown condition label: {0:?}")]
pub struct UnknownCondition(pub String);

impl FromStr for ConditionLabel {
    type Err = UnknownCondition;

    /// Accepts both the label and the catalog id, ignoring case and padding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dry" => Ok(ConditionLabel::Dry),
            "acne" => Ok(ConditionLabel::Acne),
            "pigmentation" => Ok(ConditionLabel::Pigmentation),
            "wrinkle" => Ok(ConditionLabel::Wrinkle),
            "dark circles" | "dark_circles" => Ok(ConditionLabel::DarkCircles),
            "normal" => Ok(ConditionLabel::Normal),
            _ => Err(UnknownCondition(s.to_string())),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct AnalyzeRequest {
    pub image: Option<String>,
}

/// Label to percentage pairs, serialized as a JSON object that keeps rank order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConditionScores(pub Vec<(String, f64)>);

impl ConditionScores {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ConditionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ConditionScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScoresVisitor;

        impl<'de> Visitor<'de> for ScoresVisitor {
            type Value = ConditionScores;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of condition label to percentage")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((label, value)) = access.next_entry::<String, f64>()? {
                    entries.push((label, value));
                }
                Ok(ConditionScores(entries))
            }
        }

        deserializer.deserialize_map(ScoresVisitor)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Recommendations {
    pub description: String,
    pub tips: Vec<String>,
    pub ingredients_to_look_for: Vec<String>,
    pub ingredients_to_avoid: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub top_condition: String,
    pub confidence: f64,
    pub all_conditions: ConditionScores,
    pub recommendations: Recommendations,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConditionInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConditionsResponse {
    pub conditions: Vec<ConditionInfo>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorResponse {
    pub error: String,
}
