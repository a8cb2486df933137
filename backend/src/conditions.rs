use shared::{ConditionInfo, ConditionLabel, Recommendations};

/// Care guidance shown alongside a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guidance {
    pub description: &'static str,
    pub tips: &'static [&'static str],
    pub ingredients_to_look_for: &'static [&'static str],
    pub ingredients_to_avoid: &'static [&'static str],
}

impl Guidance {
    pub fn to_recommendations(&self) -> Recommendations {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Recommendations {
            description: self.description.to_string(),
            tips: owned(self.tips),
            ingredients_to_look_for: owned(self.ingredients_to_look_for),
            ingredients_to_avoid: owned(self.ingredients_to_avoid),
        }
    }
}

pub fn guidance(label: ConditionLabel) -> Guidance {
    match label {
        ConditionLabel::Acne => Guidance {
            description: "Acne is caused by clogged pores from oil, dead skin cells, and bacteria.",
            tips: &[
                "Use a gentle, non-comedogenic cleanser twice daily",
                "Apply benzoyl peroxide or salicylic acid treatments",
                "Avoid touching your face frequently",
                "Use oil-free moisturizers and sunscreen",
                "Consider consulting a dermatologist for persistent acne",
            ],
            ingredients_to_look_for: &["Salicylic Acid", "Benzoyl Peroxide", "Niacinamide", "Tea Tree Oil"],
            ingredients_to_avoid: &["Heavy oils", "Comedogenic ingredients", "Alcohol-based products"],
        },
        ConditionLabel::Dry => Guidance {
            description: "Dry skin lacks moisture and natural oils, leading to flakiness and tightness.",
            tips: &[
                "Use a gentle, hydrating cleanser",
                "Apply a rich moisturizer immediately after washing",
                "Use a humidifier in dry environments",
                "Avoid hot showers and harsh soaps",
                "Drink plenty of water to stay hydrated",
            ],
            ingredients_to_look_for: &["Hyaluronic Acid", "Ceramides", "Glycerin", "Shea Butter"],
            ingredients_to_avoid: &["Alcohol", "Fragrances", "Harsh sulfates"],
        },
        ConditionLabel::Pigmentation => Guidance {
            description: "Hyperpigmentation is darkening of skin areas due to excess melanin production.",
            tips: &[
                "Use broad-spectrum SPF 30+ sunscreen daily",
                "Apply vitamin C serum in the morning",
                "Use products with niacinamide or arbutin",
                "Consider chemical exfoliants like AHAs",
                "Be patient - results take 6-8 weeks minimum",
            ],
            ingredients_to_look_for: &["Vitamin C", "Niacinamide", "Alpha Arbutin", "Kojic Acid"],
            ingredients_to_avoid: &["Harsh physical scrubs", "Irritating ingredients"],
        },
        ConditionLabel::Wrinkle => Guidance {
            description: "Wrinkles are creases in the skin caused by aging, sun damage, and loss of collagen.",
            tips: &[
                "Use retinol or retinoid products at night",
                "Apply SPF 30+ sunscreen every day",
                "Keep skin well-hydrated with hyaluronic acid",
                "Consider peptide-rich products",
                "Get adequate sleep and manage stress",
            ],
            ingredients_to_look_for: &["Retinol", "Peptides", "Hyaluronic Acid", "Vitamin C"],
            ingredients_to_avoid: &["Excessive sun exposure", "Smoking", "Harsh products"],
        },
        ConditionLabel::DarkCircles => Guidance {
            description: "Dark circles under the eyes can be caused by fatigue, genetics, or aging.",
            tips: &[
                "Get 7-9 hours of quality sleep",
                "Use eye creams with caffeine or vitamin K",
                "Apply cold compresses to reduce puffiness",
                "Stay hydrated and limit salt intake",
                "Use concealer with peach or orange undertones",
            ],
            ingredients_to_look_for: &["Caffeine", "Vitamin K", "Retinol", "Peptides"],
            ingredients_to_avoid: &["Rubbing eyes", "Allergens", "Excessive screen time before bed"],
        },
        ConditionLabel::Normal => Guidance {
            description: "Your skin appears healthy and balanced. Keep up the good work!",
            tips: &[
                "Maintain your current skincare routine",
                "Continue using sunscreen daily",
                "Stay hydrated and eat a balanced diet",
                "Get regular exercise and adequate sleep",
                "Consider preventive anti-aging products",
            ],
            ingredients_to_look_for: &["Antioxidants", "SPF", "Gentle cleansers", "Light moisturizers"],
            ingredients_to_avoid: &["Over-exfoliation", "Unnecessary harsh treatments"],
        },
    }
}

const CATALOG_ORDER: [ConditionLabel; 6] = [
    ConditionLabel::Acne,
    ConditionLabel::Dry,
    ConditionLabel::Pigmentation,
    ConditionLabel::Wrinkle,
    ConditionLabel::DarkCircles,
    ConditionLabel::Normal,
];

pub fn catalog() -> Vec<ConditionInfo> {
    CATALOG_ORDER
        .iter()
        .map(|label| ConditionInfo {
            id: label.id().to_string(),
            name: label.display_name().to_string(),
            description: label.summary().to_string(),
        })
        .collect()
}
