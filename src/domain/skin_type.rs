//! Baumann skin type system
//!
//! Skin is classified along four binary axes, giving 16 four-letter codes:
//! oily/dry, sensitive/resistant, pigmented/non-pigmented, wrinkled/tight.
//! The table is static; the live API has no skin-type endpoint.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::DomainError;

/// Skin oiliness axis (first letter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Oiliness {
    /// Oily
    #[serde(rename = "O")]
    Oily,
    /// Dry
    #[serde(rename = "D")]
    Dry,
}

/// Skin sensitivity axis (second letter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Sensitivity {
    /// Sensitive
    #[serde(rename = "S")]
    Sensitive,
    /// Resistant
    #[serde(rename = "R")]
    Resistant,
}

/// Skin pigmentation axis (third letter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Pigmentation {
    /// Pigmented (prone to dark spots)
    #[serde(rename = "P")]
    Pigmented,
    /// Non-pigmented
    #[serde(rename = "N")]
    NonPigmented,
}

/// Skin aging axis (fourth letter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Aging {
    /// Wrinkled (shows aging)
    #[serde(rename = "W")]
    Wrinkled,
    /// Tight (firm)
    #[serde(rename = "T")]
    Tight,
}

impl Oiliness {
    pub fn letter(self) -> char {
        match self {
            Oiliness::Oily => 'O',
            Oiliness::Dry => 'D',
        }
    }
}

impl Sensitivity {
    pub fn letter(self) -> char {
        match self {
            Sensitivity::Sensitive => 'S',
            Sensitivity::Resistant => 'R',
        }
    }
}

impl Pigmentation {
    pub fn letter(self) -> char {
        match self {
            Pigmentation::Pigmented => 'P',
            Pigmentation::NonPigmented => 'N',
        }
    }
}

impl Aging {
    pub fn letter(self) -> char {
        match self {
            Aging::Wrinkled => 'W',
            Aging::Tight => 'T',
        }
    }
}

/// Per-axis filter; an unset axis accepts either letter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisFilter {
    pub od: Option<Oiliness>,
    pub sr: Option<Sensitivity>,
    pub pn: Option<Pigmentation>,
    pub wt: Option<Aging>,
}

impl AxisFilter {
    pub fn is_empty(&self) -> bool {
        self.od.is_none() && self.sr.is_none() && self.pn.is_none() && self.wt.is_none()
    }

    /// Whether a single four-letter code satisfies every requested axis
    ///
    /// Codes that are not exactly four letters never match.
    pub fn matches_code(&self, code: &str) -> bool {
        let letters: Vec<char> = code.chars().map(|c| c.to_ascii_uppercase()).collect();
        if letters.len() != 4 {
            return false;
        }

        let axis = |wanted: Option<char>, idx: usize| wanted.map_or(true, |w| letters[idx] == w);
        axis(self.od.map(Oiliness::letter), 0)
            && axis(self.sr.map(Sensitivity::letter), 1)
            && axis(self.pn.map(Pigmentation::letter), 2)
            && axis(self.wt.map(Aging::letter), 3)
    }

    /// A product matches when no axis is requested or any of its codes matches
    pub fn matches_any<S: AsRef<str>>(&self, codes: &[S]) -> bool {
        self.is_empty() || codes.iter().any(|code| self.matches_code(code.as_ref()))
    }
}

/// Full description of one Baumann skin type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkinTypeInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    /// 1 (easiest) to 5 (most complex)
    pub difficulty: u8,
    pub description: &'static str,
}

/// Result of `list_skin_types`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinTypeList {
    pub skin_types: Vec<SkinTypeInfo>,
    pub total: usize,
}

const fn skin_type(
    code: &'static str,
    name: &'static str,
    category: &'static str,
    difficulty: u8,
    description: &'static str,
) -> SkinTypeInfo {
    SkinTypeInfo {
        code,
        name,
        category,
        difficulty,
        description,
    }
}

/// All 16 skin types in presentation order
pub static SKIN_TYPES: [SkinTypeInfo; 16] = [
    skin_type("DSPW", "Dry, Sensitive, Pigmented, Wrinkled", "dry-sensitive", 5,
        "The most complex skin type. Needs rich hydration, anti-inflammatory care, brightening, and anti-aging support simultaneously."),
    skin_type("DSNW", "Dry, Sensitive, Non-pigmented, Wrinkled", "dry-sensitive", 4,
        "Dry and sensitive with visible aging but even tone. Prioritise deep hydration, barrier repair, and anti-aging actives."),
    skin_type("DSPT", "Dry, Sensitive, Pigmented, Tight", "dry-sensitive", 3,
        "Dry and sensitive with pigmentation issues. Focus on gentle brightening and barrier repair."),
    skin_type("DSNT", "Dry, Sensitive, Non-pigmented, Tight", "dry-sensitive", 2,
        "Dry and reactive but even-toned and firm. Needs barrier support and gentle hydration."),
    skin_type("DRPW", "Dry, Resistant, Pigmented, Wrinkled", "dry-resistant", 3,
        "Dry with pigmentation and aging. Tolerates actives well, so focus on brightening and anti-aging."),
    skin_type("DRNW", "Dry, Resistant, Non-pigmented, Wrinkled", "dry-resistant", 2,
        "Dry with aging concerns but even tone. Responds well to hydrating anti-aging routines."),
    skin_type("DRPT", "Dry, Resistant, Pigmented, Tight", "dry-resistant", 2,
        "Dry with pigmentation but no significant aging. Can use brightening actives safely."),
    skin_type("DRNT", "Dry, Resistant, Non-pigmented, Tight", "dry-resistant", 1,
        "The easiest dry skin type. Simply needs good hydration and moisturisation."),
    skin_type("OSPW", "Oily, Sensitive, Pigmented, Wrinkled", "oily-sensitive", 5,
        "Oily yet sensitive with pigmentation and aging. A complex type needing balanced multi-target care."),
    skin_type("OSPT", "Oily, Sensitive, Pigmented, Tight", "oily-sensitive", 4,
        "Very common in teens and young adults. Oily, acne-prone, and sensitive with post-inflammatory dark spots."),
    skin_type("OSNW", "Oily, Sensitive, Non-pigmented, Wrinkled", "oily-sensitive", 4,
        "Oily and sensitive with early aging but even tone. Focus on anti-aging while controlling oil."),
    skin_type("OSNT", "Oily, Sensitive, Non-pigmented, Tight", "oily-sensitive", 3,
        "Oily and reactive but even-toned and firm. Needs oil control and anti-inflammatory care."),
    skin_type("ORPW", "Oily, Resistant, Pigmented, Wrinkled", "oily-resistant", 3,
        "Oily and resilient with pigmentation and aging. Can tolerate strong actives for brightening and anti-aging."),
    skin_type("ORNW", "Oily, Resistant, Non-pigmented, Wrinkled", "oily-resistant", 2,
        "Oily and aging-prone but even-toned. Responds well to retinoids and oil-control routines."),
    skin_type("ORPT", "Oily, Resistant, Pigmented, Tight", "oily-resistant", 2,
        "Oily with pigmentation but firm. Tolerates brightening actives well."),
    skin_type("ORNT", "Oily, Resistant, Non-pigmented, Tight", "oily-resistant", 1,
        "The easiest oily skin type. Resilient, even-toned, and firm. Just needs basic oil control."),
];

/// All valid codes in table order
pub fn skin_type_codes() -> Vec<&'static str> {
    SKIN_TYPES.iter().map(|t| t.code).collect()
}

/// Look up a skin type by code, ignoring case
pub fn lookup_skin_type(code: &str) -> Result<&'static SkinTypeInfo, DomainError> {
    SKIN_TYPES
        .iter()
        .find(|t| t.code.eq_ignore_ascii_case(code.trim()))
        .ok_or_else(|| DomainError::UnknownSkinType {
            code: code.to_string(),
            valid: skin_type_codes().join(", "),
        })
}

/// Every skin type with a count
pub fn list_skin_types() -> SkinTypeList {
    let skin_types = SKIN_TYPES.to_vec();
    SkinTypeList {
        total: skin_types.len(),
        skin_types,
    }
}
