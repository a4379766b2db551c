/// Typed scheme records loaded from the scheme table.
use sahayak_common::api::RecommendedScheme;

/// Cell values meaning "no restriction" for categorical filters.
pub const ANY: &str = "any";

/// A numeric eligibility bound (age limits).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NumericBound {
    Unconstrained,
    Value(u32),
    /// Cell could not be read as a number; evaluated as unconstrained.
    Malformed(String),
}

impl NumericBound {
    pub fn parse(raw: &str) -> Self {
        let cell = raw.trim().to_lowercase();
        if matches!(cell.as_str(), "" | "any" | "none" | "nan") {
            return Self::Unconstrained;
        }
        match cell.parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 && n <= u32::MAX as f64 => {
                Self::Value(n.trunc() as u32)
            }
            _ => Self::Malformed(raw.trim().to_string()),
        }
    }

    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Unconstrained | Self::Malformed(_) => None,
        }
    }
}

/// Income ceiling parsed from the "Income Max (Annual)" column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomeCeiling {
    Unconstrained,
    Rupees(u64),
    Malformed(String),
}

impl IncomeCeiling {
    pub fn value(&self) -> Option<u64> {
        match self {
            Self::Rupees(v) => Some(*v),
            Self::Unconstrained | Self::Malformed(_) => None,
        }
    }
}

/// Categorical eligibility filters. Values are lower-cased; `any` means no restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeFilters {
    pub gender: String,
    pub caste: String,
    /// Raw lower-cased income cell, kept for the embedding text.
    pub income_max: String,
    pub occupation: String,
    pub disability: String,
    pub marital_status: String,
    pub religion: String,
    pub state: String,
    pub education: String,
    pub minority: String,
    pub for_orphans: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeEntry {
    pub name: String,
    pub category: String,
    pub description: String,
    pub apply_link: String,
    pub filters: SchemeFilters,
    pub income_ceiling: IncomeCeiling,
    pub min_age: NumericBound,
    pub max_age: NumericBound,
}

impl SchemeEntry {
    /// Text embedded once per scheme at load.
    pub fn enrich_text(&self) -> String {
        let f = &self.filters;
        format!(
            "Represent this scheme for retrieval: {} Eligibility: Gender: {}, Caste: {}, \
             Income: {}, Occupation: {}, Disability: {}, Marital Status: {}, Religion: {}, \
             State: {}, Education: {}, Minority: {}, For Orphans: {}.",
            self.description,
            f.gender,
            f.caste,
            f.income_max,
            f.occupation,
            f.disability,
            f.marital_status,
            f.religion,
            f.state,
            f.education,
            f.minority,
            f.for_orphans,
        )
    }

    pub fn to_recommendation(&self, similarity_score: f64) -> RecommendedScheme {
        RecommendedScheme {
            scheme_name: self.name.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            apply_link: self.apply_link.clone(),
            similarity_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_bounds() {
        assert_eq!(NumericBound::parse("18"), NumericBound::Value(18));
        assert_eq!(NumericBound::parse(" 60.0 "), NumericBound::Value(60));
        assert_eq!(NumericBound::parse("Any"), NumericBound::Unconstrained);
        assert_eq!(NumericBound::parse(""), NumericBound::Unconstrained);
        assert_eq!(
            NumericBound::parse("18+"),
            NumericBound::Malformed("18+".into())
        );
        assert_eq!(NumericBound::parse("18+").value(), None);
    }
}
