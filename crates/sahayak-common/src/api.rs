use serde::{Deserialize, Serialize};

/// A profile field that callers send either as a JSON number or as text ("19", "unknown").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    /// Whole, non-negative numeric value if the field parses as one.
    pub fn as_u32(&self) -> Option<u32> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (n.is_finite() && n >= 0.0 && n <= u32::MAX as f64).then(|| n.trunc() as u32)
    }

    pub fn as_u64(&self) -> Option<u64> {
        let n = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        };
        (n.is_finite() && n >= 0.0).then(|| n.trunc() as u64)
    }

    pub fn display(&self) -> String {
        match self {
            Self::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// One or many occupations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Occupation {
    One(String),
    Many(Vec<String>),
}

impl Occupation {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(s) => vec![s.as_str()],
            Self::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }

    pub fn display(&self) -> String {
        self.values().join(", ")
    }
}

/// Caller-supplied citizen attributes. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub name: Option<String>,
    pub age: Option<NumberOrText>,
    pub gender: Option<String>,
    /// Free-text address used in complaint letters.
    pub location: Option<String>,
    /// State of residence used for scheme eligibility.
    pub state: Option<String>,
    pub caste: Option<String>,
    pub income: Option<NumberOrText>,
    pub occupation: Option<Occupation>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "id_number")]
    pub id: Option<String>,
}

/// Section fields as exposed in the complaint response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPayload {
    pub code: String,
    pub description: String,
    pub punishment: String,
    pub category: String,
    pub cognizability: String,
    pub bailability: String,
}

/// Pipeline response contract. Every field is always present; failures carry empty values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplaintResponse {
    pub success: bool,
    pub transcribed_text: String,
    pub language: String,
    pub matched_sections: Vec<String>,
    pub bns_sections: Vec<SectionPayload>,
    pub ipc_sections: Vec<SectionPayload>,
    pub audio_url: String,
    pub pdf_english_url: String,
    pub pdf_regional_url: String,
    pub formatted_output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComplaintResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecommendRequest {
    pub user_query: String,
    pub user_profile: UserProfile,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedScheme {
    pub scheme_name: String,
    pub category: String,
    pub description: String,
    pub apply_link: String,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<RecommendedScheme>,
}
