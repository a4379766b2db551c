/// Complaint-letter field maps for the document renderer.
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use sahayak_common::api::UserProfile;
use sahayak_common::capability::{LanguageDetector, Translator};

use crate::model::CatalogEntry;
use crate::narrative::Localizer;

const POLICE_STATION: &str = "Concerned Police Station";
const SIGNATURE: &str = "Signature";

/// Complainant details with the defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complainant {
    pub name: String,
    pub location: String,
    pub age: String,
    pub gender: String,
    pub phone: String,
    pub id_number: String,
    pub email: String,
}

fn or_default(value: Option<&str>, default: &str) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

impl Complainant {
    pub fn from_profile(profile: &UserProfile) -> Self {
        let age = profile.age.as_ref().map(|a| a.display());
        Self {
            name: or_default(profile.name.as_deref(), "User"),
            location: or_default(profile.location.as_deref(), "Unknown"),
            age: or_default(age.as_deref(), "30"),
            gender: or_default(profile.gender.as_deref(), "Male"),
            phone: or_default(profile.phone.as_deref(), "NA"),
            id_number: or_default(profile.id.as_deref(), "NA"),
            email: or_default(profile.email.as_deref(), "user@example.com"),
        }
    }
}

/// Section fields as they appear in a letter, already in the letter's language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterSection {
    #[serde(rename = "Section_Number")]
    pub code: String,
    #[serde(rename = "Section_Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Punishment")]
    pub punishment: String,
    #[serde(rename = "Cognizability")]
    pub cognizability: String,
    #[serde(rename = "Bailability")]
    pub bailability: String,
    #[serde(rename = "Category")]
    pub category: String,
}

impl LetterSection {
    pub fn from_entry(entry: &CatalogEntry) -> Self {
        Self {
            code: entry.code.clone(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            punishment: entry.punishment.clone(),
            cognizability: entry.cognizability.to_string(),
            bailability: entry.bailability.to_string(),
            category: entry.category.clone(),
        }
    }

    /// Translate every text field except the code, each independently.
    pub async fn localized(entry: &CatalogEntry, loc: &Localizer) -> Self {
        Self {
            code: entry.code.clone(),
            name: loc.localize("section_name", &entry.name).await,
            description: loc.localize("description", &entry.description).await,
            punishment: loc.localize("punishment", &entry.punishment).await,
            cognizability: loc
                .localize("cognizability", &entry.cognizability.to_string())
                .await,
            bailability: loc.localize("bailability", &entry.bailability.to_string()).await,
            category: loc.localize("category", &entry.category).await,
        }
    }
}

/// Everything one letter needs.
#[derive(Debug, Clone)]
pub struct LetterContent<'a> {
    pub complainant: &'a Complainant,
    /// Name and location after [`conditional_translate`].
    pub name: String,
    pub location: String,
    pub complaint_summary: String,
    pub main_section: Option<LetterSection>,
    pub other_sections: Vec<LetterSection>,
    pub date: NaiveDate,
}

/// Field map handed to the template renderer.
///
/// Section fields are omitted entirely when nothing matched.
pub fn letter_fields(content: &LetterContent<'_>) -> Value {
    let c = content.complainant;
    let mut fields = json!({
        "Current_Date": content.date.format("%d-%m-%Y").to_string(),
        "Police_Station_or_Department_Name": POLICE_STATION,
        "District_City": content.location,
        "Full_Name": content.name,
        "Age": c.age,
        "Full_Address": content.location,
        "User_Complaint_Summary": content.complaint_summary,
        "Gender": c.gender,
        "Phone_Number": c.phone,
        "ID_Number": c.id_number,
        "Email": c.email,
        "Signature_or_Thumb": SIGNATURE,
        "Village_District": content.location,
        "Other_bns_Sections": content.other_sections,
    });
    if let (Some(main), Some(map)) = (&content.main_section, fields.as_object_mut()) {
        map.insert("bns_Section_Number".into(), json!(main.code));
        map.insert("bns_Section_Name".into(), json!(main.name));
        map.insert("bns_Section_Description".into(), json!(main.description));
        map.insert("Punishment".into(), json!(main.punishment));
        map.insert("Cognizability".into(), json!(main.cognizability));
        map.insert("Bailability".into(), json!(main.bailability));
        map.insert("Offence_Category".into(), json!(main.category));
    }
    fields
}

/// Translate a personal field into `target_lang` unless it already looks right.
///
/// Text containing '@' or made only of digits passes through, as does text the detector
/// already reports in `target_lang`. Any detection or translation error keeps the original.
pub async fn conditional_translate(
    translator: &Arc<dyn Translator>,
    detector: &Arc<dyn LanguageDetector>,
    text: &str,
    target_lang: &str,
) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty()
        || trimmed.contains('@')
        || trimmed.chars().all(|c| c.is_ascii_digit())
    {
        return text.to_string();
    }
    let detected = match detector.detect(trimmed) {
        Ok(lang) => lang,
        Err(e) => {
            warn!(error = %e, "language detection failed, keeping original text");
            return text.to_string();
        }
    };
    if detected == target_lang {
        return text.to_string();
    }
    match translator.translate(text, target_lang).await {
        Ok(translated) => translated,
        Err(e) => {
            warn!(error = %e, target_lang, "personal field translation failed, keeping original text");
            text.to_string()
        }
    }
}
