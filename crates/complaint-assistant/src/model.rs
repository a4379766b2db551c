use std::fmt;

use serde::{Deserialize, Serialize};

use sahayak_common::api::SectionPayload;

/// Which criminal code a catalogue is keyed by. Decided by the code column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegalCode {
    /// Bharatiya Nyaya Sanhita, column "BNS Section".
    Bns,
    /// Indian Penal Code, column "IPC Section".
    Ipc,
}

impl LegalCode {
    pub const ALL: [LegalCode; 2] = [LegalCode::Bns, LegalCode::Ipc];

    pub fn column(self) -> &'static str {
        match self {
            Self::Bns => "BNS Section",
            Self::Ipc => "IPC Section",
        }
    }

    /// Short label used in narrative headings, e.g. "BNS".
    pub fn label(self) -> &'static str {
        match self {
            Self::Bns => "BNS",
            Self::Ipc => "IPC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cognizability {
    Cognizable,
    NonCognizable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bailability {
    Bailable,
    NonBailable,
}

/// Collapse case, spaces, hyphens and underscores so "Non-Bailable" and "non bailable" agree.
fn squash(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

impl Cognizability {
    pub fn parse(raw: &str) -> Option<Self> {
        match squash(raw).as_str() {
            "cognizable" | "cognisable" => Some(Self::Cognizable),
            "noncognizable" | "noncognisable" => Some(Self::NonCognizable),
            _ => None,
        }
    }
}

impl fmt::Display for Cognizability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cognizable => "Cognizable",
            Self::NonCognizable => "Non-Cognizable",
        })
    }
}

impl Bailability {
    pub fn parse(raw: &str) -> Option<Self> {
        match squash(raw).as_str() {
            "bailable" => Some(Self::Bailable),
            "nonbailable" => Some(Self::NonBailable),
            _ => None,
        }
    }
}

impl fmt::Display for Bailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bailable => "Bailable",
            Self::NonBailable => "Non-Bailable",
        })
    }
}

/// One legal-code section from the sections table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Section identifier as written in the table, e.g. "BNS-303".
    pub code: String,
    /// Section title. Falls back to the description when the table has no "Name" column.
    pub name: String,
    pub description: String,
    pub punishment: String,
    pub category: String,
    pub cognizability: Cognizability,
    pub bailability: Bailability,
}

impl CatalogEntry {
    pub fn to_payload(&self) -> SectionPayload {
        SectionPayload {
            code: self.code.clone(),
            description: self.description.clone(),
            punishment: self.punishment.clone(),
            category: self.category.clone(),
            cognizability: self.cognizability.to_string(),
            bailability: self.bailability.to_string(),
        }
    }
}

/// A canonical complaint phrasing mapped to the section it describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExample {
    pub text: String,
    pub code: String,
}

/// One ranked entry of a [`MatchResult`].
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMatch {
    pub entry: CatalogEntry,
    pub score: f32,
    /// The example phrasing that produced this score.
    pub example: String,
}

/// Ranked outcome of one classification call, descending by score.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub legal_code: LegalCode,
    pub matches: Vec<SectionMatch>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn codes(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.entry.code.clone()).collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.matches.iter().map(|m| &m.entry)
    }

    /// Highest-ranked entry, used as the letter's main section.
    pub fn main_entry(&self) -> Option<&CatalogEntry> {
        self.matches.first().map(|m| &m.entry)
    }

    pub fn other_entries(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.matches.iter().skip(1).map(|m| &m.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enum_spellings() {
        assert_eq!(Cognizability::parse("Cognizable"), Some(Cognizability::Cognizable));
        assert_eq!(
            Cognizability::parse("Non-Cognizable"),
            Some(Cognizability::NonCognizable)
        );
        assert_eq!(
            Cognizability::parse(" non cognizable "),
            Some(Cognizability::NonCognizable)
        );
        assert_eq!(Bailability::parse("Non-Bailable"), Some(Bailability::NonBailable));
        assert_eq!(Bailability::parse("BAILABLE"), Some(Bailability::Bailable));
        assert_eq!(Bailability::parse("sometimes"), None);
    }

    #[test]
    fn payload_uses_display_forms() {
        let entry = CatalogEntry {
            code: "BNS-303".into(),
            name: "Theft".into(),
            description: "Theft of movable property".into(),
            punishment: "Up to 3 years".into(),
            category: "Property".into(),
            cognizability: Cognizability::Cognizable,
            bailability: Bailability::NonBailable,
        };
        let payload = entry.to_payload();
        assert_eq!(payload.code, "BNS-303");
        assert_eq!(payload.cognizability, "Cognizable");
        assert_eq!(payload.bailability, "Non-Bailable");
    }
}
