/// Scheme catalogue: table parsing, eligibility-bound normalisation and the scheme
/// embedding index.
///
/// Blank eligibility cells read as `any` and categorical cells are lower-cased. Display
/// columns (name, category, description, apply link) are kept verbatim.
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use sahayak_common::embedding::TextEmbedder;
use sahayak_common::error::CommonError;

use crate::eligibility::clean_income;
use crate::error::AppError;
use crate::model::{IncomeCeiling, NumericBound, SchemeEntry, SchemeFilters, ANY};

const COL_NAME: &str = "Scheme Name";
const COL_CATEGORY: &str = "Category";
const COL_DESCRIPTION: &str = "Description";
const COL_APPLY_LINK: &str = "Apply Link";
const COL_GENDER: &str = "Gender";
const COL_CASTE: &str = "Caste";
const COL_INCOME: &str = "Income Max (Annual)";
const COL_OCCUPATION: &str = "Occupation";
const COL_DISABILITY: &str = "Disability Required";
const COL_MARITAL: &str = "Marital status";
const COL_RELIGION: &str = "Religion";
const COL_STATE: &str = "state";
const COL_EDUCATION: &str = "Education Required";
const COL_MINORITY: &str = "Minority status";
const COL_ORPHANS: &str = "For Orphans";
const COL_MIN_AGE: &str = "Min Age";
const COL_MAX_AGE: &str = "Max Age";

/// A numeric eligibility cell that could not be read; the bound is treated as unconstrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityParseWarning {
    pub scheme: String,
    pub column: &'static str,
    pub value: String,
}

impl fmt::Display for EligibilityParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scheme '{}': unreadable {} '{}', treated as unconstrained",
            self.scheme, self.column, self.value
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSchemes {
    pub entries: Vec<SchemeEntry>,
    pub warnings: Vec<EligibilityParseWarning>,
    /// SHA-256 of the raw table.
    pub fingerprint: String,
}

struct Columns {
    headers: csv::StringRecord,
}

impl Columns {
    fn find(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    fn require(&self, name: &str) -> Result<usize, AppError> {
        self.find(name).ok_or_else(|| {
            AppError::DataIntegrity(format!("schemes table is missing required column '{name}'"))
        })
    }
}

fn display_cell(row: &csv::StringRecord, idx: usize) -> String {
    row.get(idx).unwrap_or_default().to_string()
}

/// Lower-cased filter cell; blank or absent columns read as `any`.
fn filter_cell(row: &csv::StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| row.get(i))
        .map(str::to_lowercase)
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| ANY.to_string())
}

fn income_ceiling(cell: &str) -> IncomeCeiling {
    if matches!(cell, "any" | "none" | "nan" | "no limit") {
        return IncomeCeiling::Unconstrained;
    }
    match clean_income(cell) {
        Some(rupees) => IncomeCeiling::Rupees(rupees),
        None => IncomeCeiling::Malformed(cell.to_string()),
    }
}

/// Parse and validate the raw scheme table.
pub fn parse_schemes(content: &str) -> Result<ParsedSchemes, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    let columns = Columns {
        headers: reader
            .headers()
            .map_err(|e| AppError::DataIntegrity(format!("schemes table: unreadable header: {e}")))?
            .clone(),
    };

    let name_idx = columns.require(COL_NAME)?;
    let category_idx = columns.require(COL_CATEGORY)?;
    let description_idx = columns.require(COL_DESCRIPTION)?;
    let link_idx = columns.require(COL_APPLY_LINK)?;
    let gender_idx = columns.require(COL_GENDER)?;
    let caste_idx = columns.require(COL_CASTE)?;
    let income_idx = columns.require(COL_INCOME)?;
    let occupation_idx = columns.require(COL_OCCUPATION)?;
    let state_idx = columns.require(COL_STATE)?;
    let min_age_idx = columns.require(COL_MIN_AGE)?;
    let max_age_idx = columns.require(COL_MAX_AGE)?;

    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 2;
        let row = record
            .map_err(|e| AppError::DataIntegrity(format!("schemes table line {line}: {e}")))?;
        let name = display_cell(&row, name_idx);
        if name.is_empty() {
            return Err(AppError::DataIntegrity(format!(
                "schemes table line {line}: empty scheme name"
            )));
        }

        let filters = SchemeFilters {
            gender: filter_cell(&row, Some(gender_idx)),
            caste: filter_cell(&row, Some(caste_idx)),
            income_max: filter_cell(&row, Some(income_idx)),
            occupation: filter_cell(&row, Some(occupation_idx)),
            disability: filter_cell(&row, columns.find(COL_DISABILITY)),
            marital_status: filter_cell(&row, columns.find(COL_MARITAL)),
            religion: filter_cell(&row, columns.find(COL_RELIGION)),
            state: filter_cell(&row, Some(state_idx)),
            education: filter_cell(&row, columns.find(COL_EDUCATION)),
            minority: filter_cell(&row, columns.find(COL_MINORITY)),
            for_orphans: filter_cell(&row, columns.find(COL_ORPHANS)),
        };
        let income_ceiling = income_ceiling(&filters.income_max);
        let min_age = NumericBound::parse(&display_cell(&row, min_age_idx));
        let max_age = NumericBound::parse(&display_cell(&row, max_age_idx));

        let mut note = |column: &'static str, value: &str| {
            warnings.push(EligibilityParseWarning {
                scheme: name.clone(),
                column,
                value: value.to_string(),
            });
        };
        if let IncomeCeiling::Malformed(value) = &income_ceiling {
            note(COL_INCOME, value);
        }
        if let NumericBound::Malformed(value) = &min_age {
            note(COL_MIN_AGE, value);
        }
        if let NumericBound::Malformed(value) = &max_age {
            note(COL_MAX_AGE, value);
        }

        entries.push(SchemeEntry {
            category: display_cell(&row, category_idx),
            description: display_cell(&row, description_idx),
            apply_link: display_cell(&row, link_idx),
            name,
            filters,
            income_ceiling,
            min_age,
            max_age,
        });
    }

    if entries.is_empty() {
        return Err(AppError::EmptyCatalog);
    }

    Ok(ParsedSchemes {
        entries,
        warnings,
        fingerprint: format!("{:x}", Sha256::digest(content.as_bytes())),
    })
}

/// One scheme and its precomputed embedding.
#[derive(Debug, Clone)]
pub struct IndexedScheme {
    pub entry: SchemeEntry,
    pub vector: Vec<f32>,
}

/// Immutable, embedded scheme catalogue shared across requests.
pub struct SchemeCatalog {
    schemes: Vec<IndexedScheme>,
    fingerprint: String,
    embedder: Arc<dyn TextEmbedder>,
}

impl SchemeCatalog {
    pub async fn load(path: &Path, embedder: Arc<dyn TextEmbedder>) -> Result<Self, AppError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_entries(parse_schemes(&content)?, embedder).await
    }

    pub async fn from_entries(
        parsed: ParsedSchemes,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self, AppError> {
        let ParsedSchemes {
            entries,
            warnings,
            fingerprint,
        } = parsed;
        for warning in &warnings {
            warn!(
                scheme = %warning.scheme,
                column = warning.column,
                value = %warning.value,
                "malformed eligibility bound, treated as unconstrained"
            );
        }

        let texts: Vec<String> = entries.iter().map(SchemeEntry::enrich_text).collect();
        let vectors = embedder.embed_documents(&texts).await?;
        if vectors.len() != entries.len() {
            return Err(CommonError::Embedding(format!(
                "embedder returned {} vectors for {} schemes",
                vectors.len(),
                entries.len()
            ))
            .into());
        }
        let schemes: Vec<IndexedScheme> = entries
            .into_iter()
            .zip(vectors)
            .map(|(entry, vector)| IndexedScheme { entry, vector })
            .collect();

        info!(
            schemes = schemes.len(),
            malformed_bounds = warnings.len(),
            dimensions = embedder.dimensions(),
            "scheme catalogue indexed"
        );

        Ok(Self {
            schemes,
            fingerprint,
            embedder,
        })
    }

    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(self.embedder.embed_query(text).await?)
    }

    pub fn schemes(&self) -> &[IndexedScheme] {
        &self.schemes
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}
