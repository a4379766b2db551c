/// Legal-section catalogue: table parsing, integrity checks and the example embedding index.
///
/// Two CSV tables are read once at startup:
/// - queries: a code column ("BNS Section" or "IPC Section") plus `Query1..QueryN` phrasings
/// - sections: the same code column plus Description, Punishment, Cognizable/Non-Cognizable,
///   Bailable/Non-Bailable, Category and an optional Name
///
/// Every phrasing is embedded once. The resulting [`CatalogIndex`] is immutable and shared
/// across requests behind an `Arc`.
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::info;

use sahayak_common::embedding::TextEmbedder;
use sahayak_common::error::CommonError;

use crate::error::AppError;
use crate::model::{Bailability, CatalogEntry, Cognizability, LegalCode, QueryExample};

const COL_NAME: &str = "Name";
const COL_DESCRIPTION: &str = "Description";
const COL_PUNISHMENT: &str = "Punishment";
const COL_COGNIZABILITY: &str = "Cognizable/Non-Cognizable";
const COL_BAILABILITY: &str = "Bailable/Non-Bailable";
const COL_CATEGORY: &str = "Category";

/// Parsed, validated catalogue tables before embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogTables {
    pub legal_code: LegalCode,
    pub entries: Vec<CatalogEntry>,
    pub examples: Vec<QueryExample>,
    /// SHA-256 over both raw tables.
    pub fingerprint: String,
}

struct Table {
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl Table {
    fn read(content: &str, table: &str) -> Result<Self, AppError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());
        let headers = reader
            .headers()
            .map_err(|e| AppError::DataIntegrity(format!("{table} table: unreadable header: {e}")))?
            .clone();
        let rows = reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::DataIntegrity(format!("{table} table: malformed row: {e}")))?;
        Ok(Self { headers, rows })
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    fn require(&self, name: &str, table: &str) -> Result<usize, AppError> {
        self.column(name).ok_or_else(|| {
            AppError::DataIntegrity(format!("{table} table is missing required column '{name}'"))
        })
    }
}

fn cell(row: &csv::StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or_default()
}

/// Work out which code column the queries table is keyed by.
fn detect_legal_code(queries: &Table) -> Result<(LegalCode, usize), AppError> {
    LegalCode::ALL
        .iter()
        .find_map(|code| queries.column(code.column()).map(|idx| (*code, idx)))
        .ok_or_else(|| {
            AppError::DataIntegrity(
                "queries table has neither a 'BNS Section' nor an 'IPC Section' column".to_string(),
            )
        })
}

/// `QueryN` columns ordered by N.
fn query_columns(queries: &Table) -> Result<Vec<usize>, AppError> {
    let query_re = Regex::new(r"(?i)^query\s*(\d+)$").expect("valid regex");
    let mut columns: Vec<(u32, usize)> = queries
        .headers
        .iter()
        .enumerate()
        .filter_map(|(idx, header)| {
            let caps = query_re.captures(header)?;
            caps[1].parse::<u32>().ok().map(|n| (n, idx))
        })
        .collect();
    if columns.is_empty() {
        return Err(AppError::DataIntegrity(
            "queries table has no QueryN columns".to_string(),
        ));
    }
    columns.sort_by_key(|(n, _)| *n);
    Ok(columns.into_iter().map(|(_, idx)| idx).collect())
}

fn parse_sections(
    sections: &Table,
    legal_code: LegalCode,
) -> Result<Vec<CatalogEntry>, AppError> {
    const TABLE: &str = "sections";
    let code_idx = sections.require(legal_code.column(), TABLE)?;
    let description_idx = sections.require(COL_DESCRIPTION, TABLE)?;
    let punishment_idx = sections.require(COL_PUNISHMENT, TABLE)?;
    let cognizability_idx = sections.require(COL_COGNIZABILITY, TABLE)?;
    let bailability_idx = sections.require(COL_BAILABILITY, TABLE)?;
    let category_idx = sections.require(COL_CATEGORY, TABLE)?;
    let name_idx = sections.column(COL_NAME);

    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(sections.rows.len());
    for (i, row) in sections.rows.iter().enumerate() {
        // +2: one for the header, one for 1-based line numbers.
        let line = i + 2;
        let code = cell(row, code_idx);
        if code.is_empty() {
            return Err(AppError::DataIntegrity(format!(
                "sections table line {line}: empty section code"
            )));
        }
        if !seen.insert(code.to_string()) {
            return Err(AppError::DataIntegrity(format!(
                "sections table line {line}: duplicate section code '{code}'"
            )));
        }

        let raw_cognizability = cell(row, cognizability_idx);
        let cognizability = Cognizability::parse(raw_cognizability).ok_or_else(|| {
            AppError::DataIntegrity(format!(
                "sections table line {line}: unrecognized cognizability '{raw_cognizability}'"
            ))
        })?;
        let raw_bailability = cell(row, bailability_idx);
        let bailability = Bailability::parse(raw_bailability).ok_or_else(|| {
            AppError::DataIntegrity(format!(
                "sections table line {line}: unrecognized bailability '{raw_bailability}'"
            ))
        })?;

        let description = cell(row, description_idx).to_string();
        let name = name_idx
            .map(|idx| cell(row, idx))
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| description.clone());

        entries.push(CatalogEntry {
            code: code.to_string(),
            name,
            description,
            punishment: cell(row, punishment_idx).to_string(),
            category: cell(row, category_idx).to_string(),
            cognizability,
            bailability,
        });
    }
    Ok(entries)
}

/// Parse and cross-check the two catalogue tables.
///
/// Fails with [`AppError::DataIntegrity`] when a required column is missing, a section code
/// repeats, an enum cell is unrecognized, or a phrasing references a code absent from the
/// sections table. Fails with [`AppError::EmptyCatalog`] when nothing is left to index.
pub fn parse_tables(queries_csv: &str, sections_csv: &str) -> Result<CatalogTables, AppError> {
    let queries = Table::read(queries_csv, "queries")?;
    let sections = Table::read(sections_csv, "sections")?;

    let (legal_code, code_idx) = detect_legal_code(&queries)?;
    let query_cols = query_columns(&queries)?;
    let entries = parse_sections(&sections, legal_code)?;
    let known: HashSet<&str> = entries.iter().map(|e| e.code.as_str()).collect();

    let mut examples = Vec::new();
    for (i, row) in queries.rows.iter().enumerate() {
        let line = i + 2;
        let code = cell(row, code_idx);
        if code.is_empty() {
            return Err(AppError::DataIntegrity(format!(
                "queries table line {line}: empty section code"
            )));
        }
        if !known.contains(code) {
            return Err(AppError::DataIntegrity(format!(
                "queries table line {line}: section '{code}' does not exist in the sections table"
            )));
        }
        for &col in &query_cols {
            let text = cell(row, col);
            if !text.is_empty() {
                examples.push(QueryExample {
                    text: text.to_string(),
                    code: code.to_string(),
                });
            }
        }
    }

    if entries.is_empty() || examples.is_empty() {
        return Err(AppError::EmptyCatalog);
    }

    let mut hasher = Sha256::new();
    hasher.update(queries_csv.as_bytes());
    hasher.update([0u8]);
    hasher.update(sections_csv.as_bytes());
    let fingerprint = format!("{:x}", hasher.finalize());

    Ok(CatalogTables {
        legal_code,
        entries,
        examples,
        fingerprint,
    })
}

/// One embedded phrasing.
#[derive(Debug, Clone)]
pub struct IndexedExample {
    pub example: QueryExample,
    /// Position of the referenced entry in [`CatalogIndex::all_entries`].
    pub entry_idx: usize,
    pub vector: Vec<f32>,
}

/// Every phrasing with its vector, in table order.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    rows: Vec<IndexedExample>,
}

impl EmbeddingIndex {
    pub fn rows(&self) -> &[IndexedExample] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `(phrasing, code)` pairs in index order.
    #[cfg(test)]
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.rows
            .iter()
            .map(|r| (r.example.text.as_str(), r.example.code.as_str()))
            .collect()
    }
}

pub struct CatalogIndex {
    legal_code: LegalCode,
    entries: Vec<CatalogEntry>,
    index: EmbeddingIndex,
    fingerprint: String,
    embedder: Arc<dyn TextEmbedder>,
}

impl CatalogIndex {
    /// Read both tables from disk and build the index.
    pub async fn load(
        queries_path: &Path,
        sections_path: &Path,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self, AppError> {
        let read = |path: &Path| {
            std::fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("failed to read {}: {e}", path.display()))
            })
        };
        let queries = read(queries_path)?;
        let sections = read(sections_path)?;
        let tables = parse_tables(&queries, &sections)?;
        Self::from_tables(tables, embedder).await
    }

    pub async fn from_tables(
        tables: CatalogTables,
        embedder: Arc<dyn TextEmbedder>,
    ) -> Result<Self, AppError> {
        let CatalogTables {
            legal_code,
            entries,
            examples,
            fingerprint,
        } = tables;

        let positions: HashMap<&str, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.code.as_str(), i))
            .collect();

        let texts: Vec<String> = examples.iter().map(|e| e.text.clone()).collect();
        let vectors = embedder.embed_documents(&texts).await?;
        if vectors.len() != examples.len() {
            return Err(CommonError::Embedding(format!(
                "embedder returned {} vectors for {} phrasings",
                vectors.len(),
                examples.len()
            ))
            .into());
        }

        let mut rows = Vec::with_capacity(examples.len());
        for (example, vector) in examples.into_iter().zip(vectors) {
            let entry_idx = *positions.get(example.code.as_str()).ok_or_else(|| {
                AppError::DataIntegrity(format!("dangling section reference '{}'", example.code))
            })?;
            rows.push(IndexedExample {
                example,
                entry_idx,
                vector,
            });
        }

        info!(
            legal_code = legal_code.label(),
            sections = entries.len(),
            phrasings = rows.len(),
            dimensions = embedder.dimensions(),
            "catalogue indexed"
        );

        Ok(Self {
            legal_code,
            entries,
            index: EmbeddingIndex { rows },
            fingerprint,
            embedder,
        })
    }

    /// Embed arbitrary text with the same model the index was built with.
    pub async fn embeddings_of(&self, text: &str) -> Result<Vec<f32>, AppError> {
        Ok(self.embedder.embed_query(text).await?)
    }

    pub fn all_entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[cfg(test)]
    pub fn entry(&self, code: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    pub fn legal_code(&self) -> LegalCode {
        self.legal_code
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{QUERIES_CSV, SECTIONS_CSV};
    use sahayak_common::embedding::HashingEmbedder;

    #[test]
    fn parses_fixture_tables() {
        let tables = parse_tables(QUERIES_CSV, SECTIONS_CSV).unwrap();
        assert_eq!(tables.legal_code, LegalCode::Bns);
        assert_eq!(tables.entries.len(), 5);
        // Blank query cells are skipped.
        assert_eq!(tables.examples.len(), 13);
        assert_eq!(tables.examples[0].text, "someone stole my phone");
        assert_eq!(tables.examples[0].code, "BNS-303");
        let theft = &tables.entries[0];
        assert_eq!(theft.name, "Theft");
        assert_eq!(theft.cognizability, Cognizability::Cognizable);
    }

    #[test]
    fn query_columns_follow_numeric_order() {
        let queries = "BNS Section,Query10,Query2,Query1\nBNS-303,ten,two,one\n";
        let tables = parse_tables(queries, SECTIONS_CSV).unwrap();
        let texts: Vec<&str> = tables.examples.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "ten"]);
    }

    #[test]
    fn ipc_catalogue_without_name_falls_back_to_description() {
        let queries = "IPC Section,Query1\nIPC 379,my bicycle was stolen\n";
        let sections = "IPC Section,Description,Punishment,Cognizable/Non-Cognizable,Bailable/Non-Bailable,Category\n\
                        IPC 379,Punishment for theft,3 years,Cognizable,Non-Bailable,Property\n";
        let tables = parse_tables(queries, sections).unwrap();
        assert_eq!(tables.legal_code, LegalCode::Ipc);
        assert_eq!(tables.entries[0].name, "Punishment for theft");
    }

    #[test]
    fn dangling_reference_is_fatal() {
        let queries = "BNS Section,Query1\nBNS-999,something odd happened\n";
        let err = parse_tables(queries, SECTIONS_CSV).unwrap_err();
        assert!(matches!(err, AppError::DataIntegrity(ref m) if m.contains("BNS-999")), "{err}");
    }

    #[test]
    fn missing_required_column_is_fatal() {
        let sections = "BNS Section,Description,Punishment,Category\nBNS-303,Theft,3 years,Property\n";
        let err = parse_tables(QUERIES_CSV, sections).unwrap_err();
        assert!(
            matches!(err, AppError::DataIntegrity(ref m) if m.contains("Cognizable/Non-Cognizable")),
            "{err}"
        );
    }

    #[test]
    fn duplicate_section_code_is_fatal() {
        let sections = format!(
            "{SECTIONS_CSV}BNS-303,Theft again,Dup,3 years,Cognizable,Bailable,Property\n"
        );
        let err = parse_tables(QUERIES_CSV, &sections).unwrap_err();
        assert!(matches!(err, AppError::DataIntegrity(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn missing_code_column_is_fatal() {
        let err = parse_tables("Section,Query1\nX,y\n", SECTIONS_CSV).unwrap_err();
        assert!(matches!(err, AppError::DataIntegrity(_)));
    }

    #[test]
    fn empty_tables_are_rejected() {
        let sections_header = SECTIONS_CSV.lines().next().unwrap();
        let err = parse_tables("BNS Section,Query1\n", sections_header).unwrap_err();
        assert!(matches!(err, AppError::EmptyCatalog));
    }

    #[tokio::test]
    async fn loading_twice_yields_identical_pairs() {
        let embedder: Arc<dyn TextEmbedder> = Arc::new(HashingEmbedder::default());
        let first = CatalogIndex::from_tables(
            parse_tables(QUERIES_CSV, SECTIONS_CSV).unwrap(),
            Arc::clone(&embedder),
        )
        .await
        .unwrap();
        let second = CatalogIndex::from_tables(
            parse_tables(QUERIES_CSV, SECTIONS_CSV).unwrap(),
            embedder,
        )
        .await
        .unwrap();
        assert_eq!(first.index().pairs(), second.index().pairs());
        assert_eq!(first.fingerprint(), second.fingerprint());
        for (a, b) in first.index().rows().iter().zip(second.index().rows()) {
            assert_eq!(a.vector, b.vector);
        }
    }

    #[tokio::test]
    async fn every_indexed_phrasing_points_at_its_entry() {
        let catalog = CatalogIndex::from_tables(
            parse_tables(QUERIES_CSV, SECTIONS_CSV).unwrap(),
            Arc::new(HashingEmbedder::default()),
        )
        .await
        .unwrap();
        for row in catalog.index().rows() {
            assert_eq!(catalog.all_entries()[row.entry_idx].code, row.example.code);
            assert!(catalog.entry(&row.example.code).is_some());
        }
    }

    #[tokio::test]
    async fn load_shipped_catalogue() {
        let queries = Path::new("../../data/BNS_Queries.csv");
        let sections = Path::new("../../data/BNS_Section.csv");
        if !queries.exists() || !sections.exists() {
            eprintln!("skipping load_shipped_catalogue: data tables not found");
            return;
        }
        let catalog = CatalogIndex::load(queries, sections, Arc::new(HashingEmbedder::default()))
            .await
            .expect("shipped catalogue should load");
        assert!(catalog.all_entries().len() >= 10);
        assert!(catalog.index().len() > catalog.all_entries().len());
    }
}
