/// Localized explanation of matched sections.
///
/// Every translated string goes through [`Localizer`], which reports each field's outcome as a
/// `Result<String, TranslationFieldFailure>` and resolves failures to the English source text.
/// A failing field never aborts the narrative.
use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::warn;

use sahayak_common::capability::Translator;
use sahayak_common::language::DEFAULT_LANGUAGE;

use crate::model::{CatalogEntry, LegalCode, MatchResult};

const HEAVY_RULE: usize = 80;

/// Per-section steps shown under "What to do".
pub const SECTION_ACTIONS: [&str; 4] = [
    "File complaint under this section",
    "Register FIR at police station",
    "Keep all evidence safe",
    "Consult a lawyer",
];

/// Overall steps read out at the end of the audio and listed in the summary.
pub const RECOMMENDED_ACTIONS: [&str; 5] = [
    "File complaint at nearest police station",
    "Keep all evidence safe",
    "Get legal advice from a lawyer",
    "Ensure your safety",
    "Keep copy of FIR",
];

/// A single field whose translation failed. The source text stands in for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationFieldFailure {
    pub field: String,
    pub target_lang: String,
    pub source: String,
    pub cause: String,
}

impl fmt::Display for TranslationFieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translating field '{}' to {} failed: {}",
            self.field, self.target_lang, self.cause
        )
    }
}

impl std::error::Error for TranslationFieldFailure {}

/// Translates into one target language. English targets pass through untouched.
#[derive(Clone)]
pub struct Localizer {
    translator: Arc<dyn Translator>,
    target_lang: String,
}

impl Localizer {
    pub fn new(translator: Arc<dyn Translator>, target_lang: impl Into<String>) -> Self {
        Self {
            translator,
            target_lang: target_lang.into(),
        }
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub async fn try_localize(
        &self,
        field: &str,
        text: &str,
    ) -> Result<String, TranslationFieldFailure> {
        if self.target_lang == DEFAULT_LANGUAGE || text.trim().is_empty() {
            return Ok(text.to_string());
        }
        self.translator
            .translate(text, &self.target_lang)
            .await
            .map_err(|e| TranslationFieldFailure {
                field: field.to_string(),
                target_lang: self.target_lang.clone(),
                source: text.to_string(),
                cause: e.to_string(),
            })
    }

    /// Best available string for `text`: the translation, or the source on failure.
    pub async fn localize(&self, field: &str, text: &str) -> String {
        self.try_localize(field, text)
            .await
            .unwrap_or_else(|failure| {
                warn!(
                    field = %failure.field,
                    lang = %failure.target_lang,
                    cause = %failure.cause,
                    "translation failed, using source text"
                );
                failure.source
            })
    }

    /// Localize several labels, preserving order.
    pub async fn localize_all(&self, field: &str, texts: &[&str]) -> Vec<String> {
        join_all(texts.iter().map(|t| self.localize(field, t))).await
    }
}

/// One matched section with its fields in the caller's language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalizedSection {
    /// 1-based rank.
    pub section_number: usize,
    pub code: String,
    pub description: String,
    pub punishment: String,
    pub bailability: String,
    pub cognizable: String,
    pub category: String,
    pub what_to_do: Vec<String>,
}

/// Summary block of the narrative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeSummary {
    pub total_sections_found: usize,
    pub main_section: Option<LocalizedSection>,
    pub other_sections: Vec<LocalizedSection>,
    pub recommended_actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Narrative {
    pub language: String,
    pub legal_code: LegalCode,
    pub structured_info: Vec<LocalizedSection>,
    pub summary: NarrativeSummary,
    /// Display text, header plus one block per section.
    pub human_readable: String,
    /// Consolidated text handed to speech synthesis.
    pub tts_text: String,
}

/// Values only known once artifacts exist, closing out `formatted_output`.
#[derive(Debug, Clone, Default)]
pub struct FooterContext<'a> {
    pub audio_url: &'a str,
    pub pdf_english_url: &'a str,
    pub pdf_regional_url: &'a str,
    pub transcript: &'a str,
}

fn rule(c: char) -> String {
    c.to_string().repeat(HEAVY_RULE)
}

/// Speech block for one section, in English before translation.
fn speech_block(code: LegalCode, entry: &CatalogEntry) -> String {
    format!(
        "{} Section: {}. Description: {}. Punishment: {}. Bailable: {}. Cognizable: {}. Category: {}.",
        code.label(),
        entry.code,
        entry.description,
        entry.punishment,
        entry.bailability,
        entry.cognizability,
        entry.category,
    )
}

pub struct NarrativeBuilder {
    translator: Arc<dyn Translator>,
}

impl NarrativeBuilder {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    pub fn localizer(&self, lang: &str) -> Localizer {
        Localizer::new(Arc::clone(&self.translator), lang)
    }

    /// Build the structured info, display text and speech text for `result` in `lang`.
    ///
    /// Sections keep the order of `result`.
    pub async fn build(&self, result: &MatchResult, lang: &str) -> Narrative {
        let loc = self.localizer(lang);
        let code = result.legal_code;
        let label = code.label();

        let what_to_do = loc.localize_all("what_to_do", &SECTION_ACTIONS).await;
        let recommended_actions = loc
            .localize_all("recommended_actions", &RECOMMENDED_ACTIONS)
            .await;

        let mut structured_info = Vec::with_capacity(result.len());
        let mut speech_blocks = Vec::with_capacity(result.len());
        for (i, entry) in result.entries().enumerate() {
            structured_info.push(LocalizedSection {
                section_number: i + 1,
                code: entry.code.clone(),
                description: loc.localize("description", &entry.description).await,
                punishment: loc.localize("punishment", &entry.punishment).await,
                bailability: loc.localize("bailability", &entry.bailability.to_string()).await,
                cognizable: loc.localize("cognizable", &entry.cognizability.to_string()).await,
                category: loc.localize("category", &entry.category).await,
                what_to_do: what_to_do.clone(),
            });
            speech_blocks.push(loc.localize("speech_block", &speech_block(code, entry)).await);
        }

        let human_readable = self.render_sections(&loc, code, &structured_info).await;

        let intro = if result.is_empty() {
            format!("No matching {label} sections were found for your complaint.")
        } else {
            format!("According to your complaint, the following {label} sections apply:")
        };
        let intro = loc.localize("speech_intro", &intro).await;
        let steps_heading = loc
            .localize("speech_steps", "Please take the following steps:")
            .await;
        let steps: Vec<String> = recommended_actions
            .iter()
            .enumerate()
            .map(|(i, action)| format!("{}. {action}", i + 1))
            .collect();
        let tts_text = format!(
            "{intro}\n\n{}\n\n{steps_heading}\n{}",
            speech_blocks.join("\n"),
            steps.join("\n")
        );

        let summary = NarrativeSummary {
            total_sections_found: structured_info.len(),
            main_section: structured_info.first().cloned(),
            other_sections: structured_info.iter().skip(1).cloned().collect(),
            recommended_actions,
        };

        Narrative {
            language: lang.to_string(),
            legal_code: code,
            structured_info,
            summary,
            human_readable,
            tts_text,
        }
    }

    async fn render_sections(
        &self,
        loc: &Localizer,
        code: LegalCode,
        sections: &[LocalizedSection],
    ) -> String {
        let label = code.label();
        let heading = loc
            .localize(
                "heading",
                &format!("Your complaint matches the following {label} sections"),
            )
            .await;
        let matched = format!("Matched {label} Section");
        let labels = loc
            .localize_all(
                "label",
                &[
                    matched.as_str(),
                    "Description",
                    "Punishment",
                    "Bailability",
                    "Cognizable",
                    "Category",
                    "What to do",
                ],
            )
            .await;

        let mut out = vec![
            rule('='),
            format!("🌐 {heading} ({})", loc.target_lang().to_uppercase()),
            rule('='),
        ];
        if sections.is_empty() {
            out.push(
                loc.localize(
                    "no_match",
                    &format!("No matching {label} sections were found for your complaint."),
                )
                .await,
            );
        }
        for s in sections {
            let actions: Vec<String> = s.what_to_do.iter().map(|a| format!("- {a}")).collect();
            out.push(format!(
                "\n🔢 {} {}: {}\n\n📝 {}: {}\n\n⚖️ {}: {}\n\n🧷 {}: {}\n\n🚓 {}: {}\n\n📂 {}: {}\n\n🔍 {}:\n{}\n",
                labels[0],
                s.section_number,
                s.code,
                labels[1],
                s.description,
                labels[2],
                s.punishment,
                labels[3],
                s.bailability,
                labels[4],
                s.cognizable,
                labels[5],
                s.category,
                labels[6],
                actions.join("\n"),
            ));
            out.push(rule('-'));
        }
        out.join("\n")
    }

    /// Closing summary appended to the display text once artifacts are written.
    pub async fn summary_footer(&self, narrative: &Narrative, ctx: &FooterContext<'_>) -> String {
        let loc = self.localizer(&narrative.language);
        let label = narrative.legal_code.label();
        let total = narrative.summary.total_sections_found;
        let not_available = loc.localize("footer", "Not available").await;
        let url_or_na = |url: &str| {
            if url.is_empty() {
                not_available.clone()
            } else {
                url.to_string()
            }
        };

        let summary_label = format!("{label} Summary");
        let total_label = format!("Total {label} Sections Found");
        let t = loc
            .localize_all(
                "footer",
                &[
                    "Processing completed successfully!",
                    "Generated Files",
                    "Audio file",
                    "English PDF",
                    "Regional PDF",
                    "Language Information",
                    "Detected Language",
                    "Regional Language",
                    "Transcribed Text",
                    summary_label.as_str(),
                    total_label.as_str(),
                    "Main Section",
                    "Other Sections",
                    "additional sections found",
                    "Recommended Actions",
                ],
            )
            .await;

        let mut out = vec![
            format!("\n{}", rule('=')),
            format!("✅ {}", t[0]),
            rule('='),
            format!("\n📁 {}:", t[1]),
            format!("🎵 {}: {}", t[2], url_or_na(ctx.audio_url)),
            format!("📄 {}: {}", t[3], url_or_na(ctx.pdf_english_url)),
            format!("📄 {}: {}", t[4], url_or_na(ctx.pdf_regional_url)),
            format!("\n🌐 {}:", t[5]),
            format!("{}: {}", t[6], narrative.language),
            format!("{}: {}", t[7], narrative.language),
            format!("\n📝 {}:", t[8]),
            ctx.transcript.to_string(),
            format!("\n📊 {}:", t[9]),
            format!("{}: {total}", t[10]),
        ];
        if let Some(main) = &narrative.summary.main_section {
            out.push(format!("{}: {}", t[11], main.code));
        }
        if total > 1 {
            out.push(format!("{}: {} {}", t[12], total - 1, t[13]));
        }
        out.push(format!("\n🔍 {}:", t[14]));
        for (i, action) in narrative.summary.recommended_actions.iter().enumerate() {
            out.push(format!("{}. {action}", i + 1));
        }
        out.join("\n")
    }
}
