/// Audio complaint pipeline.
///
/// Stages run strictly in order:
/// `Received -> Transcribed -> Classified -> Narrated -> AudioSynthesized -> DocumentsRendered
/// -> Completed`. Transcription and rendering are required; a failure there fails the whole
/// request and removes whatever files the request already wrote. Speech synthesis failure is
/// logged and leaves `audio_url` empty.
///
/// [`ComplaintPipeline::run`] never returns an error or panics past its boundary: every outcome
/// is a [`ComplaintResponse`].
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Local;
use tracing::{error, info, warn};
use uuid::Uuid;

use sahayak_common::api::{ComplaintResponse, UserProfile};
use sahayak_common::capability::{Capabilities, Transcript};
use sahayak_common::error::CommonError;

use crate::artifacts::{
    template_for_language, speech_language, ArtifactKind, ArtifactStore, StoredArtifact,
};
use crate::catalog::CatalogIndex;
use crate::error::AppError;
use crate::letter::{conditional_translate, letter_fields, Complainant, LetterContent, LetterSection};
use crate::matcher::{DuplicatePolicy, SectionMatcher};
use crate::model::{LegalCode, MatchResult};
use crate::narrative::{FooterContext, Narrative, NarrativeBuilder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    Transcribed,
    Classified,
    Narrated,
    AudioSynthesized,
    DocumentsRendered,
    Completed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Received => "received",
            Self::Transcribed => "transcription",
            Self::Classified => "classification",
            Self::Narrated => "narration",
            Self::AudioSynthesized => "speech synthesis",
            Self::DocumentsRendered => "document rendering",
            Self::Completed => "completion",
        })
    }
}

/// Terminal failure: the stage being entered when the pipeline stopped, and why.
#[derive(Debug)]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    pub cause: AppError,
}

impl fmt::Display for PipelineFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage: {}", self.stage, self.cause)
    }
}

impl std::error::Error for PipelineFailure {}

fn at(stage: PipelineStage) -> impl FnOnce(AppError) -> PipelineFailure {
    move |cause| PipelineFailure { stage, cause }
}

fn render_error(template: &str, e: CommonError) -> AppError {
    match e {
        CommonError::Render { template, message } => AppError::Render { template, message },
        other => AppError::Render {
            template: template.to_string(),
            message: other.to_string(),
        },
    }
}

/// Output bundle of one successful run.
#[derive(Debug, Clone)]
pub struct ComplaintArtifacts {
    pub transcript: Transcript,
    pub matches: MatchResult,
    pub narrative: Narrative,
    pub formatted_output: String,
    pub audio: Option<StoredArtifact>,
    pub english_letter: StoredArtifact,
    pub regional_letter: StoredArtifact,
}

impl ComplaintArtifacts {
    pub fn into_response(self) -> ComplaintResponse {
        let sections: Vec<_> = self.matches.entries().map(|e| e.to_payload()).collect();
        let (bns_sections, ipc_sections) = match self.matches.legal_code {
            LegalCode::Bns => (sections, Vec::new()),
            LegalCode::Ipc => (Vec::new(), sections),
        };
        ComplaintResponse {
            success: true,
            transcribed_text: self.transcript.text,
            language: self.transcript.language,
            matched_sections: self.matches.codes(),
            bns_sections,
            ipc_sections,
            audio_url: self.audio.map(|a| a.url).unwrap_or_default(),
            pdf_english_url: self.english_letter.url,
            pdf_regional_url: self.regional_letter.url,
            formatted_output: self.formatted_output,
            error: None,
        }
    }
}

pub struct ComplaintPipeline {
    matcher: SectionMatcher,
    narrator: NarrativeBuilder,
    capabilities: Capabilities,
    store: ArtifactStore,
    top_k: usize,
}

impl ComplaintPipeline {
    pub fn new(
        catalog: Arc<CatalogIndex>,
        policy: DuplicatePolicy,
        capabilities: Capabilities,
        store: ArtifactStore,
        top_k: usize,
    ) -> Self {
        Self {
            matcher: SectionMatcher::new(catalog, policy),
            narrator: NarrativeBuilder::new(Arc::clone(&capabilities.translator)),
            capabilities,
            store,
            top_k,
        }
    }

    /// Process one complaint. The work runs on its own task so a panic inside any stage is
    /// reported as a failure response.
    pub async fn run(
        self: &Arc<Self>,
        audio: Bytes,
        file_name: String,
        profile: UserProfile,
    ) -> ComplaintResponse {
        let request_id = Uuid::new_v4();
        let this = Arc::clone(self);
        let handle =
            tokio::spawn(async move { this.execute(request_id, audio, &file_name, &profile).await });

        match handle.await {
            Ok(Ok(artifacts)) => {
                info!(
                    %request_id,
                    stage = %PipelineStage::Completed,
                    sections = artifacts.matches.len(),
                    speech_chars = artifacts.narrative.tts_text.len(),
                    "complaint processed"
                );
                artifacts.into_response()
            }
            Ok(Err(failure)) => {
                warn!(%request_id, stage = %failure.stage, error = %failure.cause, "complaint pipeline failed");
                ComplaintResponse::failure(failure.to_string())
            }
            Err(join_error) => {
                error!(%request_id, error = %join_error, "complaint pipeline task aborted");
                ComplaintResponse::failure(format!("complaint processing aborted: {join_error}"))
            }
        }
    }

    async fn execute(
        &self,
        request_id: Uuid,
        audio: Bytes,
        file_name: &str,
        profile: &UserProfile,
    ) -> Result<ComplaintArtifacts, PipelineFailure> {
        let mut written = Vec::new();
        let result = self
            .stages(request_id, audio, file_name, profile, &mut written)
            .await;
        if result.is_err() && !written.is_empty() {
            self.store.discard(&written).await;
        }
        result
    }

    async fn stages(
        &self,
        request_id: Uuid,
        audio: Bytes,
        file_name: &str,
        profile: &UserProfile,
        written: &mut Vec<StoredArtifact>,
    ) -> Result<ComplaintArtifacts, PipelineFailure> {
        info!(
            %request_id,
            stage = %PipelineStage::Received,
            bytes = audio.len(),
            file_name,
            "complaint received"
        );

        let transcript = self
            .capabilities
            .transcriber
            .transcribe(audio, file_name)
            .await
            .map_err(|e| AppError::Transcription(e.to_string()))
            .map_err(at(PipelineStage::Transcribed))?;
        let lang = transcript.language.clone();
        info!(
            %request_id,
            stage = %PipelineStage::Transcribed,
            lang = %lang,
            chars = transcript.text.len(),
            "transcribed"
        );

        let matches = self
            .matcher
            .classify(&transcript.text, self.top_k)
            .await
            .map_err(at(PipelineStage::Classified))?;
        match matches.matches.first() {
            None => {
                info!(%request_id, stage = %PipelineStage::Classified, "no catalogue section matched")
            }
            Some(best) => info!(
                %request_id,
                stage = %PipelineStage::Classified,
                codes = ?matches.codes(),
                closest_phrasing = %best.example,
                score = best.score,
                "classified"
            ),
        }

        let narrative = self.narrator.build(&matches, &lang).await;
        info!(%request_id, stage = %PipelineStage::Narrated, "narrative built");

        let audio = match self
            .capabilities
            .speech
            .synthesize(&narrative.tts_text, speech_language(&lang))
            .await
        {
            Ok(bytes) => {
                let stored = self
                    .store
                    .write(ArtifactKind::Audio, &bytes)
                    .await
                    .map_err(at(PipelineStage::AudioSynthesized))?;
                written.push(stored.clone());
                info!(%request_id, stage = %PipelineStage::AudioSynthesized, url = %stored.url, "audio written");
                Some(stored)
            }
            Err(e) => {
                warn!(%request_id, error = %e, "speech synthesis failed, continuing without audio");
                None
            }
        };

        let complainant = Complainant::from_profile(profile);
        let english = self.english_letter(&complainant, &transcript, &matches).await;
        let english_letter = self
            .render_letter(ArtifactKind::EnglishLetter, "en", &english, written)
            .await?;
        let regional = self
            .regional_letter(&complainant, &transcript, &matches)
            .await;
        let regional_letter = self
            .render_letter(ArtifactKind::RegionalLetter, &lang, &regional, written)
            .await?;
        info!(%request_id, stage = %PipelineStage::DocumentsRendered, "documents rendered");

        let footer = self
            .narrator
            .summary_footer(
                &narrative,
                &FooterContext {
                    audio_url: audio.as_ref().map(|a| a.url.as_str()).unwrap_or_default(),
                    pdf_english_url: &english_letter.url,
                    pdf_regional_url: &regional_letter.url,
                    transcript: &transcript.text,
                },
            )
            .await;
        let formatted_output = format!("{}\n{footer}", narrative.human_readable);

        Ok(ComplaintArtifacts {
            transcript,
            matches,
            narrative,
            formatted_output,
            audio,
            english_letter,
            regional_letter,
        })
    }

    async fn english_letter<'a>(
        &self,
        complainant: &'a Complainant,
        transcript: &Transcript,
        matches: &MatchResult,
    ) -> LetterContent<'a> {
        let caps = &self.capabilities;
        LetterContent {
            complainant,
            name: conditional_translate(&caps.translator, &caps.detector, &complainant.name, "en")
                .await,
            location: conditional_translate(
                &caps.translator,
                &caps.detector,
                &complainant.location,
                "en",
            )
            .await,
            complaint_summary: transcript.text.clone(),
            main_section: matches.main_entry().map(LetterSection::from_entry),
            other_sections: matches.other_entries().map(LetterSection::from_entry).collect(),
            date: Local::now().date_naive(),
        }
    }

    async fn regional_letter<'a>(
        &self,
        complainant: &'a Complainant,
        transcript: &Transcript,
        matches: &MatchResult,
    ) -> LetterContent<'a> {
        let caps = &self.capabilities;
        let lang = transcript.language.as_str();
        let loc = self.narrator.localizer(lang);

        let main_section = match matches.main_entry() {
            Some(entry) => Some(LetterSection::localized(entry, &loc).await),
            None => None,
        };
        let mut other_sections = Vec::new();
        for entry in matches.other_entries() {
            other_sections.push(LetterSection::localized(entry, &loc).await);
        }

        LetterContent {
            complainant,
            name: conditional_translate(&caps.translator, &caps.detector, &complainant.name, lang)
                .await,
            location: conditional_translate(
                &caps.translator,
                &caps.detector,
                &complainant.location,
                lang,
            )
            .await,
            complaint_summary: loc.localize("complaint_summary", &transcript.text).await,
            main_section,
            other_sections,
            date: Local::now().date_naive(),
        }
    }

    async fn render_letter(
        &self,
        kind: ArtifactKind,
        lang: &str,
        content: &LetterContent<'_>,
        written: &mut Vec<StoredArtifact>,
    ) -> Result<StoredArtifact, PipelineFailure> {
        let template = template_for_language(lang);
        let document = self
            .capabilities
            .renderer
            .render(&template, &letter_fields(content))
            .await
            .map_err(|e| render_error(&template, e))
            .map_err(at(PipelineStage::DocumentsRendered))?;
        let stored = self
            .store
            .write(kind, &document)
            .await
            .map_err(at(PipelineStage::DocumentsRendered))?;
        written.push(stored.clone());
        Ok(stored)
    }
}
