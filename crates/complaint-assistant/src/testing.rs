/// In-crate fakes for the capability traits and a small fixture catalogue.
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;

use sahayak_common::capability::{
    Capabilities, DocumentRenderer, SpeechSynthesizer, Transcriber, Transcript, Translator,
};
use sahayak_common::embedding::{HashingEmbedder, TextEmbedder};
use sahayak_common::error::CommonError;
use sahayak_common::language::ScriptLanguageDetector;

use crate::catalog::{parse_tables, CatalogIndex};
use crate::model::{Bailability, CatalogEntry, Cognizability};

pub const QUERIES_CSV: &str = "\
BNS Section,Category,Query1,Query2,Query3
BNS-303,Property,someone stole my phone,my mobile was stolen,a thief took my bag
BNS-309,Property,robbers snatched my chain at knife point,I was robbed on the street,
BNS-115,Body,someone hurt me,I was beaten and injured,he hit me with a stick
BNS-131,Body,the thief assaulted me,a man attacked me on the road,I was pushed and slapped
BNS-318,Fraud,I was cheated of money,someone defrauded me online,
";

pub const SECTIONS_CSV: &str = "\
BNS Section,Name,Description,Punishment,Cognizable/Non-Cognizable,Bailable/Non-Bailable,Category
BNS-303,Theft,Dishonestly taking movable property out of a person's possession,Imprisonment up to 3 years or fine or both,Cognizable,Non-Bailable,Property
BNS-309,Robbery,Theft or extortion accompanied by force or fear of instant hurt,Rigorous imprisonment up to 10 years and fine,Cognizable,Non-Bailable,Property
BNS-115,Voluntarily causing hurt,Voluntarily causing bodily pain or injury to a person,Imprisonment up to 1 year or fine up to 10000 rupees,Non-Cognizable,Bailable,Body
BNS-131,Assault,Assault or criminal force otherwise than on grave provocation,Imprisonment up to 3 months or fine up to 1000 rupees,Non-Cognizable,Bailable,Body
BNS-318,Cheating,Deceiving a person to deliver property or cause loss,Imprisonment up to 3 years or fine or both,Non-Cognizable,Bailable,Fraud
";

pub fn sample_entry() -> CatalogEntry {
    CatalogEntry {
        code: "BNS-303".into(),
        name: "Theft".into(),
        description: "Dishonestly taking movable property".into(),
        punishment: "Imprisonment up to 3 years".into(),
        category: "Property".into(),
        cognizability: Cognizability::Cognizable,
        bailability: Bailability::NonBailable,
    }
}

pub async fn catalog_from(queries: &str, sections: &str) -> Arc<CatalogIndex> {
    let tables = parse_tables(queries, sections).expect("fixture tables parse");
    Arc::new(
        CatalogIndex::from_tables(tables, Arc::new(HashingEmbedder::default()))
            .await
            .expect("fixture catalogue indexes"),
    )
}

pub async fn catalog_with(embedder: Arc<dyn TextEmbedder>) -> Arc<CatalogIndex> {
    let tables = parse_tables(QUERIES_CSV, SECTIONS_CSV).expect("fixture tables parse");
    Arc::new(
        CatalogIndex::from_tables(tables, embedder)
            .await
            .expect("fixture catalogue indexes"),
    )
}

pub async fn test_catalog() -> Arc<CatalogIndex> {
    catalog_from(QUERIES_CSV, SECTIONS_CSV).await
}

/// Returns registered vectors for exact texts and a zero vector for everything else.
pub struct StubEmbedder {
    dim: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: HashMap::new(),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    fn lookup(&self, text: &str) -> Vec<f32> {
        self.vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.dim])
    }
}

#[async_trait]
impl TextEmbedder for StubEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        Ok(texts.iter().map(|t| self.lookup(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, CommonError> {
        Ok(self.lookup(text))
    }

    fn dimensions(&self) -> usize {
        self.dim
    }
}

pub struct FakeTranscriber {
    transcript: Transcript,
}

impl FakeTranscriber {
    pub fn new(text: &str, language: &str) -> Self {
        Self {
            transcript: Transcript {
                text: text.to_string(),
                language: language.to_string(),
            },
        }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: Bytes, _file_name: &str) -> Result<Transcript, CommonError> {
        Ok(self.transcript.clone())
    }
}

pub struct FailingTranscriber;

#[async_trait]
impl Transcriber for FailingTranscriber {
    async fn transcribe(&self, _audio: Bytes, _file_name: &str) -> Result<Transcript, CommonError> {
        Err(CommonError::InvalidResponse("fake transcriber offline".into()))
    }
}

pub struct PanickingTranscriber;

#[async_trait]
impl Transcriber for PanickingTranscriber {
    async fn transcribe(&self, _audio: Bytes, _file_name: &str) -> Result<Transcript, CommonError> {
        panic!("transcriber exploded")
    }
}

/// Marks translations as `[lang] text` and counts calls.
#[derive(Default)]
pub struct PrefixTranslator {
    calls: AtomicUsize,
}

impl PrefixTranslator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Translator for PrefixTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, CommonError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("[{target_lang}] {text}"))
    }
}

pub struct FailingTranslator;

#[async_trait]
impl Translator for FailingTranslator {
    async fn translate(&self, _text: &str, _target_lang: &str) -> Result<String, CommonError> {
        Err(CommonError::InvalidResponse("fake translator offline".into()))
    }
}

/// Fails only for one exact input, prefix-translates the rest.
pub struct FailOnTranslator {
    needle: String,
    inner: PrefixTranslator,
}

impl FailOnTranslator {
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_string(),
            inner: PrefixTranslator::default(),
        }
    }
}

#[async_trait]
impl Translator for FailOnTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String, CommonError> {
        if text == self.needle {
            return Err(CommonError::InvalidResponse("fake translator rejected input".into()));
        }
        self.inner.translate(text, target_lang).await
    }
}

pub struct FakeSpeech;

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, lang_code: &str) -> Result<Bytes, CommonError> {
        Ok(Bytes::from(format!("ID3 {lang_code} {}", text.len())))
    }
}

pub struct FailingSpeech;

#[async_trait]
impl SpeechSynthesizer for FailingSpeech {
    async fn synthesize(&self, _text: &str, _lang_code: &str) -> Result<Bytes, CommonError> {
        Err(CommonError::InvalidResponse("fake speech offline".into()))
    }
}

/// Records every render call and returns a small fake PDF.
#[derive(Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingRenderer {
    pub fn calls(&self) -> Vec<(String, serde_json::Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentRenderer for RecordingRenderer {
    async fn render(
        &self,
        template_id: &str,
        fields: &serde_json::Value,
    ) -> Result<Bytes, CommonError> {
        self.calls
            .lock()
            .unwrap()
            .push((template_id.to_string(), fields.clone()));
        Ok(Bytes::from_static(b"%PDF-1.7 fake"))
    }
}

pub struct FailingRenderer;

#[async_trait]
impl DocumentRenderer for FailingRenderer {
    async fn render(
        &self,
        template_id: &str,
        _fields: &serde_json::Value,
    ) -> Result<Bytes, CommonError> {
        Err(CommonError::Render {
            template: template_id.to_string(),
            message: "fake renderer offline".into(),
        })
    }
}

/// Capabilities with prefix translation, fake speech and script detection.
pub fn capabilities(
    transcriber: Arc<dyn Transcriber>,
    renderer: Arc<dyn DocumentRenderer>,
) -> Capabilities {
    Capabilities {
        transcriber,
        translator: Arc::new(PrefixTranslator::default()),
        speech: Arc::new(FakeSpeech),
        renderer,
        detector: Arc::new(ScriptLanguageDetector),
    }
}
