//! Shared fixtures: in-memory PDFs and scripted model stubs.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use pdfqa_rag::{
    AudioClip, DocumentQa, EmbeddingProvider, HashingEmbedder, LexicalQaModel, QaConfig, QaError,
    QaModel, QaOutput, Result, Transcriber,
};

/// Build a PDF with one page per entry; each line of an entry is its own text
/// object. An empty entry produces a page with an empty content stream.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut operations = Vec::new();
        for (row, line) in text.lines().enumerate() {
            let y = 720 - 14 * row as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id =
            doc.add_object(Stream::new(dictionary! {}, content.encode().expect("content encodes")));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("pdf serializes");
    bytes
}

/// A pipeline over hashing embeddings and the lexical model.
pub fn lexical_pipeline(config: QaConfig) -> DocumentQa {
    DocumentQa::builder()
        .config(config)
        .embedder(Arc::new(HashingEmbedder::default()))
        .qa_model(Arc::new(LexicalQaModel::new()))
        .build()
        .expect("pipeline builds")
}

/// Wraps an embedder and counts batch calls.
pub struct CountingEmbedder {
    inner: HashingEmbedder,
    pub calls: Arc<AtomicUsize>,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self { inner: HashingEmbedder::default(), calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Returns the same vector for every input.
pub struct FixedEmbedder(pub Vec<f32>);

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| self.0.clone()).collect())
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Returns a scripted output and records the contexts it was given.
pub struct ScriptedQaModel {
    pub output: QaOutput,
    pub contexts: std::sync::Mutex<Vec<String>>,
}

impl ScriptedQaModel {
    pub fn new(output: QaOutput) -> Self {
        Self { output, contexts: std::sync::Mutex::new(Vec::new()) }
    }

    pub fn call_count(&self) -> usize {
        self.contexts.lock().unwrap().len()
    }
}

#[async_trait]
impl QaModel for ScriptedQaModel {
    async fn infer(&self, _question: &str, context: &str) -> Result<QaOutput> {
        self.contexts.lock().unwrap().push(context.to_string());
        Ok(self.output.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Always fails as an unavailable model.
pub struct FailingQaModel;

#[async_trait]
impl QaModel for FailingQaModel {
    async fn infer(&self, _question: &str, _context: &str) -> Result<QaOutput> {
        Err(QaError::model_unavailable("failing", "weights missing"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Returns a fixed transcript.
pub struct ScriptedTranscriber(pub &'static str);

#[async_trait]
impl Transcriber for ScriptedTranscriber {
    async fn transcribe(&self, _clip: &AudioClip) -> Result<String> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &str {
        "scripted-asr"
    }
}
