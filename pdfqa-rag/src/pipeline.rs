//! Document QA orchestrator.
//!
//! [`DocumentQa`] composes a [`DocumentExtractor`], a [`Chunker`], an
//! [`EmbeddingProvider`] and a [`QaModel`] into the load-then-ask workflow:
//!
//! - load: extract pages → chunk → embed → build a [`DocumentIndex`] → install
//! - ask: embed question → top-k retrieval → pack context → extractive QA
//!
//! One document is loaded at a time. Loading a new one swaps in a freshly
//! built index only after every stage succeeded; a failed load keeps the
//! previous index. Questions read an `Arc` snapshot of the installed index, so
//! a concurrent load never changes the index an in-flight question is using.
//!
//! # Example
//!
//! ```rust,ignore
//! use pdfqa_rag::{DocumentQa, HashingEmbedder, LexicalQaModel, QaConfig};
//!
//! let qa = DocumentQa::builder()
//!     .config(QaConfig::default())
//!     .embedder(Arc::new(HashingEmbedder::default()))
//!     .qa_model(Arc::new(LexicalQaModel::new()))
//!     .build()?;
//!
//! qa.load_document(&std::fs::read("report.pdf")?).await?;
//! let record = qa.ask("What is mango?").await?;
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{Instrument, error, field, info, info_span, warn};

use crate::answer::answer;
use crate::chunking::{Chunker, PageChunker};
use crate::config::QaConfig;
use crate::document::{AnswerRecord, Page, RetrievedItem};
use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::extract::{DocumentExtractor, PdfExtractor};
use crate::index::DocumentIndex;
use crate::qa::QaModel;
use crate::retriever::retrieve;
use crate::speech::{AudioClip, Transcriber};

/// What a successful load produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSummary {
    /// Identifier of the installed index.
    pub document_id: String,
    /// Number of pages extracted.
    pub page_count: usize,
    /// Pages with no extractable text.
    pub empty_pages: usize,
    /// Number of indexed chunks.
    pub chunk_count: usize,
    /// Embedding dimensionality.
    pub dimensions: usize,
}

impl IndexSummary {
    fn of(index: &DocumentIndex, empty_pages: usize) -> Self {
        Self {
            document_id: index.document_id().to_string(),
            page_count: index.page_count(),
            empty_pages,
            chunk_count: index.len(),
            dimensions: index.dimensions(),
        }
    }
}

/// Question answering over one loaded document.
///
/// Construct one via [`DocumentQa::builder()`].
pub struct DocumentQa {
    config: QaConfig,
    extractor: Arc<dyn DocumentExtractor>,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    qa_model: Arc<dyn QaModel>,
    index: RwLock<Option<Arc<DocumentIndex>>>,
}

impl DocumentQa {
    /// Create a new [`DocumentQaBuilder`].
    pub fn builder() -> DocumentQaBuilder {
        DocumentQaBuilder::default()
    }

    /// The active configuration.
    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    /// The embedding provider used for chunks and questions.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// The extractive QA model.
    pub fn qa_model(&self) -> &Arc<dyn QaModel> {
        &self.qa_model
    }

    /// Chunk and embed `pages` into a new index without installing it.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::EmptyIndex`] if no page has any text, before the
    /// embedder is called. Embedding failures are propagated.
    pub async fn build_index(&self, pages: &[Page]) -> Result<DocumentIndex> {
        let chunks = self.chunker.chunk(pages);
        if chunks.is_empty() {
            warn!(page_count = pages.len(), "document has no extractable text");
            return Err(QaError::EmptyIndex);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(
                provider = self.embedder.name(),
                chunk_count = chunks.len(),
                error = %e,
                "embedding failed during indexing"
            );
            e
        })?;

        DocumentIndex::build(pages.len(), chunks, &vectors)
    }

    /// Extract, index and install a document, replacing any loaded one.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::MalformedDocument`] for unparseable bytes and
    /// [`QaError::EmptyIndex`] for a document without text. On any error the
    /// previously loaded document stays installed.
    pub async fn load_document(&self, bytes: &[u8]) -> Result<IndexSummary> {
        let span = info_span!("pdfqa.load_document", document.id = field::Empty, byte_len = bytes.len());
        async move {
            let pages = self.extractor.extract(bytes)?;
            self.install(pages).await
        }
        .instrument(span)
        .await
    }

    /// Index and install already extracted pages, replacing any loaded document.
    ///
    /// # Errors
    ///
    /// As [`build_index`](Self::build_index); the previous document stays
    /// installed on error.
    pub async fn load_pages(&self, pages: Vec<Page>) -> Result<IndexSummary> {
        let span = info_span!("pdfqa.load_document", document.id = field::Empty, byte_len = field::Empty);
        self.install(pages).instrument(span).await
    }

    async fn install(&self, pages: Vec<Page>) -> Result<IndexSummary> {
        let empty_pages = pages.iter().filter(|p| p.text.trim().is_empty()).count();
        if empty_pages > 0 {
            warn!(empty_pages, page_count = pages.len(), "pages without extractable text");
        }

        let index = self.build_index(&pages).await?;
        tracing::Span::current().record("document.id", index.document_id());
        let summary = IndexSummary::of(&index, empty_pages);

        *self.index.write().await = Some(Arc::new(index));
        info!(
            document.id = %summary.document_id,
            page_count = summary.page_count,
            chunk_count = summary.chunk_count,
            dimensions = summary.dimensions,
            "loaded document"
        );
        Ok(summary)
    }

    /// Drop the loaded document. Returns whether one was loaded.
    pub async fn clear_document(&self) -> bool {
        let previous = self.index.write().await.take();
        if let Some(index) = &previous {
            info!(document.id = %index.document_id(), "cleared document");
        }
        previous.is_some()
    }

    /// Whether a document is loaded.
    pub async fn has_document(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Snapshot of the installed index, if any.
    pub async fn current_index(&self) -> Option<Arc<DocumentIndex>> {
        self.index.read().await.clone()
    }

    async fn snapshot(&self) -> Result<Arc<DocumentIndex>> {
        self.current_index().await.ok_or(QaError::NoDocumentLoaded)
    }

    /// The `top_k` chunks of the loaded document most similar to `query`.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::NoDocumentLoaded`] without a document, and
    /// propagates embedding failures.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedItem>> {
        let index = self.snapshot().await?;
        let span = info_span!("pdfqa.retrieve", document.id = %index.document_id(), top_k = self.config.top_k);
        retrieve(query, self.embedder.as_ref(), &index, self.config.top_k).instrument(span).await
    }

    /// Answer `question` from the loaded document.
    ///
    /// Returns the sentinel record (see [`AnswerRecord::no_context`]) when no
    /// retrieved text fits the context budget.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::EmptyQuestion`] for a blank question and
    /// [`QaError::NoDocumentLoaded`] without a document. Model failures are
    /// propagated and leave the loaded document untouched.
    pub async fn ask(&self, question: &str) -> Result<AnswerRecord> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QaError::EmptyQuestion);
        }
        let index = self.snapshot().await?;

        let span = info_span!("pdfqa.ask", document.id = %index.document_id());
        async move {
            let retrieved = retrieve(question, self.embedder.as_ref(), &index, self.config.top_k)
                .instrument(info_span!("pdfqa.retrieve", top_k = self.config.top_k))
                .await?;

            let record = answer(question, &retrieved, self.qa_model.as_ref(), self.config.max_context_chars)
                .instrument(info_span!("pdfqa.answer", retrieved = retrieved.len()))
                .await?;

            info!(
                retrieved = retrieved.len(),
                parts = record.parts.len(),
                score = record.score,
                has_span = record.span().is_some(),
                "answered question"
            );
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Transcribe a spoken question and answer it.
    ///
    /// Returns the transcribed question alongside the answer.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::Transcription`] for an empty clip, a failed
    /// transcription or silence, then anything [`ask`](Self::ask) returns.
    pub async fn ask_spoken(
        &self,
        transcriber: &dyn Transcriber,
        clip: &AudioClip,
    ) -> Result<(String, AnswerRecord)> {
        if clip.is_empty() {
            return Err(QaError::Transcription("recording is empty".to_string()));
        }

        let text = transcriber.transcribe(clip).await.map_err(|e| {
            error!(model = transcriber.name(), error = %e, "transcription failed");
            if matches!(e, QaError::Transcription(_) | QaError::ModelUnavailable { .. }) {
                e
            } else {
                QaError::Transcription(e.to_string())
            }
        })?;

        let question = text.trim().to_string();
        if question.is_empty() {
            warn!(model = transcriber.name(), duration_ms = clip.duration_ms(), "no speech recognized");
            return Err(QaError::Transcription("no speech recognized".to_string()));
        }
        info!(model = transcriber.name(), question = %question, "transcribed question");

        let record = self.ask(&question).await?;
        Ok((question, record))
    }
}

/// Builder for constructing a [`DocumentQa`].
///
/// `embedder` and `qa_model` are required. The configuration defaults to
/// [`QaConfig::default`], the extractor to [`PdfExtractor`] and the chunker
/// to a [`PageChunker`] sized from the configuration.
#[derive(Default)]
pub struct DocumentQaBuilder {
    config: Option<QaConfig>,
    extractor: Option<Arc<dyn DocumentExtractor>>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    qa_model: Option<Arc<dyn QaModel>>,
}

impl DocumentQaBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: QaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document extractor.
    pub fn extractor(mut self, extractor: Arc<dyn DocumentExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Override the chunker built from the configuration.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the extractive QA model.
    pub fn qa_model(mut self, qa_model: Arc<dyn QaModel>) -> Self {
        self.qa_model = Some(qa_model);
        self
    }

    /// Build the [`DocumentQa`].
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] if a required field is missing.
    pub fn build(self) -> Result<DocumentQa> {
        let config = self.config.unwrap_or_default();
        let embedder =
            self.embedder.ok_or_else(|| QaError::ConfigError("embedder is required".to_string()))?;
        let qa_model =
            self.qa_model.ok_or_else(|| QaError::ConfigError("qa_model is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(PageChunker::new(config.chunk_size, config.chunk_overlap))
        });
        let extractor = self.extractor.unwrap_or_else(|| Arc::new(PdfExtractor::new()));

        Ok(DocumentQa { config, extractor, chunker, embedder, qa_model, index: RwLock::new(None) })
    }
}
