//! # pdfqa-rag
//!
//! Retrieval-augmented extractive question answering over a single PDF.
//!
//! A document is split into per-page text, cut into overlapping character
//! windows, embedded and indexed for exact cosine search. A question is
//! embedded the same way, its nearest chunks are packed into a bounded
//! context, and an extractive QA model selects the answer span. The answer
//! comes back with the context and the page provenance of every slice, so a
//! front end can highlight where the answer was found.
//!
//! ## Features
//!
//! - `fastembed`: local `all-MiniLM-L6-v2` embeddings via [`FastEmbedProvider`]
//! - `huggingface`: hosted QA, embeddings and speech recognition
//! - `full`: everything
//!
//! Without features the crate still answers questions end to end with
//! [`HashingEmbedder`] and [`LexicalQaModel`], which need no model files.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdfqa_rag::{DocumentQa, HashingEmbedder, LexicalQaModel};
//!
//! let qa = DocumentQa::builder()
//!     .embedder(Arc::new(HashingEmbedder::default()))
//!     .qa_model(Arc::new(LexicalQaModel::new()))
//!     .build()?;
//! qa.load_document(&pdf_bytes).await?;
//! let record = qa.ask("What is mango?").await?;
//! println!("{} (pages {:?})", record.answer, record.source_pages());
//! ```

pub mod answer;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod hashing;
pub mod index;
pub mod lexical;
pub mod model_cache;
pub mod pipeline;
pub mod qa;
pub mod retriever;
pub mod session;
pub mod speech;

#[cfg(feature = "fastembed")]
pub mod fastembed;
#[cfg(feature = "huggingface")]
pub mod huggingface;

pub use answer::{PackedContext, SEPARATOR, answer, pack_context};
pub use chunking::{Chunker, PageChunker, chunk_texts, chunk_windows};
pub use config::{QaConfig, QaConfigBuilder};
pub use document::{AnswerRecord, Chunk, ContextPart, NO_CONTEXT_ANSWER, Page, RetrievedItem};
pub use embedding::EmbeddingProvider;
pub use error::{QaError, Result};
pub use extract::{DocumentExtractor, PdfExtractor, PlainTextExtractor};
pub use hashing::HashingEmbedder;
pub use index::{DocumentIndex, Neighbor, SimilarityIndex};
pub use lexical::LexicalQaModel;
pub use model_cache::ModelCache;
pub use pipeline::{DocumentQa, DocumentQaBuilder, IndexSummary};
pub use qa::{QaModel, QaOutput};
pub use retriever::retrieve;
pub use session::{ChatSession, HistoryEntry, SessionEvent, SessionState};
pub use speech::{AudioClip, AudioFormat, Transcriber};

#[cfg(feature = "fastembed")]
pub use crate::fastembed::FastEmbedProvider;
#[cfg(feature = "huggingface")]
pub use huggingface::{HfClient, HfEmbeddingProvider, HfQaModel, HfTranscriber};
