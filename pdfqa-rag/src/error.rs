//! Error types for the `pdfqa-rag` crate.

use thiserror::Error;

/// Errors that can occur while indexing a document or answering a question.
#[derive(Debug, Error)]
pub enum QaError {
    /// The document bytes could not be parsed.
    ///
    /// The message is safe to show to an end user as-is.
    #[error("Invalid or corrupted document: {0}")]
    MalformedDocument(String),

    /// A similarity index was requested over zero vectors, which happens when
    /// the document has no extractable text.
    #[error("Document has no content to search")]
    EmptyIndex,

    /// A vector did not have the dimensionality of the index.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality the index was built with.
        expected: usize,
        /// The dimensionality that was supplied.
        actual: usize,
    },

    /// The number of embedding vectors did not match the number of chunks.
    #[error("Index mismatch: {chunks} chunks but {vectors} vectors")]
    IndexMismatch {
        /// Number of chunks handed to the index.
        chunks: usize,
        /// Number of vectors returned by the embedder.
        vectors: usize,
    },

    /// An embedding, QA or speech model failed to load or respond.
    #[error("Model unavailable ({model}): {message}")]
    ModelUnavailable {
        /// The model or backend that failed.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// A question was asked before any document was loaded.
    #[error("No document loaded")]
    NoDocumentLoaded,

    /// The question was empty after trimming.
    #[error("Question must not be empty")]
    EmptyQuestion,

    /// Speech input could not be turned into a question.
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Audio bytes were not a supported WAV stream.
    #[error("Malformed audio: {0}")]
    MalformedAudio(String),

    /// A chat session event is not valid in the current state.
    #[error("Invalid session transition: {event} while {state}")]
    InvalidTransition {
        /// The state the session was in.
        state: &'static str,
        /// The rejected event.
        event: &'static str,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl QaError {
    /// Convenience constructor for [`QaError::ModelUnavailable`].
    pub fn model_unavailable(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelUnavailable { model: model.into(), message: message.into() }
    }
}

/// A convenience result type for pdfqa operations.
pub type Result<T> = std::result::Result<T, QaError>;
