//! Extractive question answering model trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What an extractive QA model returns for one `(question, context)` pair.
///
/// `start` and `end` are char offsets into the context. Not every backend can
/// report them, so both are optional; consumers must branch on presence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaOutput {
    /// The selected answer text.
    pub answer: String,
    /// Model confidence.
    pub score: f32,
    /// Start of the answer span in the context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    /// End of the answer span in the context, exclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

impl QaOutput {
    /// An output with no answer and no span.
    pub fn unanswered() -> Self {
        Self { answer: String::new(), score: 0.0, start: None, end: None }
    }
}

/// A model that answers a question by selecting a span of the given context.
#[async_trait]
pub trait QaModel: Send + Sync {
    /// Run one inference over `context`.
    async fn infer(&self, question: &str, context: &str) -> Result<QaOutput>;

    /// Return a short identifier for the underlying model.
    fn name(&self) -> &str;
}
