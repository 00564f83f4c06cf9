//! Context assembly and extractive answering.
//!
//! Retrieved texts are packed greedily, in retrieval order, into one context
//! string joined by [`SEPARATOR`]. Packing stops at the first text that would
//! exceed the budget; later (possibly shorter) texts are not tried. Every kept
//! text is recorded as a [`ContextPart`] with its char offsets so an answer
//! span can be traced back to its source pages.

use tracing::{debug, error, warn};

use crate::document::{AnswerRecord, ContextPart, RetrievedItem, char_len};
use crate::error::Result;
use crate::qa::QaModel;

/// Separator placed between packed texts.
pub const SEPARATOR: &str = "\n\n";

const SEPARATOR_LEN: usize = 2;

/// A packed context and the provenance of each of its slices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PackedContext {
    /// The joined context string.
    pub context: String,
    /// One part per kept text, in context order.
    pub parts: Vec<ContextPart>,
}

impl PackedContext {
    /// Whether nothing was kept.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Pack `retrieved` into a context of at most `max_context_chars` text chars
/// (separators not counted).
pub fn pack_context(retrieved: &[RetrievedItem], max_context_chars: usize) -> PackedContext {
    let mut kept: Vec<(&str, usize)> = Vec::new();
    let mut char_count = 0;
    for item in retrieved {
        let text = item.text.trim();
        if text.is_empty() {
            continue;
        }
        let len = char_len(text);
        if char_count + len > max_context_chars {
            break;
        }
        kept.push((text, item.page));
        char_count += len;
    }

    let mut parts = Vec::with_capacity(kept.len());
    let mut offset = 0;
    for (index, (text, page)) in kept.iter().enumerate() {
        let start = offset;
        let end = start + char_len(text);
        parts.push(ContextPart { index, page: *page, start, end, text: (*text).to_string() });
        offset = end + SEPARATOR_LEN;
    }

    let context = kept.iter().map(|(text, _)| *text).collect::<Vec<_>>().join(SEPARATOR);
    PackedContext { context, parts }
}

/// Answer `question` from the `retrieved` chunks with one QA inference.
///
/// Returns [`AnswerRecord::no_context`] without calling the model when nothing
/// fits the budget. Model offsets are passed through; a pair that is
/// incomplete or does not fit inside the context is reported as absent.
///
/// # Errors
///
/// Propagates QA model failures.
pub async fn answer(
    question: &str,
    retrieved: &[RetrievedItem],
    qa_model: &dyn QaModel,
    max_context_chars: usize,
) -> Result<AnswerRecord> {
    let packed = pack_context(retrieved, max_context_chars);
    if packed.is_empty() {
        debug!(retrieved = retrieved.len(), "no context to answer from");
        return Ok(AnswerRecord::no_context());
    }

    let output = qa_model.infer(question, &packed.context).await.map_err(|e| {
        error!(model = qa_model.name(), error = %e, "qa inference failed");
        e
    })?;

    let context_len = char_len(&packed.context);
    let (start, end) = match (output.start, output.end) {
        (Some(start), Some(end)) if start <= end && end <= context_len => (Some(start), Some(end)),
        (None, None) => (None, None),
        (start, end) => {
            warn!(model = qa_model.name(), ?start, ?end, context_len, "discarding invalid answer span");
            (None, None)
        }
    };

    debug!(
        model = qa_model.name(),
        parts = packed.parts.len(),
        context_len,
        score = output.score,
        "answered from context"
    );

    Ok(AnswerRecord {
        answer: output.answer,
        score: output.score,
        start,
        end,
        context: packed.context,
        parts: packed.parts,
    })
}
