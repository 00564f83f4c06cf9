//! Data types for pages, chunks, retrieval results and answers.
//!
//! All offsets and lengths count `char`s, not bytes, so they line up with the
//! offsets extractive QA models report.

use serde::{Deserialize, Serialize};

/// Answer text of the record returned when no retrieved text fits the context.
pub const NO_CONTEXT_ANSWER: &str = "No relevant context found in the PDF.";

/// One page of extracted plain text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// 0-based page ordinal.
    pub number: usize,
    /// Extracted text; empty when the page has no extractable text.
    pub text: String,
}

impl Page {
    /// Create a page.
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        Self { number, text: text.into() }
    }
}

/// A bounded, trimmed window of a page's text. The atomic unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Trimmed chunk text, never empty.
    pub text: String,
    /// 0-based ordinal of the page the chunk was cut from.
    pub source_page: usize,
}

/// A chunk returned for a query, annotated for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedItem {
    /// The chunk text.
    pub text: String,
    /// 1-based page number.
    pub page: usize,
    /// Cosine similarity to the query (`1 - distance`).
    pub score: f32,
}

/// Where one retrieved text landed inside an assembled context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextPart {
    /// Position of the part within the context.
    pub index: usize,
    /// 1-based page number of the source chunk.
    pub page: usize,
    /// Start offset in the context, inclusive.
    pub start: usize,
    /// End offset in the context, exclusive.
    pub end: usize,
    /// The trimmed text placed at `start..end`.
    pub text: String,
}

impl ContextPart {
    /// Whether this part intersects the half-open span `start..end`.
    ///
    /// An empty span counts as overlapping the part that contains its position.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        if start == end {
            return self.start <= start && start < self.end;
        }
        self.start < end && start < self.end
    }
}

/// The result of answering one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerRecord {
    /// The answer text chosen by the QA model.
    pub answer: String,
    /// Model confidence for the answer.
    pub score: f32,
    /// Start of the answer span in `context`, when the model located one.
    pub start: Option<usize>,
    /// End of the answer span in `context`, when the model located one.
    pub end: Option<usize>,
    /// The assembled context the model answered from.
    pub context: String,
    /// Provenance of each slice of `context`.
    pub parts: Vec<ContextPart>,
}

impl AnswerRecord {
    /// The degenerate record used when no retrieved text fits the context.
    pub fn no_context() -> Self {
        Self {
            answer: NO_CONTEXT_ANSWER.to_string(),
            score: 0.0,
            start: None,
            end: None,
            context: String::new(),
            parts: Vec::new(),
        }
    }

    /// Whether this is the degenerate no-context record.
    pub fn is_no_context(&self) -> bool {
        self.context.is_empty() && self.parts.is_empty() && self.answer == NO_CONTEXT_ANSWER
    }

    /// The answer span as `(start, end)`, if the model located one.
    pub fn span(&self) -> Option<(usize, usize)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// The slice of `context` covered by the answer span.
    pub fn span_text(&self) -> Option<String> {
        let (start, end) = self.span()?;
        Some(char_slice(&self.context, start, end))
    }

    /// Context parts that overlap the answer span, for highlighting.
    pub fn highlighted_parts(&self) -> Vec<&ContextPart> {
        match self.span() {
            Some((start, end)) => self.parts.iter().filter(|p| p.overlaps(start, end)).collect(),
            None => Vec::new(),
        }
    }

    /// Distinct 1-based pages that contributed to the answer span, ascending.
    pub fn source_pages(&self) -> Vec<usize> {
        let mut pages: Vec<usize> = self.highlighted_parts().iter().map(|p| p.page).collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

/// Number of `char`s in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// The substring of `text` between char offsets `start..end`, clamped to the text.
pub fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}
