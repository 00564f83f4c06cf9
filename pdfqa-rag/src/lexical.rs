//! Lexical term extraction and a sentence-overlap extractive QA model.
//!
//! [`LexicalQaModel`] needs no model files: it picks the sentence of the
//! context that shares the most content terms with the question. It is the
//! default answerer of the CLI and the deterministic model used in tests.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::qa::{QaModel, QaOutput};

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("word pattern is valid"));

const STOPWORDS: &[&str] = &[
    "about", "an", "and", "are", "as", "at", "be", "been", "but", "by", "can", "could", "did",
    "do", "does", "for", "from", "had", "has", "have", "how", "in", "into", "is", "it", "its",
    "me", "of", "on", "or", "tell", "than", "that", "the", "their", "them", "there", "these",
    "they", "this", "those", "to", "was", "we", "were", "what", "when", "where", "which", "who",
    "whom", "whose", "why", "will", "with", "would", "you", "your",
];

const SENTENCE_END: &[char] = &['.', '!', '?', '\n'];

/// Lowercased content terms of `text`, in order, with stopwords removed and a
/// trailing plural `s` stripped.
pub fn terms(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .filter_map(|m| {
            let word = m.as_str().to_lowercase();
            let is_number = word.chars().all(|c| c.is_numeric());
            if (word.chars().count() < 2 && !is_number) || STOPWORDS.contains(&word.as_str()) {
                return None;
            }
            Some(stem(word))
        })
        .collect()
}

fn stem(mut word: String) -> String {
    if word.chars().count() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word.pop();
    }
    word
}

/// Trimmed sentence spans of `chars` as char offset pairs, terminators excluded.
fn sentence_spans(chars: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for end in (0..chars.len()).filter(|&i| SENTENCE_END.contains(&chars[i])) {
        spans.push((start, end));
        start = end + 1;
    }
    spans.push((start, chars.len()));

    spans
        .into_iter()
        .filter_map(|(mut start, mut end)| {
            while start < end && chars[start].is_whitespace() {
                start += 1;
            }
            while end > start && chars[end - 1].is_whitespace() {
                end -= 1;
            }
            (start < end).then_some((start, end))
        })
        .collect()
}

/// Extractive QA by question/sentence term overlap.
///
/// The answer is the first sentence with the highest share of the question's
/// content terms; the score is that share, in `[0, 1]`. Offsets are always
/// reported and slice the context exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalQaModel;

impl LexicalQaModel {
    /// Create a new lexical QA model.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QaModel for LexicalQaModel {
    async fn infer(&self, question: &str, context: &str) -> Result<QaOutput> {
        let question_terms: HashSet<String> = terms(question).into_iter().collect();
        if question_terms.is_empty() {
            debug!(question, "question has no content terms");
            return Ok(QaOutput::unanswered());
        }

        let chars: Vec<char> = context.chars().collect();
        let mut best: Option<(usize, usize, f32)> = None;
        for (start, end) in sentence_spans(&chars) {
            let sentence: String = chars[start..end].iter().collect();
            let sentence_terms: HashSet<String> = terms(&sentence).into_iter().collect();
            let matched = question_terms.intersection(&sentence_terms).count();
            let score = matched as f32 / question_terms.len() as f32;
            if score > best.map_or(0.0, |(_, _, s)| s) {
                best = Some((start, end, score));
            }
        }

        Ok(match best {
            Some((start, end, score)) => QaOutput {
                answer: chars[start..end].iter().collect(),
                score,
                start: Some(start),
                end: Some(end),
            },
            None => QaOutput::unanswered(),
        })
    }

    fn name(&self) -> &str {
        "lexical-overlap"
    }
}
