//! Plain-text rendering of answers, chunks, history and stage timings.

use std::fmt::Write;

use pdfqa_rag::document::char_slice;
use pdfqa_rag::{AnswerRecord, Chunk, ContextPart, HistoryEntry, IndexSummary};
use pdfqa_telemetry::SpanData;

const MARK_OPEN: &str = ">>";
const MARK_CLOSE: &str = "<<";

/// The part's text with the overlap of `span` wrapped in markers.
fn highlight(part: &ContextPart, span: (usize, usize)) -> String {
    let local_start = span.0.max(part.start) - part.start;
    let local_end = span.1.min(part.end).max(span.0.max(part.start)) - part.start;
    let len = part.end - part.start;
    format!(
        "{}{MARK_OPEN}{}{MARK_CLOSE}{}",
        char_slice(&part.text, 0, local_start),
        char_slice(&part.text, local_start, local_end),
        char_slice(&part.text, local_end, len),
    )
}

fn join_pages(pages: &[usize]) -> String {
    pages.iter().map(usize::to_string).collect::<Vec<_>>().join(", ")
}

/// The answer, its score and source pages, and the highlighted context.
pub fn render_answer(record: &AnswerRecord) -> String {
    if record.is_no_context() {
        return format!("{}\n", record.answer);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Answer: {}", record.answer);
    let _ = writeln!(out, "Score:  {:.3}", record.score);

    let Some(span) = record.span() else {
        let _ = writeln!(out, "(the model did not report where the answer was found)");
        return out;
    };

    let highlighted = record.highlighted_parts();
    if highlighted.is_empty() {
        return out;
    }
    let _ = writeln!(out, "Source pages: {}", join_pages(&record.source_pages()));
    for part in highlighted {
        let _ = writeln!(out, "\n--- page {} ---", part.page);
        let _ = writeln!(out, "{}", highlight(part, span));
    }
    out
}

/// A one-line summary of a loaded document.
pub fn render_summary(summary: &IndexSummary) -> String {
    let mut line = format!(
        "Loaded {} page(s) as {} chunk(s) ({} dimensions)",
        summary.page_count, summary.chunk_count, summary.dimensions
    );
    if summary.empty_pages > 0 {
        let _ = write!(line, "; {} page(s) had no extractable text", summary.empty_pages);
    }
    line
}

/// Chunks with their 1-based page numbers.
pub fn render_chunks(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for (ordinal, chunk) in chunks.iter().enumerate() {
        let _ = writeln!(out, "[{ordinal}] page {}: {}", chunk.source_page + 1, chunk.text);
    }
    out
}

/// Answered questions, as given (newest first).
pub fn render_history<'a>(entries: impl Iterator<Item = &'a HistoryEntry>) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "[{}] Q: {}", entry.asked_at.format("%H:%M:%S"), entry.question);
        let _ = writeln!(out, "           A: {}", entry.answer.answer);
    }
    if out.is_empty() {
        out.push_str("No questions yet.\n");
    }
    out
}

/// Stage timings, indented by nesting.
pub fn render_trace(spans: &[SpanData]) -> String {
    let mut out = String::new();
    for span in spans {
        let depth = std::iter::successors(span.parent_id.as_deref(), |parent| {
            spans.iter().find(|s| s.id == *parent).and_then(|s| s.parent_id.as_deref())
        })
        .filter(|parent| spans.iter().any(|s| s.id == *parent))
        .count();
        let _ = writeln!(out, "{}{:<24} {:>9.2} ms", "  ".repeat(depth), span.name, span.duration_ms);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn record() -> AnswerRecord {
        AnswerRecord {
            answer: "king of fruits".to_string(),
            score: 0.91,
            start: Some(11),
            end: Some(25),
            context: "Mango is a king of fruits.\n\nGrapes can be sour.".to_string(),
            parts: vec![
                ContextPart {
                    index: 0,
                    page: 2,
                    start: 0,
                    end: 26,
                    text: "Mango is a king of fruits.".to_string(),
                },
                ContextPart {
                    index: 1,
                    page: 5,
                    start: 28,
                    end: 47,
                    text: "Grapes can be sour.".to_string(),
                },
            ],
        }
    }

    #[test]
    fn answer_shows_pages_and_marks_span() {
        let text = render_answer(&record());
        assert!(text.contains("Answer: king of fruits"));
        assert!(text.contains("Source pages: 2"));
        assert!(text.contains("Mango is a >>king of fruits<<."));
        assert!(!text.contains("Grapes"));
    }

    #[test]
    fn span_across_parts_marks_both() {
        let mut record = record();
        record.start = Some(19);
        record.end = Some(34);
        let text = render_answer(&record);
        assert!(text.contains("Mango is a king of >>fruits.<<"));
        assert!(text.contains(">>Grapes<< can be sour."));
        assert!(text.contains("Source pages: 2, 5"));
    }

    #[test]
    fn missing_span_is_reported() {
        let mut record = record();
        record.start = None;
        let text = render_answer(&record);
        assert!(text.contains("did not report"));
        assert!(!text.contains("Source pages"));
    }

    #[test]
    fn no_context_prints_sentinel_only() {
        let text = render_answer(&AnswerRecord::no_context());
        assert_eq!(text, format!("{}\n", pdfqa_rag::NO_CONTEXT_ANSWER));
    }

    #[test]
    fn trace_indents_children() {
        let span = |id: &str, parent: Option<&str>, name: &str| SpanData {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent.map(str::to_string),
            sequence: 0,
            start_time: 1,
            duration_ms: 1.5,
            attributes: HashMap::new(),
        };
        let spans = vec![
            span("a", Some("outside"), "pdfqa.question"),
            span("b", Some("a"), "pdfqa.ask"),
            span("c", Some("b"), "pdfqa.retrieve"),
        ];
        let lines: Vec<String> = render_trace(&spans).lines().map(str::to_string).collect();
        assert!(lines[0].starts_with("pdfqa.question"));
        assert!(lines[1].starts_with("  pdfqa.ask"));
        assert!(lines[2].starts_with("    pdfqa.retrieve"));
    }

    #[test]
    fn empty_history_has_placeholder() {
        assert_eq!(render_history(std::iter::empty()), "No questions yet.\n");
    }
}
