//! Command-line front end for pdfqa.
//!
//! `pdfqa ask` answers one question, `pdfqa chat` runs an interactive
//! session and `pdfqa chunks` shows how a document is split for retrieval.

pub mod cli;
pub mod models;
pub mod render;
pub mod repl;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pdfqa_rag::{
    AnswerRecord, AudioClip, Chunker, DocumentQa, IndexSummary, PageChunker, Transcriber,
};
use pdfqa_telemetry::SharedTraceStorage;
use tracing::{Instrument, info_span};
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::models::{build_pipeline, build_transcriber, extract_pages, load_file};
use crate::render::{render_answer, render_chunks, render_summary, render_trace};
use crate::repl::{read_clip, run_chat};

/// A question typed by the user or recorded as audio.
pub enum QuestionInput {
    Text(String),
    Spoken { transcriber: Arc<dyn Transcriber>, clip: AudioClip },
}

/// Answer `input` against the loaded document.
///
/// The work runs under a `pdfqa.question` span. With `traces`, the stage
/// timings recorded for this question are printed to stderr and dropped.
pub async fn answer_question(
    qa: &DocumentQa,
    input: QuestionInput,
    traces: Option<&SharedTraceStorage>,
) -> Result<(String, AnswerRecord)> {
    let question_id = Uuid::new_v4().to_string();
    let span = info_span!("pdfqa.question", question.id = %question_id);

    let result: Result<(String, AnswerRecord)> = async {
        match input {
            QuestionInput::Text(question) => {
                let record = qa.ask(&question).await?;
                Ok((question.trim().to_string(), record))
            }
            QuestionInput::Spoken { transcriber, clip } => {
                Ok(qa.ask_spoken(transcriber.as_ref(), &clip).await?)
            }
        }
    }
    .instrument(span)
    .await;

    drain_trace(traces, &question_id);
    result
}

/// Load the file at `path` into `qa`, printing the load's stage timings
/// when `traces` is set.
pub async fn load_document_file(
    qa: &DocumentQa,
    path: &Path,
    traces: Option<&SharedTraceStorage>,
) -> Result<IndexSummary> {
    let summary = load_file(qa, path).await?;
    drain_trace(traces, &summary.document_id);
    Ok(summary)
}

/// Print and forget the spans stored under `key`.
fn drain_trace(traces: Option<&SharedTraceStorage>, key: &str) {
    if let Some(spans) = traces.and_then(|storage| storage.remove(key)) {
        eprint!("{}", render_trace(&spans));
    }
}

/// Run the parsed command line.
pub async fn run(cli: Cli, traces: Option<Arc<SharedTraceStorage>>) -> Result<()> {
    let settings = cli.settings;
    match cli.command {
        Command::Ask { document, question, audio, json } => {
            let qa = build_pipeline(&settings)?;
            let summary = load_document_file(&qa, &document, traces.as_deref())
                .await
                .with_context(|| format!("could not load {}", document.display()))?;
            if !json {
                eprintln!("{}", render_summary(&summary));
            }

            let input = match (question, audio) {
                (Some(question), _) => QuestionInput::Text(question),
                (None, Some(path)) => QuestionInput::Spoken {
                    transcriber: build_transcriber(&settings)?,
                    clip: read_clip(&path)?,
                },
                (None, None) => anyhow::bail!("a question or --audio is required"),
            };

            let (question, record) = answer_question(&qa, input, traces.as_deref()).await?;
            if json {
                let out = serde_json::json!({ "question": question, "answer": record });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print!("{}", render_answer(&record));
            }
        }
        Command::Chat { document } => {
            let qa = build_pipeline(&settings)?;
            run_chat(&qa, &settings, document, traces).await?;
        }
        Command::Chunks { document, json } => {
            let config = settings.qa_config().context("invalid settings")?;
            let pages = extract_pages(&document)?;
            let chunks = PageChunker::new(config.chunk_size, config.chunk_overlap).chunk(&pages);
            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
            } else {
                print!("{}", render_chunks(&chunks));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pdfqa_rag::{HashingEmbedder, LexicalQaModel, Page};
    use pdfqa_telemetry::StageTraceLayer;
    use tracing_subscriber::prelude::*;

    use super::*;

    #[tokio::test]
    async fn drained_traces_leave_storage_empty() {
        let storage = Arc::new(SharedTraceStorage::new());
        let subscriber =
            tracing_subscriber::registry().with(StageTraceLayer::new(Arc::clone(&storage)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let qa = DocumentQa::builder()
            .embedder(Arc::new(HashingEmbedder::default()))
            .qa_model(Arc::new(LexicalQaModel::new()))
            .build()
            .unwrap();
        let summary = qa.load_pages(vec![Page::new(0, "Mango is a king of fruits.")]).await.unwrap();
        assert!(storage.get_trace(&summary.document_id).is_some());
        drain_trace(Some(&storage), &summary.document_id);

        for _ in 0..3 {
            let input = QuestionInput::Text(" What is mango? ".to_string());
            let (question, record) = answer_question(&qa, input, Some(&storage)).await.unwrap();
            assert_eq!(question, "What is mango?");
            assert!(!record.is_no_context());
        }
        assert!(storage.keys().is_empty());
    }
}
