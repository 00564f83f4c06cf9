//! Interactive question session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use pdfqa_rag::{AudioClip, ChatSession, DocumentQa, SessionEvent};
use pdfqa_telemetry::SharedTraceStorage;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, warn};

use crate::cli::Settings;
use crate::models::build_transcriber;
use crate::render::{render_answer, render_history, render_summary};
use crate::{QuestionInput, answer_question, load_document_file};

const HELP: &str = "\
Type a question, or one of:
  /load <file>      load another document (clears history)
  /voice <wav>      ask a spoken question from a WAV file
  /clear            clear the current question and answer
  /history          list answered questions, newest first
  /clear-history    forget answered questions
  /help             show this help
  /quit             exit";

/// A parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Question(String),
    Load(PathBuf),
    Voice(PathBuf),
    Clear,
    History,
    ClearHistory,
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Some(Input::Question(line.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    Some(match (name, arg.is_empty()) {
        ("load", false) => Input::Load(PathBuf::from(arg)),
        ("voice", false) => Input::Voice(PathBuf::from(arg)),
        ("clear", true) => Input::Clear,
        ("history", true) => Input::History,
        ("clear-history", true) => Input::ClearHistory,
        ("help", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        _ => Input::Unknown(line.to_string()),
    })
}

struct Repl<'a> {
    qa: &'a DocumentQa,
    traces: Option<Arc<SharedTraceStorage>>,
    session: ChatSession,
}

impl Repl<'_> {
    async fn load(&mut self, path: &Path) {
        match load_document_file(self.qa, path, self.traces.as_deref()).await {
            Ok(summary) => {
                self.session.reset_for_new_document();
                println!("{}", render_summary(&summary));
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "document load failed");
                println!("Could not load {}: {e:#}", path.display());
                if self.qa.has_document().await {
                    println!("The previous document is still loaded.");
                }
            }
        }
    }

    async fn ask(&mut self, input: QuestionInput) {
        if !self.qa.has_document().await {
            println!("Load a document first with /load <file>.");
            return;
        }

        // Spoken questions enter the session once their text is known.
        let spoken = matches!(input, QuestionInput::Spoken { .. });
        if let QuestionInput::Text(question) = &input {
            if let Err(e) = self.session.handle(SessionEvent::Ask(question.clone())) {
                warn!(error = %e, "question rejected by session");
                return;
            }
        }

        match answer_question(self.qa, input, self.traces.as_deref()).await {
            Ok((question, record)) => {
                if spoken {
                    println!("Q: {question}");
                    let _ = self.session.handle(SessionEvent::Ask(question));
                }
                let _ = self.session.handle(SessionEvent::AnswerReceived(record.clone()));
                print!("{}", render_answer(&record));
            }
            Err(e) => {
                println!("Error: {e:#}");
                let _ = self.session.handle(SessionEvent::Clear);
            }
        }
    }
}

/// Run the interactive loop until `/quit` or end of input.
pub async fn run_chat(
    qa: &DocumentQa,
    settings: &Settings,
    document: Option<PathBuf>,
    traces: Option<Arc<SharedTraceStorage>>,
) -> Result<()> {
    let mut repl = Repl { qa, traces, session: ChatSession::new() };
    if let Some(path) = document {
        repl.load(&path).await;
    }

    let mut editor = DefaultEditor::new().context("failed to create line editor")?;
    println!("{HELP}");

    loop {
        let line = match editor.readline("pdfqa> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => {
                error!(error = %e, "failed to read input");
                break;
            }
        };
        let Some(input) = parse_input(&line) else { continue };
        let _ = editor.add_history_entry(line.trim());

        match input {
            Input::Question(question) => repl.ask(QuestionInput::Text(question)).await,
            Input::Voice(path) => match read_clip(&path) {
                Ok(clip) => match build_transcriber(settings) {
                    Ok(transcriber) => repl.ask(QuestionInput::Spoken { transcriber, clip }).await,
                    Err(e) => println!("Error: {e:#}"),
                },
                Err(e) => println!("Error: {e:#}"),
            },
            Input::Load(path) => repl.load(&path).await,
            Input::Clear => {
                let _ = repl.session.handle(SessionEvent::Clear);
                println!("Cleared.");
            }
            Input::History => print!("{}", render_history(repl.session.history())),
            Input::ClearHistory => {
                repl.session.clear_history();
                println!("History cleared.");
            }
            Input::Help => println!("{HELP}"),
            Input::Quit => break,
            Input::Unknown(command) => println!("Unknown command: {command} (try /help)"),
        }
    }
    Ok(())
}

/// Read a WAV file into a clip.
pub fn read_clip(path: &Path) -> Result<AudioClip> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(AudioClip::from_wav_bytes(&bytes)?)
}
