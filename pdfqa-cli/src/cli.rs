//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pdfqa_rag::QaConfig;

/// Ask questions about a PDF document.
#[derive(Parser, Debug)]
#[command(
    name = "pdfqa",
    version,
    about = "Answer questions about a PDF with retrieval and extractive QA",
    long_about = "Load a PDF, index its text, and answer questions with the exact span of the \
                  document the answer was taken from.

EXAMPLES:
  One question:
    pdfqa ask report.pdf \"What is the warranty period?\"

  Spoken question (16-bit PCM WAV):
    pdfqa ask report.pdf --audio question.wav

  Interactive session:
    pdfqa chat report.pdf"
)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Maximum characters per chunk
    #[arg(long, global = true, env = "PDFQA_CHUNK_SIZE", default_value_t = 500)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks of a page
    #[arg(long, global = true, env = "PDFQA_CHUNK_OVERLAP", default_value_t = 100)]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    #[arg(long, global = true, env = "PDFQA_TOP_K", default_value_t = 5)]
    pub top_k: usize,

    /// Character budget of the context handed to the QA model
    #[arg(long, global = true, env = "PDFQA_MAX_CONTEXT_CHARS", default_value_t = 2000)]
    pub max_context_chars: usize,

    /// Embedding backend
    #[arg(long, global = true, value_enum, env = "PDFQA_EMBEDDER", default_value = "hashing")]
    pub embedder: EmbedderKind,

    /// Question answering backend
    #[arg(long, global = true, value_enum, env = "PDFQA_QA", default_value = "lexical")]
    pub qa: QaKind,

    /// Model cache directory for local embeddings
    #[arg(long, global = true, env = "PDFQA_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Hugging Face API token
    #[arg(long, global = true, env = "HF_API_TOKEN", hide_env_values = true)]
    pub hf_token: Option<String>,

    /// Hugging Face Inference API base URL
    #[arg(long, global = true, env = "PDFQA_HF_BASE_URL", value_name = "URL")]
    pub hf_base_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Print per-stage timings after each answer
    #[arg(long, global = true)]
    pub trace: bool,
}

impl Settings {
    /// Validated pipeline configuration.
    pub fn qa_config(&self) -> pdfqa_rag::Result<QaConfig> {
        QaConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .max_context_chars(self.max_context_chars)
            .build()
    }
}

/// Embedding backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// Feature hashing; no model files
    Hashing,
    /// all-MiniLM-L6-v2 run locally (needs the `fastembed` feature)
    Fastembed,
    /// all-MiniLM-L6-v2 on the Hugging Face Inference API
    Huggingface,
}

/// Question answering backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QaKind {
    /// Sentence/term overlap; no model files
    Lexical,
    /// deepset/roberta-base-squad2 on the Hugging Face Inference API
    Huggingface,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer one question about a document
    Ask {
        /// PDF (or UTF-8 .txt) file
        document: PathBuf,

        /// The question
        #[arg(required_unless_present = "audio", conflicts_with = "audio")]
        question: Option<String>,

        /// Ask a spoken question from a 16-bit PCM WAV file
        #[arg(long, value_name = "WAV")]
        audio: Option<PathBuf>,

        /// Print the answer record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive question session
    Chat {
        /// Document to load at start
        document: Option<PathBuf>,
    },

    /// Show how a document is chunked
    Chunks {
        /// PDF (or UTF-8 .txt) file
        document: PathBuf,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_accepts_question_or_audio() {
        let cli = Cli::try_parse_from(["pdfqa", "ask", "doc.pdf", "What?"]).unwrap();
        assert!(matches!(cli.command, Command::Ask { question: Some(_), audio: None, .. }));

        let cli = Cli::try_parse_from(["pdfqa", "ask", "doc.pdf", "--audio", "q.wav"]).unwrap();
        assert!(matches!(cli.command, Command::Ask { question: None, audio: Some(_), .. }));

        assert!(Cli::try_parse_from(["pdfqa", "ask", "doc.pdf"]).is_err());
    }

    #[test]
    fn global_settings_map_to_config() {
        let cli = Cli::try_parse_from([
            "pdfqa", "chunks", "doc.pdf", "--chunk-size", "40", "--chunk-overlap", "10",
        ])
        .unwrap();
        let config = cli.settings.qa_config().unwrap();
        assert_eq!(config.chunk_size, 40);
        assert_eq!(config.chunk_overlap, 10);
        assert_eq!(config.top_k, 5);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let cli = Cli::try_parse_from(["pdfqa", "chat", "--chunk-overlap", "600"]).unwrap();
        assert!(cli.settings.qa_config().is_err());
    }
}
