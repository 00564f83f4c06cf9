//! Backend selection from command-line settings.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pdfqa_rag::{
    DocumentExtractor, DocumentQa, EmbeddingProvider, HashingEmbedder, IndexSummary,
    LexicalQaModel, Page, PdfExtractor, PlainTextExtractor, QaModel, Transcriber,
};
use tracing::info;

use crate::cli::{EmbedderKind, QaKind, Settings};

#[cfg(feature = "huggingface")]
fn hf_client(settings: &Settings) -> Result<pdfqa_rag::HfClient> {
    let client = match &settings.hf_token {
        Some(token) => pdfqa_rag::HfClient::new(token.clone())?,
        None => pdfqa_rag::HfClient::from_env()
            .context("the huggingface backend needs --hf-token or HF_API_TOKEN")?,
    };
    Ok(match &settings.hf_base_url {
        Some(url) => client.with_base_url(url.clone()),
        None => client,
    })
}

/// The embedding provider selected by `--embedder`.
pub fn build_embedder(settings: &Settings) -> Result<Arc<dyn EmbeddingProvider>> {
    match settings.embedder {
        EmbedderKind::Hashing => Ok(Arc::new(HashingEmbedder::default())),
        #[cfg(feature = "fastembed")]
        EmbedderKind::Fastembed => {
            Ok(Arc::new(pdfqa_rag::FastEmbedProvider::new(settings.cache_dir.clone())))
        }
        #[cfg(not(feature = "fastembed"))]
        EmbedderKind::Fastembed => anyhow::bail!("pdfqa was built without the `fastembed` feature"),
        #[cfg(feature = "huggingface")]
        EmbedderKind::Huggingface => {
            Ok(Arc::new(pdfqa_rag::HfEmbeddingProvider::new(hf_client(settings)?)))
        }
        #[cfg(not(feature = "huggingface"))]
        EmbedderKind::Huggingface => anyhow::bail!("pdfqa was built without the `huggingface` feature"),
    }
}

/// The QA model selected by `--qa`.
pub fn build_qa_model(settings: &Settings) -> Result<Arc<dyn QaModel>> {
    match settings.qa {
        QaKind::Lexical => Ok(Arc::new(LexicalQaModel::new())),
        #[cfg(feature = "huggingface")]
        QaKind::Huggingface => Ok(Arc::new(pdfqa_rag::HfQaModel::new(hf_client(settings)?))),
        #[cfg(not(feature = "huggingface"))]
        QaKind::Huggingface => anyhow::bail!("pdfqa was built without the `huggingface` feature"),
    }
}

/// The speech recognizer for spoken questions.
pub fn build_transcriber(settings: &Settings) -> Result<Arc<dyn Transcriber>> {
    #[cfg(feature = "huggingface")]
    {
        Ok(Arc::new(pdfqa_rag::HfTranscriber::new(hf_client(settings)?)))
    }
    #[cfg(not(feature = "huggingface"))]
    {
        let _ = settings;
        anyhow::bail!("spoken questions need the `huggingface` feature")
    }
}

/// A pipeline wired from `settings`.
pub fn build_pipeline(settings: &Settings) -> Result<DocumentQa> {
    let config = settings.qa_config().context("invalid settings")?;
    let qa = DocumentQa::builder()
        .config(config)
        .embedder(build_embedder(settings)?)
        .qa_model(build_qa_model(settings)?)
        .build()?;
    info!(embedder = qa.embedder().name(), qa_model = qa.qa_model().name(), "pipeline ready");
    Ok(qa)
}

fn is_text_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("txt"))
}

/// Extract the pages of the file at `path`, as text for `.txt` and as PDF otherwise.
pub fn extract_pages(path: &Path) -> Result<Vec<Page>> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let pages = if is_text_file(path) {
        PlainTextExtractor::new().extract(&bytes)?
    } else {
        PdfExtractor::new().extract(&bytes)?
    };
    Ok(pages)
}

/// Load the file at `path` into `qa`, replacing the current document.
pub async fn load_file(qa: &DocumentQa, path: &Path) -> Result<IndexSummary> {
    let summary = if is_text_file(path) {
        qa.load_pages(extract_pages(path)?).await?
    } else {
        let bytes =
            std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
        qa.load_document(&bytes).await?
    };
    Ok(summary)
}
