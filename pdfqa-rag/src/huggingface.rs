//! Hosted models on the Hugging Face Inference API.
//!
//! This module is only available when the `huggingface` feature is enabled.
//!
//! - [`HfQaModel`]: extractive QA, `deepset/roberta-base-squad2` by default
//! - [`HfEmbeddingProvider`]: sentence embeddings, `all-MiniLM-L6-v2` by default
//! - [`HfTranscriber`]: speech recognition, `openai/whisper-base` by default
//!
//! All three share an [`HfClient`] carrying the API token, read from the
//! constructor or the `HF_API_TOKEN` environment variable.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::qa::{QaModel, QaOutput};
use crate::speech::{AudioClip, Transcriber};

/// The default Inference API base URL.
const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "HF_API_TOKEN";

const DEFAULT_QA_MODEL: &str = "deepset/roberta-base-squad2";
const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
const DEFAULT_ASR_MODEL: &str = "openai/whisper-base";

/// Authenticated client for the Inference API.
#[derive(Debug, Clone)]
pub struct HfClient {
    http: reqwest::Client,
    token: String,
    base_url: String,
}

impl HfClient {
    /// Create a client with the given API token.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(QaError::ConfigError("Hugging Face API token must not be empty".into()));
        }
        Ok(Self { http: reqwest::Client::new(), token, base_url: DEFAULT_BASE_URL.into() })
    }

    /// Create a client using the `HF_API_TOKEN` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] if the variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| QaError::ConfigError(format!("{TOKEN_ENV} environment variable not set")))?;
        Self::new(token)
    }

    /// Point the client at another Inference API deployment.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    async fn post_json<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        model: &str,
        path: &str,
        body: &B,
    ) -> Result<R> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(model, request).await
    }

    async fn post_bytes<R: DeserializeOwned>(
        &self,
        model: &str,
        path: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<R> {
        let request = self.http.post(self.url(path)).header("Content-Type", content_type).body(body);
        self.send(model, request).await
    }

    async fn send<R: DeserializeOwned>(&self, model: &str, request: reqwest::RequestBuilder) -> Result<R> {
        let response = request
            .bearer_auth(&self.token)
            .header("x-wait-for-model", "true")
            .send()
            .await
            .map_err(|e| {
                error!(provider = "huggingface", model, error = %e, "request failed");
                QaError::model_unavailable(model, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);

            error!(provider = "huggingface", model, %status, "API error");
            return Err(QaError::model_unavailable(model, format!("API returned {status}: {detail}")));
        }

        response.json().await.map_err(|e| {
            error!(provider = "huggingface", model, error = %e, "failed to parse response");
            QaError::model_unavailable(model, format!("failed to parse response: {e}"))
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Question answering ─────────────────────────────────────────────

#[derive(Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
struct QaAnswer {
    answer: String,
    score: f32,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    end: Option<usize>,
}

/// The endpoint answers with one object, or a list when several answers are
/// requested.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaResponse {
    One(QaAnswer),
    Many(Vec<QaAnswer>),
}

impl QaResponse {
    fn best(self) -> Option<QaAnswer> {
        match self {
            Self::One(answer) => Some(answer),
            Self::Many(answers) => answers.into_iter().next(),
        }
    }
}

/// A [`QaModel`] backed by a hosted extractive QA model.
#[derive(Debug, Clone)]
pub struct HfQaModel {
    client: HfClient,
    model: String,
}

impl HfQaModel {
    /// Use `deepset/roberta-base-squad2` through `client`.
    pub fn new(client: HfClient) -> Self {
        Self { client, model: DEFAULT_QA_MODEL.into() }
    }

    /// Set the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl QaModel for HfQaModel {
    async fn infer(&self, question: &str, context: &str) -> Result<QaOutput> {
        debug!(provider = "huggingface", model = %self.model, context_len = context.len(), "qa inference");
        let request = QaRequest { inputs: QaInputs { question, context } };
        let response: QaResponse =
            self.client.post_json(&self.model, &format!("models/{}", self.model), &request).await?;

        Ok(match response.best() {
            Some(a) => QaOutput { answer: a.answer, score: a.score, start: a.start, end: a.end },
            None => QaOutput::unanswered(),
        })
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ── Embeddings ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct FeatureRequest<'a> {
    inputs: &'a [&'a str],
}

/// An [`EmbeddingProvider`] backed by the hosted feature-extraction pipeline.
#[derive(Debug, Clone)]
pub struct HfEmbeddingProvider {
    client: HfClient,
    model: String,
    dimensions: usize,
}

impl HfEmbeddingProvider {
    /// Use `sentence-transformers/all-MiniLM-L6-v2` (384 dimensions) through `client`.
    pub fn new(client: HfClient) -> Self {
        Self {
            client,
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }

    /// Set the model id and the dimensionality it produces.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }
}

#[async_trait]
impl EmbeddingProvider for HfEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "huggingface", model = %self.model, batch_size = texts.len(), "embedding batch");
        let path = format!("pipeline/feature-extraction/{}", self.model);
        let vectors: Vec<Vec<f32>> =
            self.client.post_json(&self.model, &path, &FeatureRequest { inputs: texts }).await?;

        if vectors.len() != texts.len() {
            return Err(QaError::model_unavailable(
                &self.model,
                format!("expected {} vectors, got {}", texts.len(), vectors.len()),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(QaError::DimensionMismatch { expected: self.dimensions, actual: bad.len() });
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// ── Speech recognition ─────────────────────────────────────────────

#[derive(Deserialize)]
struct AsrResponse {
    text: String,
}

/// A [`Transcriber`] backed by a hosted speech recognition model.
///
/// Clips are sent as 16-bit PCM WAV.
#[derive(Debug, Clone)]
pub struct HfTranscriber {
    client: HfClient,
    model: String,
}

impl HfTranscriber {
    /// Use `openai/whisper-base` through `client`.
    pub fn new(client: HfClient) -> Self {
        Self { client, model: DEFAULT_ASR_MODEL.into() }
    }

    /// Set the model id.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl Transcriber for HfTranscriber {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String> {
        debug!(
            provider = "huggingface",
            model = %self.model,
            duration_ms = clip.duration_ms(),
            sample_rate = clip.sample_rate,
            "transcribing clip"
        );
        let response: AsrResponse = self
            .client
            .post_bytes(&self.model, &format!("models/{}", self.model), "audio/wav", clip.to_wav_bytes())
            .await?;
        Ok(response.text.trim().to_string())
    }

    fn name(&self) -> &str {
        &self.model
    }
}
