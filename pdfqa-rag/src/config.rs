//! Configuration for the question answering pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// Configuration parameters for indexing and answering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QaConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks of a page.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Character budget for the context handed to the QA model, separators excluded.
    pub max_context_chars: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 100, top_k: 5, max_context_chars: 2000 }
    }
}

impl QaConfig {
    /// Create a new builder for constructing a [`QaConfig`].
    pub fn builder() -> QaConfigBuilder {
        QaConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`QaConfig`].
#[derive(Debug, Clone, Default)]
pub struct QaConfigBuilder {
    config: QaConfig,
}

impl QaConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the context budget in characters.
    pub fn max_context_chars(mut self, chars: usize) -> Self {
        self.config.max_context_chars = chars;
        self
    }

    /// Build the [`QaConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `max_context_chars == 0`
    pub fn build(self) -> Result<QaConfig> {
        if self.config.chunk_size == 0 {
            return Err(QaError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(QaError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(QaError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.config.max_context_chars == 0 {
            return Err(QaError::ConfigError(
                "max_context_chars must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = QaConfig::default();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 100);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.max_context_chars, 2000);
    }

    #[test]
    fn builder_accepts_consistent_values() {
        let config = QaConfig::builder()
            .chunk_size(40)
            .chunk_overlap(10)
            .top_k(1)
            .max_context_chars(100)
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, 40);
        assert_eq!(config.chunk_overlap, 10);
        assert_eq!(config.top_k, 1);
        assert_eq!(config.max_context_chars, 100);
    }

    #[test]
    fn builder_rejects_overlap_not_below_size() {
        let err = QaConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, QaError::ConfigError(msg) if msg.contains("chunk_overlap")));
    }

    #[test]
    fn builder_rejects_zero_values() {
        assert!(QaConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
        assert!(QaConfig::builder().top_k(0).build().is_err());
        assert!(QaConfig::builder().max_context_chars(0).build().is_err());
    }

    #[test]
    fn deserializes_partial_json_over_defaults() {
        let config: QaConfig = serde_json::from_str(r#"{"top_k": 3}"#).unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.chunk_size, 500);
    }
}
