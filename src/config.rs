//! Configuration for the assistant pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, Result};

/// Configuration parameters for the assistant pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Documents whose cleaned content exceeds this length are chunked.
    pub chunking_threshold: usize,
    /// Number of documents to retrieve per question.
    pub top_k: usize,
    /// Maximum number of retrieved documents included in the prompt context.
    pub max_context_documents: usize,
    /// Maximum characters of document content quoted per context entry.
    pub context_preview_chars: usize,
    /// Maximum non-empty lines taken from the top document when
    /// synthesizing a fallback answer.
    pub synthesis_max_lines: usize,
    /// Maximum accepted question length in characters.
    pub max_question_chars: usize,
    /// Timeout applied to each external provider call.
    pub provider_timeout: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            chunking_threshold: 2000,
            top_k: 3,
            max_context_documents: 3,
            context_preview_chars: 500,
            synthesis_max_lines: 15,
            max_question_chars: 1000,
            provider_timeout: Duration::from_secs(30),
        }
    }
}

impl AssistantConfig {
    /// Create a new builder for constructing an [`AssistantConfig`].
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`AssistantConfig`].
#[derive(Debug, Clone, Default)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
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

    /// Set the content length above which documents are chunked.
    pub fn chunking_threshold(mut self, threshold: usize) -> Self {
        self.config.chunking_threshold = threshold;
        self
    }

    /// Set the number of documents retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the maximum number of documents included in the prompt context.
    pub fn max_context_documents(mut self, n: usize) -> Self {
        self.config.max_context_documents = n;
        self
    }

    /// Set the per-entry content preview length in characters.
    pub fn context_preview_chars(mut self, chars: usize) -> Self {
        self.config.context_preview_chars = chars;
        self
    }

    /// Set the number of lines drawn from the top document when
    /// synthesizing a fallback answer.
    pub fn synthesis_max_lines(mut self, lines: usize) -> Self {
        self.config.synthesis_max_lines = lines;
        self
    }

    /// Set the maximum accepted question length in characters.
    pub fn max_question_chars(mut self, chars: usize) -> Self {
        self.config.max_question_chars = chars;
        self
    }

    /// Set the timeout applied to each external provider call.
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.config.provider_timeout = timeout;
        self
    }

    /// Build the [`AssistantConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `chunking_threshold < chunk_size`
    /// - `top_k == 0`
    pub fn build(self) -> Result<AssistantConfig> {
        if self.config.chunk_size == 0 {
            return Err(AssistantError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(AssistantError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.chunking_threshold < self.config.chunk_size {
            return Err(AssistantError::Config(format!(
                "chunking_threshold ({}) must be at least chunk_size ({})",
                self.config.chunking_threshold, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(AssistantError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = AssistantConfig::builder().build().unwrap();
        assert_eq!(config, AssistantConfig::default());
    }

    #[test]
    fn rejects_overlap_not_less_than_chunk_size() {
        let result = AssistantConfig::builder().chunk_size(100).chunk_overlap(100).build();
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let result = AssistantConfig::builder().chunk_size(0).chunk_overlap(0).build();
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }

    #[test]
    fn rejects_zero_top_k() {
        let result = AssistantConfig::builder().top_k(0).build();
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }

    #[test]
    fn rejects_threshold_below_chunk_size() {
        let result =
            AssistantConfig::builder().chunk_size(1000).chunking_threshold(500).build();
        assert!(matches!(result, Err(AssistantError::Config(_))));
    }
}
