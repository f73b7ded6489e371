//! Embedding generation with soft-failure semantics.
//!
//! The [`EmbeddingProvider`] trait is the seam to the external
//! embedding service. The [`EmbeddingGenerator`] wraps a provider and
//! converts every failure mode (provider error, timeout, blank input)
//! into [`EmbeddingOutcome::Unavailable`]: embedding failure must not
//! halt the pipeline, it must trigger the text-search fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ProviderError;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified
/// async interface. Errors are reported as [`ProviderError`]; callers
/// above the generator never see them.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;

    /// Identifier of the embedding model, recorded alongside stored
    /// embeddings.
    fn model_id(&self) -> &str;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// The outcome of an embedding attempt.
///
/// "Provider unavailable" is an expected outcome here, not an
/// exceptional one; the retriever branches on this tag to select the
/// lexical fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingOutcome {
    /// The embedding was generated.
    Embedded(Vec<f32>),
    /// The input was blank, or the provider failed or timed out.
    Unavailable,
}

/// Generates embeddings through a provider, absorbing failures.
///
/// Blank input short-circuits to [`EmbeddingOutcome::Unavailable`]
/// without touching the provider (cost avoidance). Provider errors and
/// timeouts are logged and likewise absorbed.
#[derive(Clone)]
pub struct EmbeddingGenerator {
    provider: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl EmbeddingGenerator {
    /// Create a generator over the given provider with a per-call timeout.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Identifier of the underlying embedding model.
    pub fn model_id(&self) -> &str {
        self.provider.model_id()
    }

    /// Generate an embedding for `text`.
    ///
    /// Never fails: blank input, provider errors, timeouts, and empty
    /// or wrongly sized embedding payloads all yield
    /// [`EmbeddingOutcome::Unavailable`]. A vector whose length differs
    /// from the provider's declared dimensionality would never match
    /// stored embeddings, so it is discarded here.
    pub async fn generate(&self, text: &str) -> EmbeddingOutcome {
        if text.trim().is_empty() {
            debug!("skipping embedding for blank input");
            return EmbeddingOutcome::Unavailable;
        }

        match tokio::time::timeout(self.timeout, self.provider.embed(text)).await {
            Ok(Ok(vector)) if vector.len() == self.provider.dimensions() => {
                EmbeddingOutcome::Embedded(vector)
            }
            Ok(Ok(vector)) => {
                warn!(
                    model = self.provider.model_id(),
                    expected = self.provider.dimensions(),
                    actual = vector.len(),
                    "provider returned an embedding of unexpected dimension"
                );
                EmbeddingOutcome::Unavailable
            }
            Ok(Err(e)) => {
                warn!(model = self.provider.model_id(), error = %e, "embedding failed");
                EmbeddingOutcome::Unavailable
            }
            Err(_) => {
                warn!(model = self.provider.model_id(), "embedding timed out");
                EmbeddingOutcome::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.5; 4])
        }

        fn model_id(&self) -> &str {
            "counting"
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn blank_input_skips_the_provider() {
        let provider = Arc::new(CountingProvider { calls: AtomicUsize::new(0) });
        let generator = EmbeddingGenerator::new(provider.clone(), Duration::from_secs(1));

        assert_eq!(generator.generate("").await, EmbeddingOutcome::Unavailable);
        assert_eq!(generator.generate("   \n\t ").await, EmbeddingOutcome::Unavailable);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_blank_input_returns_the_vector() {
        let provider = Arc::new(CountingProvider { calls: AtomicUsize::new(0) });
        let generator = EmbeddingGenerator::new(provider.clone(), Duration::from_secs(1));

        let outcome = generator.generate("injera").await;
        assert_eq!(outcome, EmbeddingOutcome::Embedded(vec![0.5; 4]));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    struct FailingProvider;

    #[async_trait]
    impl EmbeddingProvider for FailingProvider {
        async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        }

        fn model_id(&self) -> &str {
            "failing"
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn provider_failure_becomes_unavailable() {
        let generator =
            EmbeddingGenerator::new(Arc::new(FailingProvider), Duration::from_secs(1));
        assert_eq!(generator.generate("question").await, EmbeddingOutcome::Unavailable);
    }

    /// Declares 4 dimensions but returns a 3-element vector.
    struct MismatchedProvider;

    #[async_trait]
    impl EmbeddingProvider for MismatchedProvider {
        async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
            Ok(vec![0.5; 3])
        }

        fn model_id(&self) -> &str {
            "mismatched"
        }

        fn dimensions(&self) -> usize {
            4
        }
    }

    #[tokio::test]
    async fn wrong_dimension_embedding_becomes_unavailable() {
        let generator =
            EmbeddingGenerator::new(Arc::new(MismatchedProvider), Duration::from_secs(1));
        assert_eq!(generator.generate("question").await, EmbeddingOutcome::Unavailable);
    }
}
