//! Retrieval orchestration: vector search with a lexical fallback.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::document::RetrievedDocument;
use crate::embedding::{EmbeddingGenerator, EmbeddingOutcome};
use crate::store::DocumentStore;

/// Retrieves candidate documents for a question.
///
/// Two paths, no intermediate states: when the question embeds, the
/// store's vector search supplies scored results; when embedding is
/// unavailable, the raw question goes to lexical text search. Each
/// store query carries its own timeout; store errors, timeouts, and
/// empty results all yield an empty list — the answer generator
/// handles zero context, so retrieval never fails.
#[derive(Clone)]
pub struct Retriever {
    embedder: EmbeddingGenerator,
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl Retriever {
    /// Create a retriever over the given embedder and store, with a
    /// per-query store timeout.
    pub fn new(
        embedder: EmbeddingGenerator,
        store: Arc<dyn DocumentStore>,
        timeout: Duration,
    ) -> Self {
        Self { embedder, store, timeout }
    }

    /// Retrieve up to `limit` documents relevant to `question`.
    pub async fn retrieve(&self, question: &str, limit: usize) -> Vec<RetrievedDocument> {
        match self.embedder.generate(question).await {
            EmbeddingOutcome::Embedded(vector) => {
                match tokio::time::timeout(self.timeout, self.store.vector_search(&vector, limit))
                    .await
                {
                    Ok(Ok(results)) => {
                        info!(result_count = results.len(), "vector retrieval completed");
                        results
                    }
                    Ok(Err(e)) => {
                        warn!(error = %e, "vector search failed, returning no context");
                        Vec::new()
                    }
                    Err(_) => {
                        warn!("vector search timed out, returning no context");
                        Vec::new()
                    }
                }
            }
            EmbeddingOutcome::Unavailable => {
                info!("embedding unavailable, falling back to text search");
                match tokio::time::timeout(self.timeout, self.store.text_search(question, limit))
                    .await
                {
                    Ok(Ok(documents)) => documents
                        .into_iter()
                        .map(|document| RetrievedDocument { document, similarity: None })
                        .collect(),
                    Ok(Err(e)) => {
                        warn!(error = %e, "text search failed, returning no context");
                        Vec::new()
                    }
                    Err(_) => {
                        warn!("text search timed out, returning no context");
                        Vec::new()
                    }
                }
            }
        }
    }
}
