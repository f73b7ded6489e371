//! Document ingestion: clean, chunk, embed, persist.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{info, warn};

use crate::config::AssistantConfig;
use crate::document::{Document, DocumentReceipt};
use crate::embedding::{EmbeddingGenerator, EmbeddingOutcome};
use crate::error::Result;
use crate::store::DocumentStore;
use crate::text::{chunk_text, clean_text};

/// Ingests documents into the store, chunking and embedding as needed.
///
/// Large documents become one unembedded parent plus independently
/// embedded chunk documents; the parent is durably inserted before any
/// chunk references it, and chunks are embedded and inserted
/// concurrently with no ordering between them. A chunk whose embedding
/// fails is still persisted with an empty vector — ingestion degrades,
/// it does not abort.
#[derive(Clone)]
pub struct Ingestor {
    embedder: EmbeddingGenerator,
    store: Arc<dyn DocumentStore>,
    config: AssistantConfig,
}

impl Ingestor {
    /// Create an ingestor over the given embedder and store.
    pub fn new(
        embedder: EmbeddingGenerator,
        store: Arc<dyn DocumentStore>,
        config: AssistantConfig,
    ) -> Self {
        Self { embedder, store, config }
    }

    /// Ingest a document and return its identifying metadata.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Store`](crate::error::AssistantError::Store)
    /// if persisting any record fails. Embedding failures are absorbed.
    pub async fn ingest(
        &self,
        title: &str,
        raw_content: &str,
        uploader_id: &str,
        category: Option<String>,
        tags: Vec<String>,
    ) -> Result<DocumentReceipt> {
        let cleaned = clean_text(raw_content);
        let category = category.unwrap_or_else(|| "other".to_string());

        if cleaned.chars().count() > self.config.chunking_threshold {
            self.ingest_chunked(title, cleaned, uploader_id, category, tags).await
        } else {
            self.ingest_single(title, cleaned, uploader_id, category, tags).await
        }
    }

    async fn ingest_single(
        &self,
        title: &str,
        cleaned: String,
        uploader_id: &str,
        category: String,
        tags: Vec<String>,
    ) -> Result<DocumentReceipt> {
        let (embedding, embedding_model) = match self.embedder.generate(&cleaned).await {
            EmbeddingOutcome::Embedded(v) => (v, Some(self.embedder.model_id().to_string())),
            EmbeddingOutcome::Unavailable => (Vec::new(), None),
        };

        let document = Document {
            category,
            tags,
            embedding,
            embedding_model,
            uploaded_by: uploader_id.to_string(),
            ..Document::new(title, cleaned)
        };

        let receipt = DocumentReceipt {
            id: document.id.clone(),
            title: document.title.clone(),
            category: document.category.clone(),
            chunks_created: None,
            created_at: document.created_at,
        };

        self.store.insert(document).await?;
        info!(document_id = %receipt.id, "ingested single document");
        Ok(receipt)
    }

    async fn ingest_chunked(
        &self,
        title: &str,
        cleaned: String,
        uploader_id: &str,
        category: String,
        tags: Vec<String>,
    ) -> Result<DocumentReceipt> {
        let chunks = chunk_text(&cleaned, self.config.chunk_size, self.config.chunk_overlap)?;
        let total = chunks.len();

        let parent = Document {
            category: category.clone(),
            tags: tags.clone(),
            uploaded_by: uploader_id.to_string(),
            chunk_count: Some(total),
            ..Document::new(title, cleaned)
        };
        let parent_id = parent.id.clone();
        let created_at = parent.created_at;

        // The parent must exist before any chunk references it.
        self.store.insert(parent).await?;

        let chunk_jobs = chunks.into_iter().map(|chunk| {
            let category = category.clone();
            let tags = tags.clone();
            let parent_id = parent_id.clone();
            async move {
                let (embedding, embedding_model) = match self.embedder.generate(&chunk.text).await
                {
                    EmbeddingOutcome::Embedded(v) => {
                        (v, Some(self.embedder.model_id().to_string()))
                    }
                    EmbeddingOutcome::Unavailable => {
                        warn!(
                            parent_id = %parent_id,
                            chunk_index = chunk.index,
                            "chunk embedding unavailable, persisting without embedding"
                        );
                        (Vec::new(), None)
                    }
                };

                let document = Document {
                    category,
                    tags,
                    embedding,
                    embedding_model,
                    uploaded_by: uploader_id.to_string(),
                    is_chunk: true,
                    parent_document_id: Some(parent_id),
                    chunk_index: Some(chunk.index),
                    chunk_count: Some(total),
                    ..Document::new(
                        format!("{} (Chunk {}/{})", title, chunk.index + 1, total),
                        chunk.text,
                    )
                };

                self.store.insert(document).await
            }
        });

        for outcome in join_all(chunk_jobs).await {
            outcome?;
        }

        info!(document_id = %parent_id, chunk_count = total, "ingested chunked document");

        Ok(DocumentReceipt {
            id: parent_id,
            title: title.to_string(),
            category,
            chunks_created: Some(total),
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::document::DocumentFilter;
    use crate::embedding::EmbeddingProvider;
    use crate::error::ProviderError;
    use crate::memory::InMemoryDocumentStore;

    struct StubProvider;

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
            if text.contains("unembeddable") {
                return Err(ProviderError::Unavailable("rejected".to_string()));
            }
            Ok(vec![1.0, 0.0])
        }

        fn model_id(&self) -> &str {
            "stub-model"
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn ingestor(store: Arc<InMemoryDocumentStore>) -> Ingestor {
        Ingestor::new(
            EmbeddingGenerator::new(Arc::new(StubProvider), Duration::from_secs(1)),
            store,
            AssistantConfig::default(),
        )
    }

    #[tokio::test]
    async fn small_document_is_stored_unchunked_with_embedding() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let receipt = ingestor(store.clone())
            .ingest("Menu", "Injera with wot", "user-1", None, Vec::new())
            .await
            .unwrap();

        assert_eq!(receipt.chunks_created, None);
        let doc = store.find_by_id(&receipt.id).await.unwrap().unwrap();
        assert!(!doc.is_chunk);
        assert_eq!(doc.embedding, vec![1.0, 0.0]);
        assert_eq!(doc.embedding_model.as_deref(), Some("stub-model"));
        assert_eq!(doc.category, "other");
    }

    #[tokio::test]
    async fn large_document_becomes_parent_plus_chunks() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let content = "m".repeat(2500);
        let receipt = ingestor(store.clone())
            .ingest("Menu", &content, "user-1", Some("food".to_string()), Vec::new())
            .await
            .unwrap();

        assert_eq!(receipt.chunks_created, Some(3));

        let parent = store.find_by_id(&receipt.id).await.unwrap().unwrap();
        assert!(parent.is_parent());
        assert!(parent.embedding.is_empty());
        assert_eq!(parent.chunk_count, Some(3));

        let filter = DocumentFilter { include_chunks: true, ..Default::default() };
        let all = store.find(&filter, 100, 0).await.unwrap();
        let mut indices: Vec<usize> = all
            .iter()
            .filter(|d| d.parent_document_id.as_deref() == Some(receipt.id.as_str()))
            .map(|d| d.chunk_index.unwrap())
            .collect();
        indices.sort_unstable();
        assert_eq!(indices, [0, 1, 2]);

        let chunk = all.iter().find(|d| d.chunk_index == Some(1)).unwrap();
        assert_eq!(chunk.title, "Menu (Chunk 2/3)");
        assert_eq!(chunk.embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn failed_chunk_embedding_still_persists_the_chunk() {
        let store = Arc::new(InMemoryDocumentStore::new());
        // First window contains the marker the stub provider rejects.
        let content = format!("unembeddable {}", "m".repeat(2500));
        let receipt = ingestor(store.clone())
            .ingest("Menu", &content, "user-1", None, Vec::new())
            .await
            .unwrap();

        let filter = DocumentFilter { include_chunks: true, ..Default::default() };
        let chunks: Vec<_> = store
            .find(&filter, 100, 0)
            .await
            .unwrap()
            .into_iter()
            .filter(|d| d.parent_document_id.as_deref() == Some(receipt.id.as_str()))
            .collect();

        assert_eq!(chunks.len(), receipt.chunks_created.unwrap());
        let first = chunks.iter().find(|d| d.chunk_index == Some(0)).unwrap();
        assert!(first.embedding.is_empty());
        assert_eq!(first.embedding_model, None);
        let second = chunks.iter().find(|d| d.chunk_index == Some(1)).unwrap();
        assert!(!second.embedding.is_empty());
    }
}
