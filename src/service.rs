//! The chat service facade consumed by request handlers.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::AssistantConfig;
use crate::document::{
    ChatResponse, DocumentFilter, DocumentPage, DocumentReceipt, Pagination, SourceRef,
};
use crate::embedding::{EmbeddingGenerator, EmbeddingProvider};
use crate::error::{AssistantError, Result};
use crate::generation::{AnswerGenerator, GenerationProvider};
use crate::ingest::Ingestor;
use crate::retrieval::Retriever;
use crate::store::DocumentStore;

/// The assistant's service facade: ask, upload, list, delete.
///
/// Composes the retriever, answer generator, and ingestor over shared
/// provider and store handles. Construct one via
/// [`ChatService::builder()`]. The service holds no per-request state;
/// any number of requests may be in flight concurrently.
pub struct ChatService {
    retriever: Retriever,
    answerer: AnswerGenerator,
    ingestor: Ingestor,
    store: Arc<dyn DocumentStore>,
    config: AssistantConfig,
}

impl ChatService {
    /// Create a new [`ChatServiceBuilder`].
    pub fn builder() -> ChatServiceBuilder {
        ChatServiceBuilder::default()
    }

    /// Answer a question with retrieval-augmented generation.
    ///
    /// Provider failures never surface here: the response always
    /// carries a best-effort answer. Only input validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::InvalidInput`] for an empty or
    /// oversized question.
    pub async fn ask_question(&self, question: &str) -> Result<ChatResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::InvalidInput("please provide a question".to_string()));
        }
        if question.chars().count() > self.config.max_question_chars {
            return Err(AssistantError::InvalidInput(format!(
                "question is too long (max {} characters)",
                self.config.max_question_chars
            )));
        }

        info!(question_chars = question.chars().count(), "chat question received");

        let retrieved = self.retriever.retrieve(question, self.config.top_k).await;
        let answer = self.answerer.generate(question, &retrieved).await;

        // The synthesis path supplies its own sources; the normal path
        // attributes the retrieved documents.
        let sources = if answer.sources.is_empty() {
            retrieved.iter().map(SourceRef::from_retrieved).collect()
        } else {
            answer.sources
        };

        Ok(ChatResponse {
            question: question.to_string(),
            answer: answer.text,
            sources,
            timestamp: Utc::now(),
        })
    }

    /// Upload a document from manual text input.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::InvalidInput`] when title or content
    /// is blank, and store errors from persistence.
    pub async fn upload_document(
        &self,
        title: &str,
        content: &str,
        uploader_id: &str,
        category: Option<String>,
        tags: Vec<String>,
    ) -> Result<DocumentReceipt> {
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(AssistantError::InvalidInput(
                "please provide title and content".to_string(),
            ));
        }
        self.ingestor.ingest(title.trim(), content, uploader_id, category, tags).await
    }

    /// Upload a document from text extracted out of a file.
    ///
    /// Text extraction itself is an external collaborator; this
    /// receives the extracted text and the original filename, which
    /// becomes the title.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::InvalidInput`] when the extracted text
    /// is blank.
    pub async fn upload_file(
        &self,
        extracted_text: &str,
        original_filename: &str,
        uploader_id: &str,
        category: Option<String>,
        tags: Vec<String>,
    ) -> Result<DocumentReceipt> {
        if extracted_text.trim().is_empty() {
            return Err(AssistantError::InvalidInput(
                "could not extract text from the uploaded file".to_string(),
            ));
        }
        self.ingestor
            .ingest(original_filename, extracted_text, uploader_id, category, tags)
            .await
    }

    /// List public documents, newest first.
    ///
    /// Chunk documents are excluded unless the filter requests them.
    /// `page` is 1-based.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::InvalidInput`] when `limit` is zero,
    /// and store errors from the query.
    pub async fn list_documents(
        &self,
        filter: DocumentFilter,
        page: usize,
        limit: usize,
    ) -> Result<DocumentPage> {
        if limit == 0 {
            return Err(AssistantError::InvalidInput(
                "page limit must be greater than zero".to_string(),
            ));
        }
        let page = page.max(1);

        let total = self.store.count(&filter).await?;
        let documents = self.store.find(&filter, limit, (page - 1) * limit).await?;

        Ok(DocumentPage {
            documents,
            pagination: Pagination { total, page, pages: total.div_ceil(limit) },
        })
    }

    /// Delete a document, cascading to its chunks when it is a parent.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::NotFound`] when no document has this
    /// ID, and [`AssistantError::InvalidInput`] when the target is a
    /// chunk — chunks are only removed through their parent, so a
    /// parent's `chunk_count` can never drift.
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        let document = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AssistantError::NotFound(id.to_string()))?;

        if document.is_chunk {
            return Err(AssistantError::InvalidInput(
                "chunk documents cannot be deleted directly; delete the parent document"
                    .to_string(),
            ));
        }

        if document.is_parent() {
            let removed = self.store.delete_by_parent_id(id).await?;
            if Some(removed) != document.chunk_count {
                warn!(
                    document_id = id,
                    expected = document.chunk_count,
                    removed,
                    "chunk count mismatch during cascade delete"
                );
            }
            info!(document_id = id, chunks_removed = removed, "deleted parent chunks");
        }

        self.store.delete_by_id(id).await?;
        info!(document_id = id, "document deleted");
        Ok(())
    }
}

/// Builder for constructing a [`ChatService`].
///
/// The embedding provider, generation provider, and document store are
/// required; the configuration defaults to [`AssistantConfig::default`].
#[derive(Default)]
pub struct ChatServiceBuilder {
    config: Option<AssistantConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_provider: Option<Arc<dyn GenerationProvider>>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl ChatServiceBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation provider.
    pub fn generation_provider(mut self, provider: Arc<dyn GenerationProvider>) -> Self {
        self.generation_provider = Some(provider);
        self
    }

    /// Set the document store backend.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the [`ChatService`], validating that all required
    /// collaborators are set.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Config`] if a required collaborator is
    /// missing.
    pub fn build(self) -> Result<ChatService> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            AssistantError::Config("embedding_provider is required".to_string())
        })?;
        let generation_provider = self.generation_provider.ok_or_else(|| {
            AssistantError::Config("generation_provider is required".to_string())
        })?;
        let store =
            self.store.ok_or_else(|| AssistantError::Config("store is required".to_string()))?;

        let embedder = EmbeddingGenerator::new(embedding_provider, config.provider_timeout);

        Ok(ChatService {
            retriever: Retriever::new(embedder.clone(), store.clone(), config.provider_timeout),
            answerer: AnswerGenerator::new(generation_provider, config.clone()),
            ingestor: Ingestor::new(embedder, store.clone(), config.clone()),
            store,
            config,
        })
    }
}
