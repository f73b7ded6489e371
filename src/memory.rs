//! In-memory document store using cosine similarity.
//!
//! [`InMemoryDocumentStore`] keeps documents in a `HashMap` behind a
//! `tokio::sync::RwLock`. It backs development and tests; production
//! deployments substitute a real backend behind the same
//! [`DocumentStore`] trait.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Document, DocumentFilter, RetrievedDocument};
use crate::error::Result;
use crate::store::DocumentStore;

/// An in-memory [`DocumentStore`] using cosine similarity for vector
/// search and lowercase substring matching for text search.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Document>>,
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents, chunks included.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns `true` if the store holds no documents.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn matches_filter(doc: &Document, filter: &DocumentFilter) -> bool {
    if !doc.is_public {
        return false;
    }
    if doc.is_chunk && !filter.include_chunks {
        return false;
    }
    if let Some(category) = &filter.category {
        if doc.category != *category {
            return false;
        }
    }
    if let Some(search) = &filter.search_text {
        let needle = search.to_lowercase();
        let in_title = doc.title.to_lowercase().contains(&needle);
        let in_content = doc.content.to_lowercase().contains(&needle);
        let in_tags = doc.tags.iter().any(|t| t.to_lowercase().contains(&needle));
        if !(in_title || in_content || in_tags) {
            return false;
        }
    }
    true
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, document: Document) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.insert(document.id.clone(), document);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        let documents = self.documents.read().await;
        Ok(documents.get(id).cloned())
    }

    async fn vector_search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedDocument>> {
        let documents = self.documents.read().await;

        // Mixed-dimension embeddings (model changed between ingestions)
        // are skipped rather than scored.
        let mut scored: Vec<RetrievedDocument> = documents
            .values()
            .filter(|doc| doc.is_public && doc.embedding.len() == embedding.len())
            .filter(|doc| !doc.embedding.is_empty())
            .map(|doc| RetrievedDocument {
                similarity: Some(cosine_similarity(&doc.embedding, embedding)),
                document: doc.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<Document>> {
        let needle = query.to_lowercase();
        let documents = self.documents.read().await;

        let mut matches: Vec<Document> = documents
            .values()
            .filter(|doc| {
                doc.is_public
                    && (doc.title.to_lowercase().contains(&needle)
                        || doc.content.to_lowercase().contains(&needle)
                        || doc.tags.iter().any(|t| t.to_lowercase().contains(&needle)))
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let mut documents = self.documents.write().await;
        Ok(documents.remove(id).is_some())
    }

    async fn delete_by_parent_id(&self, parent_id: &str) -> Result<usize> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|_, doc| doc.parent_document_id.as_deref() != Some(parent_id));
        Ok(before - documents.len())
    }

    async fn count(&self, filter: &DocumentFilter) -> Result<usize> {
        let documents = self.documents.read().await;
        Ok(documents.values().filter(|doc| matches_filter(doc, filter)).count())
    }

    async fn find(
        &self,
        filter: &DocumentFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;

        let mut matches: Vec<Document> =
            documents.values().filter(|doc| matches_filter(doc, filter)).cloned().collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matches.into_iter().skip(offset).take(limit).collect())
    }
}
