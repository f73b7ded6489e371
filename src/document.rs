//! Data types for documents, retrieval results, and service responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stored document: either a standalone document, a chunked parent,
/// or one chunk of a larger document.
///
/// Parents of chunked documents carry an empty embedding and a
/// `chunk_count`; each of their chunks is an independently embedded
/// document with `is_chunk = true` and a back-reference to the parent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// Document title; chunks get "{parent title} (Chunk i/n)".
    pub title: String,
    /// Full text for standalone and parent documents, the chunk's own
    /// text for chunks.
    pub content: String,
    /// Free-form category, defaults to "other".
    pub category: String,
    /// Tags for filtering; order is irrelevant.
    pub tags: Vec<String>,
    /// Embedding vector. Empty when generation failed or the record is
    /// a non-embedded parent.
    pub embedding: Vec<f32>,
    /// Identifier of the embedding model that produced `embedding`.
    /// `None` when the embedding is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    /// ID of the uploading user (lookup-only reference).
    pub uploaded_by: String,
    /// Whether the document is visible in listings.
    pub is_public: bool,
    /// `true` for chunk documents.
    pub is_chunk: bool,
    /// Parent document ID, present only on chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_document_id: Option<String>,
    /// Ordinal position within the parent's chunk sequence, present
    /// only on chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    /// Total number of chunks; present on parents and echoed on chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_count: Option<usize>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a standalone (non-chunk) document with a fresh ID.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            category: "other".to_string(),
            tags: Vec::new(),
            embedding: Vec::new(),
            embedding_model: None,
            uploaded_by: String::new(),
            is_public: true,
            is_chunk: false,
            parent_document_id: None,
            chunk_index: None,
            chunk_count: None,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if this document is a parent of chunk documents.
    pub fn is_parent(&self) -> bool {
        !self.is_chunk && self.chunk_count.is_some_and(|n| n > 0)
    }
}

/// A retrieved [`Document`] with an optional transient similarity score.
///
/// The score is present only when retrieval used vector search; the
/// lexical text-search fallback carries no score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// The retrieved document.
    pub document: Document,
    /// The similarity score (higher is more relevant), if vector search
    /// was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

/// A reference to a source document attached to an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceRef {
    /// The source document's ID.
    pub id: String,
    /// The source document's title.
    pub title: String,
    /// Similarity score, if the source was found via vector search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    /// Category of the source document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Whether the source is a chunk document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_chunk: Option<bool>,
    /// Chunk position, if the source is a chunk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
}

impl SourceRef {
    /// Build a source reference from a retrieval result.
    pub fn from_retrieved(retrieved: &RetrievedDocument) -> Self {
        let doc = &retrieved.document;
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            similarity: retrieved.similarity,
            category: Some(doc.category.clone()),
            is_chunk: Some(doc.is_chunk),
            chunk_index: doc.chunk_index,
        }
    }
}

/// An answer produced by the answer generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The answer text.
    pub text: String,
    /// Source documents backing the answer. Empty when the generator
    /// had no context.
    pub sources: Vec<SourceRef>,
}

/// The response returned for a chat question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The question as asked.
    pub question: String,
    /// The answer text (generated or synthesized).
    pub answer: String,
    /// Source documents backing the answer.
    pub sources: Vec<SourceRef>,
    /// When the answer was produced.
    pub timestamp: DateTime<Utc>,
}

/// Identifying metadata returned after a document upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReceipt {
    /// The created document's ID (the parent's ID when chunked).
    pub id: String,
    /// The document title.
    pub title: String,
    /// The document category.
    pub category: String,
    /// Number of chunks created, absent for unchunked uploads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_created: Option<usize>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Filter for document listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentFilter {
    /// Restrict to this category.
    pub category: Option<String>,
    /// Match documents whose title, content, or tags contain this text.
    pub search_text: Option<String>,
    /// Include chunk documents; excluded by default.
    pub include_chunks: bool,
}

/// Pagination metadata for a document listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    /// Total documents matching the filter.
    pub total: usize,
    /// The requested page (1-based).
    pub page: usize,
    /// Total number of pages.
    pub pages: usize,
}

/// One page of a document listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentPage {
    /// Documents on this page, newest first.
    pub documents: Vec<Document>,
    /// Pagination metadata.
    pub pagination: Pagination,
}
