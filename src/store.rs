//! Document store trait: the persistence seam the pipeline consumes.

use async_trait::async_trait;

use crate::document::{Document, DocumentFilter, RetrievedDocument};
use crate::error::Result;

/// A storage backend for documents and their embeddings.
///
/// The pipeline treats the store as an external collaborator: it only
/// requires single-record writes, vector and lexical search, and
/// filtered listing. Store failures surface as
/// [`AssistantError::Store`](crate::error::AssistantError::Store) and
/// propagate to the request boundary; the pipeline does not retry.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document. IDs are assigned by the caller.
    async fn insert(&self, document: Document) -> Result<()>;

    /// Look up a document by ID.
    async fn find_by_id(&self, id: &str) -> Result<Option<Document>>;

    /// Search for the `limit` documents nearest to `embedding`.
    ///
    /// Returns results ordered by descending similarity; ties resolve
    /// in store-defined order. Documents whose stored embedding has a
    /// different dimensionality than the query are not eligible.
    async fn vector_search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RetrievedDocument>>;

    /// Lexical search over title, content, and tags.
    ///
    /// Results carry no similarity score.
    async fn text_search(&self, query: &str, limit: usize) -> Result<Vec<Document>>;

    /// Delete a document by ID. Returns `true` if a document was removed.
    async fn delete_by_id(&self, id: &str) -> Result<bool>;

    /// Delete all chunk documents referencing `parent_id`.
    ///
    /// Returns the number of documents removed.
    async fn delete_by_parent_id(&self, parent_id: &str) -> Result<usize>;

    /// Count public documents matching the filter.
    async fn count(&self, filter: &DocumentFilter) -> Result<usize>;

    /// List public documents matching the filter, newest first.
    async fn find(
        &self,
        filter: &DocumentFilter,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Document>>;
}
