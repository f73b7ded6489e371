//! # adama-rag
//!
//! Retrieval-augmented generation backend for the Adama hotel & food
//! chat assistant. Questions are embedded, matched against a document
//! store by vector similarity (with a lexical fallback when embedding
//! is unavailable), and answered by a generative model grounded in the
//! retrieved text — or by a deterministic synthesis fallback when the
//! model is down or rate limited.
//!
//! External collaborators sit behind traits: [`EmbeddingProvider`],
//! [`GenerationProvider`], and [`DocumentStore`]. Gemini REST
//! implementations of the providers ship in [`gemini`]; an in-memory
//! store for development and tests ships in [`memory`].
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use adama_rag::{
//!     AssistantConfig, ChatService, GeminiEmbeddingProvider,
//!     GeminiGenerationProvider, InMemoryDocumentStore,
//! };
//!
//! let service = ChatService::builder()
//!     .config(AssistantConfig::default())
//!     .embedding_provider(Arc::new(GeminiEmbeddingProvider::from_env()?))
//!     .generation_provider(Arc::new(GeminiGenerationProvider::from_env()?))
//!     .store(Arc::new(InMemoryDocumentStore::new()))
//!     .build()?;
//!
//! service.upload_document("Menu", "Injera with doro wot...", "admin", None, vec![]).await?;
//! let response = service.ask_question("Where can I eat injera?").await?;
//! println!("{}", response.answer);
//! ```

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod ingest;
pub mod memory;
pub mod retrieval;
pub mod service;
pub mod store;
pub mod text;

pub use config::{AssistantConfig, AssistantConfigBuilder};
pub use document::{
    Answer, ChatResponse, Document, DocumentFilter, DocumentPage, DocumentReceipt, Pagination,
    RetrievedDocument, SourceRef,
};
pub use embedding::{EmbeddingGenerator, EmbeddingOutcome, EmbeddingProvider};
pub use error::{AssistantError, ProviderError, Result};
pub use gemini::{GeminiEmbeddingProvider, GeminiGenerationProvider};
pub use generation::{AnswerGenerator, GenerationProvider, GenerationRequest};
pub use ingest::Ingestor;
pub use memory::InMemoryDocumentStore;
pub use retrieval::Retriever;
pub use service::{ChatService, ChatServiceBuilder};
pub use store::DocumentStore;
pub use text::{TextChunk, chunk_text, clean_text, truncate_text};
