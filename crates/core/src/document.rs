//! Core document type.
//!
//! A `Document` is the unit the storage layer hands to a query: a unique ID,
//! a precomputed embedding, string metadata for equality filters, and text
//! content for content predicates. Queries only borrow documents.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored document with its embedding, metadata, and content.
///
/// Embeddings are expected to be unit length (see
/// [`normalize`](crate::similarity::normalize)) so that dot product equals
/// cosine similarity. Queries never re-normalize them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Identifier, unique within the document set passed to a query.
    pub id: String,
    /// Precomputed embedding vector.
    pub embedding: Vec<f32>,
    /// Key-value metadata for equality filtering.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// Text content, tested by content predicates.
    #[serde(default)]
    pub content: String,
}

impl Document {
    /// Creates a document without metadata.
    pub fn new(id: impl Into<String>, embedding: Vec<f32>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            embedding,
            metadata: HashMap::new(),
            content: content.into(),
        }
    }

    /// Adds or replaces a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }
}
