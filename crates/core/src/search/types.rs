//! Scored result type for similarity search.

use serde::{Deserialize, Serialize};

/// A document ID with its similarity to the query (higher = more similar).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    /// ID of the scored document.
    pub id: String,
    /// Dot product with the query vector (cosine similarity for unit vectors).
    pub similarity: f32,
}

impl ScoredResult {
    pub fn new(id: impl Into<String>, similarity: f32) -> Self {
        Self {
            id: id.into(),
            similarity,
        }
    }
}
