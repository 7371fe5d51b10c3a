//! Search primitives: document filtering, bounded top-k selection, and
//! parallel exhaustive similarity search.
//!
//! These are the stages a query runs through: filter the candidate set, score
//! every surviving document, keep the best `k`.

/// Cooperative cancellation context with a first-wins error cause.
pub mod cancel;
/// Parallel similarity search over a filtered document slice.
pub mod engine;
/// Metadata and content filtering, sequential and parallel.
pub mod filter;
/// Thread-safe bounded top-k selector.
pub mod top_k;
/// Scored result type.
pub mod types;

pub use cancel::CancelToken;
pub use engine::{most_similar, most_similar_with};
pub use filter::{document_matches, filter_documents, filter_documents_with, matches_metadata};
pub use top_k::TopK;
pub use types::ScoredResult;
