//! # simquery-core
//!
//! Query-time core of an embeddable vector search engine: exhaustive
//! similarity scoring over a caller-supplied document set, with metadata and
//! content filters, negative-query steering, and a thread-safe bounded top-k.
//!
//! The crate does no I/O and holds no documents between calls. Storage and
//! embedding generation belong to the caller.
//!
//! ```no_run
//! use simquery_core::{CancelToken, Document, DocumentPredicate, Query, QueryEngine};
//! use std::collections::HashMap;
//!
//! let mut docs = HashMap::new();
//! let doc = Document::new("a", vec![1.0, 0.0], "hello world").with_metadata("lang", "en");
//! docs.insert(doc.id.clone(), doc);
//!
//! let query = Query::new(vec![1.0, 0.0], 5)
//!     .where_metadata("lang", "en")
//!     .where_document(DocumentPredicate::contains("hello"));
//! let matches = QueryEngine::default().query(&CancelToken::new(), &docs, &query)?;
//! assert_eq!(matches[0].document.id, "a");
//! # Ok::<(), simquery_core::QueryError>(())
//! ```

/// Limits, defaults, and the runtime worker configuration.
pub mod config;
/// Core document type.
pub mod document;
/// Error types for validation, scoring, and queries.
pub mod error;
/// Metadata filters and document content predicates.
pub mod filter_types;
/// Query orchestration over a document map.
pub mod query;
/// Search primitives: filtering, top-k selection, and parallel scoring.
pub mod search;
/// Dot product and vector normalization helpers.
pub mod similarity;

pub use config::QueryConfig;
pub use document::Document;
pub use error::{DimensionMismatch, QueryError, SearchError, SimilarityKind, ValidationError};
pub use filter_types::{DocumentPredicate, MetadataFilter, Operator, WhereDocument};
pub use query::{NegativeMode, NegativeQuery, Query, QueryEngine, QueryMatch};
pub use search::{CancelToken, ScoredResult, TopK};
