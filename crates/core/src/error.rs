//! Error types for predicate validation, similarity scoring, and queries.
//!
//! Validation errors are raised before any parallel work starts. Search errors
//! are first-wins across workers: a caller gets exactly one error and never a
//! partial ranking alongside it.

use crate::filter_types::Operator;
use thiserror::Error;

/// A malformed document predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("where document operator is empty")]
    EmptyOperator,
    #[error("unsupported where document operator {0}")]
    UnsupportedOperator(String),
    #[error("where document operator {0} requires a value")]
    MissingValue(Operator),
    #[error("where document operator {0} must have at least one sub-filter")]
    MissingSubPredicates(Operator),
}

/// Two vectors of different length were compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("vectors must have the same length (got {expected} and {actual})")]
pub struct DimensionMismatch {
    pub expected: usize,
    pub actual: usize,
}

/// Which reference vector a failed similarity was computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimilarityKind {
    Query,
    Negative,
}

impl std::fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityKind::Query => f.write_str("similarity"),
            SimilarityKind::Negative => f.write_str("negative similarity"),
        }
    }
}

/// Failure of the parallel similarity-search stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Scoring one document failed. Names the document at fault.
    #[error("couldn't calculate {kind} for document '{id}': {source}")]
    Similarity {
        id: String,
        kind: SimilarityKind,
        #[source]
        source: DimensionMismatch,
    },
    /// The caller's context was cancelled before the search finished.
    #[error("search cancelled")]
    Cancelled,
}

impl SearchError {
    /// ID of the document that caused the error, if any.
    pub fn document_id(&self) -> Option<&str> {
        match self {
            SearchError::Similarity { id, .. } => Some(id),
            SearchError::Cancelled => None,
        }
    }
}

/// Failure of a full query: argument checks, predicate validation, or search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("n_results must be between 1 and {max}, got {0}", max = crate::config::MAX_K)]
    InvalidResultCount(usize),
    #[error("query embedding dimension must be between 1 and {max}, got {0}", max = crate::config::MAX_DIMENSION)]
    InvalidDimension(usize),
    #[error("negative embedding has dimension {actual}, query has {expected}")]
    NegativeDimension { expected: usize, actual: usize },
    #[error("negative filter threshold must be finite, got {0}")]
    InvalidThreshold(f32),
    #[error(transparent)]
    Search(#[from] SearchError),
}
