//! Query orchestration: argument checks, filtering, negative handling, and
//! scoring, in that order.
//!
//! [`QueryEngine::query`] is the entry point for callers holding a document
//! map. Everything that can be rejected up front is rejected before any worker
//! thread starts.

use crate::config::{self, QueryConfig};
use crate::document::Document;
use crate::error::QueryError;
use crate::filter_types::{DocumentPredicate, MetadataFilter};
use crate::search::{filter_documents_with, most_similar_with, CancelToken};
use crate::similarity::{normalize, subtract};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const NO_NEGATIVE: &[f32] = &[];

/// How a negative embedding steers results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeMode {
    /// Drop documents whose similarity to the negative exceeds the threshold.
    #[default]
    Filter,
    /// Search with `normalize(query - negative)` instead of the query.
    Subtract,
    /// Subtract, then also apply the threshold filter.
    SubtractFilter,
}

impl NegativeMode {
    /// Whether this mode drops documents above the negative threshold.
    pub fn filters(&self) -> bool {
        matches!(self, NegativeMode::Filter | NegativeMode::SubtractFilter)
    }

    /// Whether this mode moves the query away from the negative.
    pub fn subtracts(&self) -> bool {
        matches!(self, NegativeMode::Subtract | NegativeMode::SubtractFilter)
    }
}

/// A negative embedding and how to apply it.
#[derive(Debug, Clone, PartialEq)]
pub struct NegativeQuery {
    pub embedding: Vec<f32>,
    pub mode: NegativeMode,
    /// Only used by the filter modes. `<= 0` disables filtering.
    pub filter_threshold: f32,
}

impl NegativeQuery {
    /// Filter mode with [`config::DEFAULT_NEGATIVE_FILTER_THRESHOLD`].
    pub fn new(embedding: Vec<f32>) -> Self {
        Self {
            embedding,
            mode: NegativeMode::Filter,
            filter_threshold: config::DEFAULT_NEGATIVE_FILTER_THRESHOLD,
        }
    }

    pub fn with_mode(mut self, mode: NegativeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_threshold(mut self, filter_threshold: f32) -> Self {
        self.filter_threshold = filter_threshold;
        self
    }
}

/// A similarity query over a set of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// Query embedding, expected to be normalized.
    pub embedding: Vec<f32>,
    /// Maximum number of results.
    pub n_results: usize,
    pub where_metadata: MetadataFilter,
    /// Content predicates, AND-ed.
    pub where_document: Vec<DocumentPredicate>,
    pub negative: Option<NegativeQuery>,
}

impl Query {
    pub fn new(embedding: Vec<f32>, n_results: usize) -> Self {
        Self {
            embedding,
            n_results,
            where_metadata: MetadataFilter::new(),
            where_document: Vec::new(),
            negative: None,
        }
    }

    /// Requires `metadata[key] == value`.
    pub fn where_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.where_metadata.insert(key.into(), value.into());
        self
    }

    /// Adds a content predicate.
    pub fn where_document(mut self, predicate: DocumentPredicate) -> Self {
        self.where_document.push(predicate);
        self
    }

    pub fn negative(mut self, negative: NegativeQuery) -> Self {
        self.negative = Some(negative);
        self
    }

    /// Checks everything that does not depend on the documents.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.n_results == 0 || self.n_results > config::MAX_K {
            return Err(QueryError::InvalidResultCount(self.n_results));
        }
        let dim = self.embedding.len();
        if dim == 0 || dim > config::MAX_DIMENSION {
            return Err(QueryError::InvalidDimension(dim));
        }
        if let Some(neg) = &self.negative {
            if neg.embedding.len() != dim {
                return Err(QueryError::NegativeDimension {
                    expected: dim,
                    actual: neg.embedding.len(),
                });
            }
            if neg.mode.filters() && !neg.filter_threshold.is_finite() {
                return Err(QueryError::InvalidThreshold(neg.filter_threshold));
            }
        }
        for predicate in &self.where_document {
            predicate.validate()?;
        }
        Ok(())
    }

    /// Effective `(query, negative, threshold)` for the search stage.
    fn search_vectors(&self) -> Result<(Vec<f32>, &[f32], f32), QueryError> {
        let Some(neg) = &self.negative else {
            return Ok((self.embedding.clone(), NO_NEGATIVE, 0.0));
        };
        let query = if neg.mode.subtracts() {
            let diff = subtract(&self.embedding, &neg.embedding).map_err(|e| {
                QueryError::NegativeDimension {
                    expected: e.expected,
                    actual: e.actual,
                }
            })?;
            normalize(&diff)
        } else {
            self.embedding.clone()
        };
        let threshold = if neg.mode.filters() {
            neg.filter_threshold
        } else {
            0.0
        };
        Ok((query, &neg.embedding, threshold))
    }
}

/// A document matched by a query, with its similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch<'d> {
    pub document: &'d Document,
    pub similarity: f32,
}

/// Runs queries with a fixed worker configuration.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    /// Engine configured from the environment (see [`QueryConfig::from_env`]).
    pub fn from_env() -> Self {
        Self::new(QueryConfig::from_env())
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Validates `query`, filters `documents`, and returns the best matches,
    /// most similar first. Fewer than `n_results` eligible documents is not an
    /// error; the result is just shorter.
    pub fn query<'d>(
        &self,
        ctx: &CancelToken,
        documents: &'d HashMap<String, Document>,
        query: &Query,
    ) -> Result<Vec<QueryMatch<'d>>, QueryError> {
        query.validate()?;
        let concurrency = self.config.concurrency();

        let candidates = filter_documents_with(
            documents,
            &query.where_metadata,
            &query.where_document,
            concurrency,
        );
        if candidates.is_empty() {
            tracing::debug!("No documents left after filtering");
            return Ok(Vec::new());
        }

        let (query_vector, negative, threshold) = query.search_vectors()?;
        let scored = most_similar_with(
            ctx,
            &query_vector,
            negative,
            threshold,
            &candidates,
            query.n_results,
            concurrency,
        )?;

        Ok(scored
            .into_iter()
            .filter_map(|r| {
                documents.get(&r.id).map(|document| QueryMatch {
                    document,
                    similarity: r.similarity,
                })
            })
            .collect())
    }
}
