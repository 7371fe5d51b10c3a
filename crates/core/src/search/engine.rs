//! Exhaustive parallel similarity search.
//!
//! The candidate slice is split into contiguous sub-slices, one per scoped
//! worker thread, with the remainder going to the last worker. Each worker
//! scores its documents against the query (and optionally a negative vector)
//! and offers survivors to a shared [`TopK`]. The first scoring failure
//! cancels the remaining work and is the only thing returned.

use crate::config;
use crate::document::Document;
use crate::error::{SearchError, SimilarityKind};
use crate::search::cancel::CancelToken;
use crate::search::top_k::TopK;
use crate::search::types::ScoredResult;
use crate::similarity::dot_product;

/// Query and negative vectors shared by all workers of one search.
#[derive(Debug, Clone, Copy)]
struct Scorer<'q> {
    query: &'q [f32],
    negative: &'q [f32],
    negative_threshold: f32,
}

impl Scorer<'_> {
    /// Scores one document. `Ok(None)` means the negative filter dropped it.
    fn score(&self, doc: &Document) -> Result<Option<ScoredResult>, SearchError> {
        // Vectors are normalized upstream, so the dot product is the cosine similarity.
        let similarity =
            dot_product(self.query, &doc.embedding).map_err(|source| SearchError::Similarity {
                id: doc.id.clone(),
                kind: SimilarityKind::Query,
                source,
            })?;

        if self.negative_threshold > 0.0 {
            let negative_similarity = dot_product(self.negative, &doc.embedding).map_err(
                |source| SearchError::Similarity {
                    id: doc.id.clone(),
                    kind: SimilarityKind::Negative,
                    source,
                },
            )?;
            if negative_similarity > self.negative_threshold {
                tracing::trace!(
                    "Dropping '{}': negative similarity {} > {}",
                    doc.id,
                    negative_similarity,
                    self.negative_threshold
                );
                return Ok(None);
            }
        }

        Ok(Some(ScoredResult {
            id: doc.id.clone(),
            similarity,
        }))
    }

    /// Worker loop over one sub-slice. Checks for cancellation before each
    /// document and records its own failure on `ctx`.
    fn run(&self, docs: &[&Document], top: &TopK, ctx: &CancelToken) {
        for doc in docs {
            if ctx.is_cancelled() {
                return;
            }
            match self.score(doc) {
                Ok(Some(result)) => top.add(result),
                Ok(None) => {}
                Err(e) => {
                    ctx.cancel(e);
                    return;
                }
            }
        }
    }
}

/// Returns the `k` documents most similar to `query`, best first.
///
/// When `negative_threshold > 0`, documents whose similarity to `negative`
/// exceeds it are left out. A threshold `<= 0` disables the negative filter
/// and `negative` is ignored. Uses one worker per available CPU.
pub fn most_similar(
    ctx: &CancelToken,
    query: &[f32],
    negative: &[f32],
    negative_threshold: f32,
    documents: &[&Document],
    k: usize,
) -> Result<Vec<ScoredResult>, SearchError> {
    most_similar_with(
        ctx,
        query,
        negative,
        negative_threshold,
        documents,
        k,
        config::available_parallelism(),
    )
}

/// Like [`most_similar`] with an explicit upper bound on worker threads.
///
/// Errors with the first [`SearchError::Similarity`] any worker hits, or with
/// [`SearchError::Cancelled`] if `ctx` was cancelled by the caller. No partial
/// ranking is ever returned together with an error.
pub fn most_similar_with(
    ctx: &CancelToken,
    query: &[f32],
    negative: &[f32],
    negative_threshold: f32,
    documents: &[&Document],
    k: usize,
    concurrency: usize,
) -> Result<Vec<ScoredResult>, SearchError> {
    if ctx.is_cancelled() {
        return Err(SearchError::Cancelled);
    }
    if documents.is_empty() {
        return Ok(Vec::new());
    }

    let top = TopK::new(k);
    let scorer = Scorer {
        query,
        negative,
        negative_threshold,
    };
    // Shared error slot for the workers. Caller cancellation flows down into it.
    let shared = ctx.child();

    let concurrency = concurrency.clamp(1, documents.len());
    let sub_slice_size = documents.len() / concurrency;
    std::thread::scope(|s| {
        for i in 0..concurrency {
            let start = i * sub_slice_size;
            let end = if i == concurrency - 1 {
                documents.len()
            } else {
                start + sub_slice_size
            };
            let sub_slice = &documents[start..end];
            let (scorer, top, shared) = (&scorer, &top, &shared);
            s.spawn(move || scorer.run(sub_slice, top, shared));
        }
    });

    if let Some(err) = shared.cause() {
        tracing::warn!("Similarity search failed: {}", err);
        return Err(err);
    }
    if ctx.is_cancelled() {
        return Err(SearchError::Cancelled);
    }

    let results = top.into_sorted_vec();
    tracing::debug!(
        "Scored {} documents with {} workers, returning {} of k={}",
        documents.len(),
        concurrency,
        results.len(),
        k
    );
    Ok(results)
}
