//! Document filtering for queries.
//!
//! A document is eligible when its metadata satisfies every entry of a
//! [`MetadataFilter`] and its content satisfies every top-level
//! [`DocumentPredicate`]. [`filter_documents`] evaluates this over a whole
//! collection on a short-lived pool of scoped worker threads.

use crate::config;
use crate::document::Document;
use crate::filter_types::{DocumentPredicate, MetadataFilter};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Check that every filter key is present in `metadata` with exactly the
/// required value. A missing key never matches, even for an empty value.
pub fn matches_metadata(metadata: &HashMap<String, String>, filter: &MetadataFilter) -> bool {
    filter
        .iter()
        .all(|(key, want)| metadata.get(key).is_some_and(|have| have == want))
}

/// Combined eligibility test. Predicates must already be validated.
/// The top-level predicate list is AND-ed; empty filters match everything.
pub fn document_matches(
    document: &Document,
    metadata_filter: &MetadataFilter,
    predicates: &[DocumentPredicate],
) -> bool {
    matches_metadata(&document.metadata, metadata_filter)
        && predicates.iter().all(|p| p.matches(&document.content))
}

/// Returns the documents passing [`document_matches`], using one worker per
/// available CPU (at most one per document). Output order is unspecified.
pub fn filter_documents<'a>(
    documents: &'a HashMap<String, Document>,
    metadata_filter: &MetadataFilter,
    predicates: &[DocumentPredicate],
) -> Vec<&'a Document> {
    filter_documents_with(
        documents,
        metadata_filter,
        predicates,
        config::available_parallelism(),
    )
}

/// Like [`filter_documents`] with an explicit upper bound on worker threads.
///
/// Returns an unallocated empty `Vec` when nothing matches.
pub fn filter_documents_with<'a>(
    documents: &'a HashMap<String, Document>,
    metadata_filter: &MetadataFilter,
    predicates: &[DocumentPredicate],
    concurrency: usize,
) -> Vec<&'a Document> {
    if documents.is_empty() {
        return Vec::new();
    }
    let concurrency = concurrency.clamp(1, documents.len());
    let candidates: Vec<&Document> = documents.values().collect();
    let chunk_size = candidates.len().div_ceil(concurrency);
    let filtered: Mutex<Vec<&Document>> = Mutex::new(Vec::new());

    std::thread::scope(|s| {
        for chunk in candidates.chunks(chunk_size) {
            let filtered = &filtered;
            s.spawn(move || {
                let passing: Vec<&Document> = chunk
                    .iter()
                    .copied()
                    .filter(|doc| document_matches(doc, metadata_filter, predicates))
                    .collect();
                if !passing.is_empty() {
                    filtered.lock().extend(passing);
                }
            });
        }
    });

    let filtered = filtered.into_inner();
    tracing::debug!(
        "Filtered {} of {} documents with {} workers",
        filtered.len(),
        documents.len(),
        concurrency
    );
    filtered
}
