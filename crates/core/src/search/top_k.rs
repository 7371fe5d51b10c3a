//! Thread-safe bounded top-k selection.
//!
//! [`TopK`] keeps the `k` highest-similarity results seen so far. The heap is
//! ordered so its root is the lowest retained similarity, which makes the
//! "is this candidate better than the worst one we kept?" check O(1) and the
//! replacement O(log k).

use crate::search::types::ScoredResult;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

const PREALLOCATE_LIMIT: usize = 4096;

/// Ordering key for a similarity. NaN ranks below every number, so it can
/// never displace a real match.
#[inline]
fn rank_key(similarity: f32) -> OrderedFloat<f32> {
    if similarity.is_nan() {
        OrderedFloat(f32::NEG_INFINITY)
    } else {
        OrderedFloat(similarity)
    }
}

/// Heap entry ordered by similarity only.
#[derive(Debug, Clone)]
struct Entry {
    similarity: f32,
    id: String,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        rank_key(self.similarity).cmp(&rank_key(other.similarity))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fixed-capacity collection of the best results, safe for concurrent [`add`](Self::add).
///
/// [`values`](Self::values) may run concurrently with `add`, but its output is
/// only authoritative once every `add` for the query has returned.
#[derive(Debug)]
pub struct TopK {
    heap: RwLock<BinaryHeap<Reverse<Entry>>>,
    size: usize,
}

impl TopK {
    /// Creates an empty selector retaining at most `size` results.
    pub fn new(size: usize) -> Self {
        Self {
            // Large k grows on demand instead of reserving up front.
            heap: RwLock::new(BinaryHeap::with_capacity(size.min(PREALLOCATE_LIMIT))),
            size,
        }
    }

    /// Offers a candidate. Kept if there is room or if it beats the current
    /// minimum; on a tie the existing entry stays.
    pub fn add(&self, candidate: ScoredResult) {
        let mut heap = self.heap.write();
        let entry = Entry {
            similarity: candidate.similarity,
            id: candidate.id,
        };
        if heap.len() < self.size {
            heap.push(Reverse(entry));
        } else if let Some(mut worst) = heap.peek_mut() {
            if worst.0 < entry {
                // PeekMut re-sifts on drop: one pop + push in a single pass
                *worst = Reverse(entry);
            }
        }
    }

    /// Retained results sorted by similarity, descending. Tie order is unspecified.
    pub fn values(&self) -> Vec<ScoredResult> {
        let heap = self.heap.read();
        let mut results: Vec<ScoredResult> = heap
            .iter()
            .map(|Reverse(e)| ScoredResult {
                id: e.id.clone(),
                similarity: e.similarity,
            })
            .collect();
        results.sort_unstable_by(|a, b| rank_key(b.similarity).cmp(&rank_key(a.similarity)));
        results
    }

    /// Consumes the selector, returning results sorted by similarity, descending.
    pub fn into_sorted_vec(self) -> Vec<ScoredResult> {
        // Ascending order of Reverse<Entry> is descending similarity.
        self.heap
            .into_inner()
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(e)| ScoredResult {
                id: e.id,
                similarity: e.similarity,
            })
            .collect()
    }

    /// Maximum number of retained results.
    pub fn capacity(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.heap.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.read().is_empty()
    }
}
