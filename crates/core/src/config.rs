//! Configuration for query execution.
//!
//! Input validation limits and tuning defaults are compile-time constants.
//! The only runtime knob is the worker count, carried by [`QueryConfig`] and
//! overridable from the environment.

use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Maximum number of results (`n_results`) per query.
pub const MAX_K: usize = 10_000;

/// Maximum allowed embedding dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Negative similarity above which a document is dropped when a negative
/// query runs in filter mode without an explicit threshold.
pub const DEFAULT_NEGATIVE_FILTER_THRESHOLD: f32 = 0.5;

/// Allowed deviation of a vector's squared length from 1.0 for it to count as
/// normalized.
pub const NORMALIZATION_TOLERANCE: f32 = 1e-4;

/// Environment variable overriding the worker count of filter and search stages.
pub const CONCURRENCY_ENV_VAR: &str = "SIMQUERY_MAX_CONCURRENCY";

/// Worker count used when the platform cannot report its parallelism.
pub const FALLBACK_CONCURRENCY: usize = 1;

/// Runtime configuration for a [`QueryEngine`](crate::query::QueryEngine).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Upper bound on worker threads per stage. `None` uses every available core.
    #[serde(default)]
    pub max_concurrency: Option<usize>,
}

impl QueryConfig {
    /// Creates a configuration with a fixed worker count.
    pub fn with_concurrency(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: Some(max_concurrency),
        }
    }

    /// Reads [`CONCURRENCY_ENV_VAR`]. Unset, empty, zero, or unparsable values
    /// fall back to the default.
    pub fn from_env() -> Self {
        let max_concurrency = std::env::var(CONCURRENCY_ENV_VAR)
            .ok()
            .and_then(|raw| match raw.trim().parse::<usize>() {
                Ok(0) => None,
                Ok(n) => Some(n),
                Err(e) => {
                    tracing::warn!("Ignoring {}={:?}: {}", CONCURRENCY_ENV_VAR, raw, e);
                    None
                }
            });
        Self { max_concurrency }
    }

    /// Resolves the worker count: the override if set, capped by the
    /// available parallelism. Always at least 1.
    pub fn concurrency(&self) -> usize {
        let available = available_parallelism();
        match self.max_concurrency {
            Some(n) => n.clamp(1, available),
            None => available,
        }
    }
}

/// Number of CPUs the process may use, or [`FALLBACK_CONCURRENCY`].
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_CONCURRENCY)
}
