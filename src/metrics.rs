//! Translation metrics: cache hit rates, provider calls, timeouts and
//! writes for a `Reconciler`.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters owned by one `Reconciler`.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of times a translation was found in the cache
    cache_hits: AtomicUsize,

    /// Number of times a translation was not found in the cache
    cache_misses: AtomicUsize,

    /// Number of calls made to the translation provider
    provider_calls: AtomicUsize,

    /// Number of provider calls that failed
    provider_failures: AtomicUsize,

    /// Number of provider calls abandoned at the phrase deadline
    timeouts: AtomicUsize,

    /// Number of locale files persisted
    files_written: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_call(&self) {
        self.provider_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_file_written(&self) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters.
    pub fn report(&self) -> MetricsReport {
        MetricsReport::from_counts(
            self.cache_hits.load(Ordering::Relaxed),
            self.cache_misses.load(Ordering::Relaxed),
            self.provider_calls.load(Ordering::Relaxed),
            self.provider_failures.load(Ordering::Relaxed),
            self.timeouts.load(Ordering::Relaxed),
            self.files_written.load(Ordering::Relaxed),
        )
    }
}

/// Metrics report containing translation statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsReport {
    /// Number of cache hits
    pub cache_hits: usize,

    /// Number of cache misses
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    /// Number of provider calls made
    pub provider_calls: usize,

    /// Number of provider failures
    pub provider_failures: usize,

    /// Provider success rate as a percentage (0-100)
    pub provider_success_rate: f64,

    /// Number of phrases skipped at the deadline
    pub timeouts: usize,

    /// Number of locale files persisted
    pub files_written: usize,
}

impl MetricsReport {
    fn from_counts(
        cache_hits: usize,
        cache_misses: usize,
        provider_calls: usize,
        provider_failures: usize,
        timeouts: usize,
        files_written: usize,
    ) -> Self {
        let total_cache_queries = cache_hits + cache_misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (cache_hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        let provider_success_rate = if provider_calls > 0 {
            (provider_calls.saturating_sub(provider_failures) as f64 / provider_calls as f64)
                * 100.0
        } else {
            0.0
        };

        Self {
            cache_hits,
            cache_misses,
            cache_hit_rate,
            provider_calls,
            provider_failures,
            provider_success_rate,
            timeouts,
            files_written,
        }
    }

    /// Counters accumulated since an earlier snapshot.
    pub fn since(&self, earlier: &MetricsReport) -> MetricsReport {
        Self::from_counts(
            self.cache_hits.saturating_sub(earlier.cache_hits),
            self.cache_misses.saturating_sub(earlier.cache_misses),
            self.provider_calls.saturating_sub(earlier.provider_calls),
            self.provider_failures.saturating_sub(earlier.provider_failures),
            self.timeouts.saturating_sub(earlier.timeouts),
            self.files_written.saturating_sub(earlier.files_written),
        )
    }

    /// Format as a human-readable string.
    pub fn format(&self) -> String {
        format!(
            "Cache: {} hits, {} misses ({:.1}% hit rate) | Provider: {} calls, {} failures ({:.1}% success rate) | {} timeouts | {} files written",
            self.cache_hits,
            self.cache_misses,
            self.cache_hit_rate,
            self.provider_calls,
            self.provider_failures,
            self.provider_success_rate,
            self.timeouts,
            self.files_written
        )
    }
}
