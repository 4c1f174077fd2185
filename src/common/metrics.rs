//! Process-wide protocol counters, rendered in Prometheus text format.

use once_cell::sync::Lazy;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics registry
pub static METRICS: Lazy<Metrics> = Lazy::new(Metrics::default);

/// Counter for tracking event counts
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct Metrics {
    pub cache_hits: Counter,
    pub cache_misses: Counter,
    pub cache_invalidations: Counter,
    /// Attempts made against a second (or later) candidate
    pub failovers: Counter,
    /// Requests where every replica in the set failed
    pub upstream_unavailable: Counter,
    pub replication_sent: Counter,
    pub replication_failed: Counter,
    /// Invalidation callbacks that could not reach the front
    pub invalidation_failed: Counter,
    pub purchases: Counter,
}

impl Metrics {
    /// Render all counters. `cache_entries` is reported as a gauge when known.
    pub fn render_prometheus(&self, cache_entries: Option<usize>) -> String {
        let counters: [(&str, &str, &Counter); 9] = [
            ("storefront_cache_hits_total", "Reads served from the response cache", &self.cache_hits),
            ("storefront_cache_misses_total", "Reads forwarded to a replica", &self.cache_misses),
            (
                "storefront_cache_invalidations_total",
                "Invalidation callbacks received",
                &self.cache_invalidations,
            ),
            ("storefront_failovers_total", "Dispatch attempts past the first candidate", &self.failovers),
            (
                "storefront_upstream_unavailable_total",
                "Requests where every replica failed",
                &self.upstream_unavailable,
            ),
            ("storefront_replication_sent_total", "Replication messages acknowledged by the peer", &self.replication_sent),
            ("storefront_replication_failed_total", "Replication messages dropped", &self.replication_failed),
            (
                "storefront_invalidation_failed_total",
                "Invalidation callbacks that failed",
                &self.invalidation_failed,
            ),
            ("storefront_purchases_total", "Completed purchases", &self.purchases),
        ];

        let mut out = String::new();
        for (name, help, counter) in counters {
            let _ = writeln!(out, "# HELP {} {}", name, help);
            let _ = writeln!(out, "# TYPE {} counter", name);
            let _ = writeln!(out, "{} {}", name, counter.get());
        }
        if let Some(entries) = cache_entries {
            let _ = writeln!(out, "# HELP storefront_cache_entries Resident cache entries, expired included");
            let _ = writeln!(out, "# TYPE storefront_cache_entries gauge");
            let _ = writeln!(out, "storefront_cache_entries {}", entries);
        }
        out
    }
}
