//! Cache metrics
//!
//! Process-wide counters plus a bounded rolling window of latency samples.
//! Reset only on restart.

use crate::constants::LATENCY_WINDOW_SIZE;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Rolling cache metrics
///
/// When disabled, every recorder is a no-op and the snapshot stays zeroed.
#[derive(Debug)]
pub struct CacheMetrics {
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    total_requests: AtomicU64,
    latency_samples: Mutex<VecDeque<f64>>,
}

/// Point-in-time view of the metrics with derived rates
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub sets: u64,
    pub deletes: u64,
    pub total_requests: u64,
    pub hit_rate: f64,
    pub avg_latency_ms: f64,
}

impl CacheMetrics {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            latency_samples: Mutex::new(VecDeque::with_capacity(LATENCY_WINDOW_SIZE)),
        }
    }

    pub fn record_hit(&self) {
        if self.enabled {
            self.hits.fetch_add(1, Ordering::Relaxed);
            self.total_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_miss(&self) {
        if self.enabled {
            self.misses.fetch_add(1, Ordering::Relaxed);
            self.total_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_error(&self) {
        if self.enabled {
            self.errors.fetch_add(1, Ordering::Relaxed);
            self.total_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_set(&self) {
        if self.enabled {
            self.sets.fetch_add(1, Ordering::Relaxed);
            self.total_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_delete(&self) {
        if self.enabled {
            self.deletes.fetch_add(1, Ordering::Relaxed);
            self.total_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record the elapsed time of one backend round trip
    pub fn record_latency(&self, started: Instant) {
        if !self.enabled {
            return;
        }
        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        let mut samples = match self.latency_samples.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if samples.len() >= LATENCY_WINDOW_SIZE {
            samples.pop_front();
        }
        samples.push_back(elapsed_ms);
    }

    /// Snapshot the counters with hit rate and average latency computed
    pub fn snapshot(&self) -> MetricsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 {
            hits as f64 / lookups as f64
        } else {
            0.0
        };

        let avg_latency_ms = {
            let samples = match self.latency_samples.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if samples.is_empty() {
                0.0
            } else {
                samples.iter().sum::<f64>() / samples.len() as f64
            }
        };

        MetricsSnapshot {
            hits,
            misses,
            errors: self.errors.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            hit_rate,
            avg_latency_ms,
        }
    }
}
