//! Health signal for the best-effort persistence path.
//!
//! Store failures never fail the operation that triggered them, so they are
//! counted here instead. The mirror is reported unhealthy once
//! `failure_threshold` consecutive jobs have failed, and healthy again after
//! the next success.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::domain::StoreError;

/// Consecutive failures after which persistence is reported unhealthy
pub const DEFAULT_FAILURE_THRESHOLD: u64 = 5;

#[derive(Debug)]
pub struct PersistenceHealth {
    failure_threshold: u64,
    consecutive_failures: AtomicU64,
    total_failures: AtomicU64,
    completed_jobs: AtomicU64,
    dropped_jobs: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub healthy: bool,
    pub consecutive_failures: u64,
    pub total_failures: u64,
    pub completed_jobs: u64,
    pub dropped_jobs: u64,
}

impl PersistenceHealth {
    pub fn new(failure_threshold: u64) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            consecutive_failures: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            completed_jobs: AtomicU64::new(0),
            dropped_jobs: AtomicU64::new(0),
        }
    }

    pub fn record_success(&self) {
        self.completed_jobs.fetch_add(1, Ordering::Relaxed);
        let previous = self.consecutive_failures.swap(0, Ordering::Relaxed);
        if previous >= self.failure_threshold {
            tracing::info!("Persistence recovered after {} consecutive failures", previous);
        }
    }

    pub fn record_failure(&self, error: &StoreError) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
        let consecutive = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if consecutive == self.failure_threshold {
            tracing::error!(
                "Persistence unhealthy: {} consecutive failures, last: {}",
                consecutive,
                error
            );
        }
    }

    /// A job was discarded before reaching the store (full or closed queue)
    pub fn record_dropped(&self) {
        self.dropped_jobs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures.load(Ordering::Relaxed) < self.failure_threshold
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            healthy: self.is_healthy(),
            consecutive_failures: self.consecutive_failures.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            completed_jobs: self.completed_jobs.load(Ordering::Relaxed),
            dropped_jobs: self.dropped_jobs.load(Ordering::Relaxed),
        }
    }
}

impl Default for PersistenceHealth {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}
