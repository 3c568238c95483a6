use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::error::AppError;

/// Request and outcome counters for monitoring
#[derive(Clone)]
pub struct Metrics {
    pub requests: Arc<AtomicU64>,
    pub bad_requests: Arc<AtomicU64>,
    pub timeouts: Arc<AtomicU64>,
    pub store_failures: Arc<AtomicU64>,
    pub assets_added: Arc<AtomicU64>,
    pub assets_removed: Arc<AtomicU64>,
    pub descriptions_updated: Arc<AtomicU64>,
    pub batch_items: Arc<AtomicU64>,
    pub started_at: DateTime<Utc>,
    pub start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(AtomicU64::new(0)),
            bad_requests: Arc::new(AtomicU64::new(0)),
            timeouts: Arc::new(AtomicU64::new(0)),
            store_failures: Arc::new(AtomicU64::new(0)),
            assets_added: Arc::new(AtomicU64::new(0)),
            assets_removed: Arc::new(AtomicU64::new(0)),
            descriptions_updated: Arc::new(AtomicU64::new(0)),
            batch_items: Arc::new(AtomicU64::new(0)),
            started_at: Utc::now(),
            start_time: Instant::now(),
        }
    }

    pub fn inc_requests(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_assets_added(&self, count: u64) {
        self.assets_added.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_assets_removed(&self) {
        self.assets_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_descriptions_updated(&self) {
        self.descriptions_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_batch_items(&self, count: u64) {
        self.batch_items.fetch_add(count, Ordering::Relaxed);
    }

    pub fn inc_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts a failed request by the class of its error.
    pub fn record_error(&self, err: &AppError) {
        match err {
            AppError::BadRequest(_) => {
                self.bad_requests.fetch_add(1, Ordering::Relaxed);
            }
            AppError::Timeout => self.inc_timeouts(),
            AppError::Store(_) | AppError::Internal(_) => self.inc_store_failures(),
        }
    }

    pub fn get_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            bad_requests: self.bad_requests.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            assets_added: self.assets_added.load(Ordering::Relaxed),
            assets_removed: self.assets_removed.load(Ordering::Relaxed),
            descriptions_updated: self.descriptions_updated.load(Ordering::Relaxed),
            batch_items: self.batch_items.load(Ordering::Relaxed),
            started_at: self.started_at.to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub bad_requests: u64,
    pub timeouts: u64,
    pub store_failures: u64,
    pub assets_added: u64,
    pub assets_removed: u64,
    pub descriptions_updated: u64,
    pub batch_items: u64,
    pub started_at: String,
    pub uptime_seconds: u64,
}
