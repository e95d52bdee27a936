//! Batch counters and tracing setup

use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber, honoring `RUST_LOG` (default `info`)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Counters shared by every item run of one batch
#[derive(Debug, Default)]
pub struct Metrics {
    attempts: AtomicU64,
    downloaded: AtomicU64,
    empty: AtomicU64,
    saved: AtomicU64,
    save_failed: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    bytes_saved: AtomicU64,
    inflight: AtomicUsize,
    peak_inflight: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fetch call is about to start
    pub fn fetch_started(&self) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let now = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_inflight.fetch_max(now, Ordering::SeqCst);
    }

    pub fn fetch_finished(&self) {
        self.inflight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn downloaded(&self) {
        self.downloaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn empty(&self) {
        self.empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn saved(&self, bytes: usize) {
        self.saved.fetch_add(1, Ordering::Relaxed);
        self.bytes_saved.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn save_failed(&self) {
        self.save_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "save_failed", "Metric incremented");
    }

    pub fn failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "failed", "Metric incremented");
    }

    pub fn skipped(&self, count: usize) {
        self.skipped.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            downloaded: self.downloaded.load(Ordering::Relaxed),
            empty: self.empty.load(Ordering::Relaxed),
            saved: self.saved.load(Ordering::Relaxed),
            save_failed: self.save_failed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            bytes_saved: self.bytes_saved.load(Ordering::Relaxed),
            peak_inflight: self.peak_inflight.load(Ordering::SeqCst),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub attempts: u64,
    pub downloaded: u64,
    pub empty: u64,
    pub saved: u64,
    pub save_failed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub bytes_saved: u64,
    pub peak_inflight: usize,
}
