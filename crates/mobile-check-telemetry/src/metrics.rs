//! Request counters for the HTTP service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

/// Counters for the checklist endpoints.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    /// Payloads accepted on the upload routes.
    pub uploads: AtomicU64,
    /// Checklist pages rendered.
    pub views: AtomicU64,
    /// Payloads returned as JSON.
    pub fetches: AtomicU64,
    /// Lookups for identifiers with no payload.
    pub not_found: AtomicU64,
    /// Requests that ended in a server error.
    pub errors: AtomicU64,
}

impl RequestMetrics {
    /// Creates a zeroed set of counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a stored payload.
    pub fn record_upload(&self) {
        self.uploads.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a rendered checklist page.
    pub fn record_view(&self) {
        self.views.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a payload returned as JSON.
    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a lookup miss.
    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a server error.
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of all counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uploads: self.uploads.load(Ordering::Relaxed),
            views: self.views.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`RequestMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Payloads accepted.
    pub uploads: u64,
    /// Pages rendered.
    pub views: u64,
    /// JSON retrievals.
    pub fetches: u64,
    /// Lookup misses.
    pub not_found: u64,
    /// Server errors.
    pub errors: u64,
}

/// Timer for measuring request handling duration.
pub struct Timer {
    start: Instant,
    label: &'static str,
}

impl Timer {
    /// Starts a new timer.
    #[must_use]
    pub fn start(label: &'static str) -> Self {
        Self {
            start: Instant::now(),
            label,
        }
    }

    /// Returns the elapsed duration.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops the timer and logs the duration.
    pub fn stop(self) {
        let elapsed = self.elapsed_ms();
        tracing::debug!(label = self.label, elapsed_ms = elapsed, "Timer stopped");
    }
}
