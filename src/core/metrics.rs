//! Write counters shared by a logger tree
//!
//! Lets operators see whether destinations are failing without having to
//! check the result of every log call.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one logger hierarchy
///
/// # Example
///
/// ```
/// use layerlog::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_written();
/// metrics.record_failed();
///
/// assert_eq!(metrics.entries_written(), 1);
/// assert_eq!(metrics.failed_writes(), 1);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Calls delivered to every destination without error
    entries_written: AtomicU64,

    /// Calls where encoding or at least one destination failed
    failed_writes: AtomicU64,

    /// Panics caught by `Logger::recover_panic`
    panics_recovered: AtomicU64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            entries_written: AtomicU64::new(0),
            failed_writes: AtomicU64::new(0),
            panics_recovered: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn entries_written(&self) -> u64 {
        self.entries_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn panics_recovered(&self) -> u64 {
        self.panics_recovered.load(Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_written(&self) -> u64 {
        self.entries_written.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the previous value
    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed_writes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_panic_recovered(&self) -> u64 {
        self.panics_recovered.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of failed writes as a percentage (0.0 - 100.0)
    pub fn failure_rate(&self) -> f64 {
        let failed = self.failed_writes() as f64;
        let total = self.entries_written() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}
