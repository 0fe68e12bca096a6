//! Stats Module - GC Performance Monitoring
//!
//! Module ini mengumpulkan statistik performa GC untuk:
//! - Performance tuning
//! - Production monitoring
//! - Debugging & profiling
//!
//! Metrics:
//! - Pause time (min, max, avg, percentiles)
//! - Memory usage (used, committed, max)
//! - GC frequency
//! - Allocation rates

pub mod timer;
pub mod histogram;
pub mod metrics;
pub mod alerts;

pub use timer::GcTimer;
pub use histogram::Histogram;
pub use metrics::GcMetrics;
pub use alerts::{Alert, AlertKind, AlertManager, AlertSeverity, AlertSnapshot, AlertThresholds};

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// GcStats - statistics collector untuk GC
///
/// Central repository untuk semua GC metrics.
pub struct GcStats {
    /// Total GC cycles
    total_cycles: AtomicU64,
    /// Minor GC count
    minor_cycles: AtomicU64,
    /// Major GC count
    major_cycles: AtomicU64,
    /// Pause time statistics
    pause_stats: Arc<histogram::Histogram>,
    /// Memory usage
    memory_usage: AtomicUsize,
    /// Start time
    start_time: std::time::Instant,
    /// Mark-stack pushes dropped due to overflow, cumulative across cycles
    mark_stack_overflows: AtomicU64,
    /// SATB queue entries dropped due to overflow, cumulative across cycles
    satb_overflows: AtomicU64,
    /// References cleared in the last reference-processing pass
    soft_cleared: AtomicU64,
    weak_cleared: AtomicU64,
    phantom_cleared: AtomicU64,
    finalizers_scheduled: AtomicU64,
}

impl GcStats {
    /// Create new stats collector
    pub fn new() -> Self {
        Self {
            total_cycles: AtomicU64::new(0),
            minor_cycles: AtomicU64::new(0),
            major_cycles: AtomicU64::new(0),
            pause_stats: Arc::new(histogram::Histogram::new()),
            memory_usage: AtomicUsize::new(0),
            start_time: std::time::Instant::now(),
            mark_stack_overflows: AtomicU64::new(0),
            satb_overflows: AtomicU64::new(0),
            soft_cleared: AtomicU64::new(0),
            weak_cleared: AtomicU64::new(0),
            phantom_cleared: AtomicU64::new(0),
            finalizers_scheduled: AtomicU64::new(0),
        }
    }

    /// Add to the cumulative mark-stack overflow counter.
    pub fn record_mark_stack_overflow(&self, count: usize) {
        self.mark_stack_overflows
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Add to the cumulative SATB queue overflow counter.
    pub fn record_satb_overflow(&self, count: usize) {
        self.satb_overflows.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Record the outcome of one reference-processing pass.
    pub fn record_reference_processing(
        &self,
        counts: crate::reference_processor::ReferenceStageCounts,
    ) {
        self.soft_cleared
            .fetch_add(counts.soft_cleared as u64, Ordering::Relaxed);
        self.weak_cleared
            .fetch_add(counts.weak_cleared as u64, Ordering::Relaxed);
        self.phantom_cleared
            .fetch_add(counts.phantom_cleared as u64, Ordering::Relaxed);
        self.finalizers_scheduled
            .fetch_add(counts.finalizers_scheduled as u64, Ordering::Relaxed);
    }

    /// Get pause_stats reference
    pub fn pause_stats(&self) -> Arc<histogram::Histogram> {
        self.pause_stats.clone()
    }

    /// Clone Arc for returning from stats()
    ///
    /// This method requires `self` to be an `&Arc<Self>` so it can clone
    /// the Arc rather than creating new atomic counters. This ensures
    /// all clones share the same underlying statistics.
    pub fn clone_arc(self: &Arc<Self>) -> Arc<GcStats> {
        self.clone()
    }

    /// Record GC collection
    pub fn record_collection(
        &self,
        cycle: u64,
        generation: crate::gc::GcGeneration,
        duration: std::time::Duration,
    ) {
        self.total_cycles.fetch_add(1, Ordering::Relaxed);

        match generation {
            crate::gc::GcGeneration::Young => {
                self.minor_cycles.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                self.major_cycles.fetch_add(1, Ordering::Relaxed);
            }
        }

        // Record pause time
        self.pause_stats.record(duration.as_nanos() as u64);
    }

    /// Record memory usage
    pub fn record_memory_usage(&self, bytes: usize) {
        self.memory_usage.store(bytes, Ordering::Relaxed);
    }

    /// Get summary statistics
    pub fn summary(&self) -> GcSummary {
        GcSummary {
            total_cycles: self.total_cycles.load(Ordering::Relaxed),
            minor_cycles: self.minor_cycles.load(Ordering::Relaxed),
            major_cycles: self.major_cycles.load(Ordering::Relaxed),
            avg_pause_ms: self.pause_stats.mean() as f64 / 1_000_000.0,
            max_pause_ms: self.pause_stats.max() as f64 / 1_000_000.0,
            heap_used_mb: self.memory_usage.load(Ordering::Relaxed) as f64 / (1024.0 * 1024.0),
            uptime_secs: self.start_time.elapsed().as_secs(),
            mark_stack_overflows: self.mark_stack_overflows.load(Ordering::Relaxed),
            satb_overflows: self.satb_overflows.load(Ordering::Relaxed),
            soft_cleared: self.soft_cleared.load(Ordering::Relaxed),
            weak_cleared: self.weak_cleared.load(Ordering::Relaxed),
            phantom_cleared: self.phantom_cleared.load(Ordering::Relaxed),
            finalizers_scheduled: self.finalizers_scheduled.load(Ordering::Relaxed),
            throughput: self.throughput(),
        }
    }

    /// Fraction of wall-clock uptime NOT spent paused for GC, in `[0, 1]`.
    /// Fed into the alert pipeline's low-throughput check.
    pub fn throughput(&self) -> f64 {
        let uptime_ns = self.start_time.elapsed().as_nanos() as f64;
        if uptime_ns <= 0.0 {
            return 1.0;
        }
        let paused_ns = self.pause_stats.sum() as f64;
        (1.0 - paused_ns / uptime_ns).clamp(0.0, 1.0)
    }

    /// Get pause time histogram
    pub fn pause_histogram(&self) -> Arc<histogram::Histogram> {
        self.pause_stats.clone()
    }

    /// Reset statistics
    pub fn reset(&self) {
        self.total_cycles.store(0, Ordering::Relaxed);
        self.minor_cycles.store(0, Ordering::Relaxed);
        self.major_cycles.store(0, Ordering::Relaxed);
        self.pause_stats.clear();
        self.mark_stack_overflows.store(0, Ordering::Relaxed);
        self.satb_overflows.store(0, Ordering::Relaxed);
        self.soft_cleared.store(0, Ordering::Relaxed);
        self.weak_cleared.store(0, Ordering::Relaxed);
        self.phantom_cleared.store(0, Ordering::Relaxed);
        self.finalizers_scheduled.store(0, Ordering::Relaxed);
    }
}

impl Default for GcStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary statistics
#[derive(Debug, Default)]
pub struct GcSummary {
    /// Total GC cycles
    pub total_cycles: u64,
    /// Minor GC count
    pub minor_cycles: u64,
    /// Major GC count
    pub major_cycles: u64,
    /// Average pause time (ms)
    pub avg_pause_ms: f64,
    /// Max pause time (ms)
    pub max_pause_ms: f64,
    /// Heap used (MB)
    pub heap_used_mb: f64,
    /// Uptime (seconds)
    pub uptime_secs: u64,
    /// Cumulative mark-stack overflow count
    pub mark_stack_overflows: u64,
    /// Cumulative SATB queue overflow count
    pub satb_overflows: u64,
    /// Cumulative soft references cleared
    pub soft_cleared: u64,
    /// Cumulative weak references cleared
    pub weak_cleared: u64,
    /// Cumulative phantom references cleared
    pub phantom_cleared: u64,
    /// Cumulative finalizers scheduled
    pub finalizers_scheduled: u64,
    /// Fraction of uptime not spent paused for GC (0.0-1.0)
    pub throughput: f64,
}
