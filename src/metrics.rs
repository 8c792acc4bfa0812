//! Metrics module - Tick timing and jitter statistics

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn histogram() -> Histogram<u64> {
    Histogram::new(3).expect("three significant figures is a supported precision")
}

// ============================================================================
// LOOP METRICS - Shared by clones, read by the binary at shutdown
// ============================================================================

#[derive(Clone)]
pub struct LoopMetrics {
    tick_hist: Arc<Mutex<Histogram<u64>>>,
    // Variation between consecutive tick intervals
    jitter_hist: Arc<Mutex<Histogram<u64>>>,
    last_interval_ns: Arc<AtomicU64>,
    ticks: Arc<AtomicU64>,
}

impl Default for LoopMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopMetrics {
    pub fn new() -> Self {
        Self {
            tick_hist: Arc::new(Mutex::new(histogram())),
            jitter_hist: Arc::new(Mutex::new(histogram())),
            last_interval_ns: Arc::new(AtomicU64::new(0)),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Time spent inside one tick, excluding the inter-tick delay.
    pub fn record_tick(&self, duration: Duration) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.tick_hist.lock().record(duration.as_nanos() as u64).ok();
    }

    /// Record the clock time between two tick starts.
    pub fn record_interval(&self, interval_secs: f64) {
        if !(interval_secs.is_finite() && interval_secs >= 0.0) {
            return;
        }
        let interval_ns = (interval_secs * 1e9) as u64;
        let last = self.last_interval_ns.swap(interval_ns, Ordering::Relaxed);
        if last > 0 {
            self.jitter_hist.lock().record(interval_ns.abs_diff(last)).ok();
        }
    }

    pub fn report(&self) -> MetricsReport {
        let tick = self.tick_hist.lock();
        let jitter = self.jitter_hist.lock();

        MetricsReport {
            ticks: self.ticks.load(Ordering::Relaxed),
            tick_p50: Duration::from_nanos(tick.value_at_quantile(0.5)),
            tick_p99: Duration::from_nanos(tick.value_at_quantile(0.99)),
            tick_max: Duration::from_nanos(tick.max()),
            jitter_p50: Duration::from_nanos(jitter.value_at_quantile(0.5)),
            jitter_p99: Duration::from_nanos(jitter.value_at_quantile(0.99)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsReport {
    pub ticks: u64,
    pub tick_p50: Duration,
    pub tick_p99: Duration,
    pub tick_max: Duration,
    pub jitter_p50: Duration,
    pub jitter_p99: Duration,
}
