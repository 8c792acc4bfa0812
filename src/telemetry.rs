//! Telemetry module - Rate-gated snapshots of the loop state

use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub time: f64,
    /// Decimated process variable.
    pub measured: u16,
    pub set_point: f64,
    pub control_variable: f64,
    pub throttle: f64,
}

pub trait TelemetrySink {
    fn emit(&mut self, sample: &TelemetrySample);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Box<T> {
    fn emit(&mut self, sample: &TelemetrySample) {
        (**self).emit(sample)
    }
}

/// Fan a sample out to two sinks.
impl<A: TelemetrySink, B: TelemetrySink> TelemetrySink for (A, B) {
    fn emit(&mut self, sample: &TelemetrySample) {
        self.0.emit(sample);
        self.1.emit(sample);
    }
}

// ============================================================================
// TRACING TELEMETRY - One structured event per sample
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn emit(&mut self, sample: &TelemetrySample) {
        info!(
            target: "telemetry",
            t = sample.time,
            measured = sample.measured,
            set_point = sample.set_point,
            cv = sample.control_variable,
            throttle = sample.throttle,
            "({}, {})",
            sample.measured,
            sample.set_point
        );
    }
}

// ============================================================================
// TELEMETRY LOG - Bounded in-memory trace, shared by clones
// ============================================================================

#[derive(Clone)]
pub struct TelemetryLog {
    entries: Arc<RwLock<VecDeque<TelemetrySample>>>,
    max_size: usize,
}

impl TelemetryLog {
    pub fn new(max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(max_size.min(4096)))),
            max_size,
        }
    }

    pub fn read_all(&self) -> Vec<TelemetrySample> {
        self.entries.read().iter().copied().collect()
    }

    pub fn last(&self) -> Option<TelemetrySample> {
        self.entries.read().back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl TelemetrySink for TelemetryLog {
    fn emit(&mut self, sample: &TelemetrySample) {
        let mut log = self.entries.write();
        log.push_back(*sample);
        if log.len() > self.max_size {
            log.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64) -> TelemetrySample {
        TelemetrySample {
            time,
            measured: 200,
            set_point: 200.0,
            control_variable: 0.0,
            throttle: 0.0,
        }
    }

    #[test]
    fn log_drops_oldest_beyond_capacity() {
        let mut log = TelemetryLog::new(3);
        for t in 0..5 {
            log.emit(&sample(t as f64));
        }
        let times: Vec<f64> = log.read_all().iter().map(|s| s.time).collect();
        assert_eq!(times, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn pair_sink_feeds_both() {
        let a = TelemetryLog::new(8);
        let b = TelemetryLog::new(8);
        let mut pair = (a.clone(), b.clone());
        pair.emit(&sample(1.0));
        assert_eq!(a.len(), 1);
        assert_eq!(b.last(), Some(sample(1.0)));
    }
}
