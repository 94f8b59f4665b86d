use serde::Serialize;
use std::sync::Mutex;

/// Counters for the beam pipeline, safe to share with a reporting thread.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub pulses: usize,
    pub beams: usize,
    /// Triggers whose assembly was rejected.
    pub rejected: usize,
    pub sequence_gaps: usize,
    pub forced_triggers: usize,
    pub scan_transitions: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn update<F: FnOnce(&mut MetricsSnapshot)>(&self, apply: F) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }

    pub fn record_pulse(&self) {
        self.update(|m| m.pulses += 1);
    }

    pub fn record_beam(&self) {
        self.update(|m| m.beams += 1);
    }

    pub fn record_rejected(&self) {
        self.update(|m| m.rejected += 1);
    }

    pub fn record_sequence_gap(&self) {
        self.update(|m| m.sequence_gaps += 1);
    }

    pub fn record_forced_trigger(&self) {
        self.update(|m| m.forced_triggers += 1);
    }

    pub fn record_scan_transition(&self) {
        self.update(|m| m.scan_transitions += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
