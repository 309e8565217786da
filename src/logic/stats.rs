//! Pipeline counters
//!
//! Lock-free counters bumped from every task; `snapshot()` gives a
//! serialisable view for logs and embedders.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default)]
pub struct PipelineStats {
    connections_accepted: AtomicU64,
    connections_active: AtomicU64,
    frames_received: AtomicU64,
    decode_errors: AtomicU64,
    samples_pushed: AtomicU64,
    samples_scored: AtomicU64,
    score_failures: AtomicU64,
    anomalies: AtomicU64,
    notifications_sent: AtomicU64,
    notifications_failed: AtomicU64,
    notifications_dropped: AtomicU64,
    /// Cumulative scoring latency
    latency_sum_us: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub connections_accepted: u64,
    pub connections_active: u64,
    pub frames_received: u64,
    pub decode_errors: u64,
    pub samples_pushed: u64,
    pub samples_scored: u64,
    pub score_failures: u64,
    pub anomalies: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
    pub notifications_dropped: u64,
    pub avg_score_latency_ms: f32,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sample_pushed(&self) {
        self.samples_pushed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sample_scored(&self, latency: Duration) {
        self.samples_scored.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn score_failure(&self) {
        self.score_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn anomaly(&self) {
        self.anomalies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_failed(&self) {
        self.notifications_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_dropped(&self) {
        self.notifications_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let scored = self.samples_scored.load(Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.load(Ordering::Relaxed);
        let avg = if scored > 0 {
            (latency_sum as f32 / scored as f32) / 1000.0
        } else {
            0.0
        };

        StatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            samples_pushed: self.samples_pushed.load(Ordering::Relaxed),
            samples_scored: scored,
            score_failures: self.score_failures.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notifications_failed: self.notifications_failed.load(Ordering::Relaxed),
            notifications_dropped: self.notifications_dropped.load(Ordering::Relaxed),
            avg_score_latency_ms: avg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_averages_latency() {
        let stats = PipelineStats::new();
        stats.sample_scored(Duration::from_millis(2));
        stats.sample_scored(Duration::from_millis(4));
        stats.connection_opened();
        stats.connection_opened();
        stats.connection_closed();

        let snap = stats.snapshot();
        assert_eq!(snap.samples_scored, 2);
        assert!((snap.avg_score_latency_ms - 3.0).abs() < 1e-3);
        assert_eq!(snap.connections_accepted, 2);
        assert_eq!(snap.connections_active, 1);
    }
}
