//! Statistics for the fan-out server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Server-wide counters, updated lock-free from any task
#[derive(Debug)]
pub struct FanoutStats {
    started_at: Instant,
    total_connections: AtomicU64,
    evictions: AtomicU64,
    messages_published: AtomicU64,
    frames_delivered: AtomicU64,
    write_failures: AtomicU64,
}

impl FanoutStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_connections: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            messages_published: AtomicU64::new(0),
            frames_delivered: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    /// Count an accepted viewer
    pub fn record_connection(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a viewer evicted at capacity
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one publish pass and its outcome
    pub fn record_publish(&self, delivered: u64, failed: u64) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
        self.frames_delivered.fetch_add(delivered, Ordering::Relaxed);
        self.write_failures.fetch_add(failed, Ordering::Relaxed);
    }

    /// Time since the tracker was created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self, active_connections: usize) -> StatsSnapshot {
        StatsSnapshot {
            active_connections: active_connections as u64,
            total_connections: self.total_connections.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            messages_published: self.messages_published.load(Ordering::Relaxed),
            frames_delivered: self.frames_delivered.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            uptime_secs: self.uptime().as_secs(),
        }
    }
}

impl Default for FanoutStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Plain copy of `FanoutStats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Currently registered viewers
    pub active_connections: u64,
    /// Viewers accepted since start
    pub total_connections: u64,
    /// Viewers evicted to make room
    pub evictions: u64,
    /// Publish passes
    pub messages_published: u64,
    /// Frames written successfully, summed over all viewers
    pub frames_delivered: u64,
    /// Writes that failed and dropped a viewer
    pub write_failures: u64,
    /// Seconds since the server started
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_stats_are_zero() {
        let stats = FanoutStats::new();
        let snapshot = stats.snapshot(0);

        assert_eq!(snapshot.total_connections, 0);
        assert_eq!(snapshot.evictions, 0);
        assert_eq!(snapshot.messages_published, 0);
        assert_eq!(snapshot.frames_delivered, 0);
        assert_eq!(snapshot.write_failures, 0);
    }

    #[test]
    fn test_record_publish() {
        let stats = FanoutStats::new();
        stats.record_publish(3, 1);
        stats.record_publish(2, 0);

        let snapshot = stats.snapshot(2);
        assert_eq!(snapshot.active_connections, 2);
        assert_eq!(snapshot.messages_published, 2);
        assert_eq!(snapshot.frames_delivered, 5);
        assert_eq!(snapshot.write_failures, 1);
    }

    #[test]
    fn test_connections_and_evictions() {
        let stats = FanoutStats::new();
        for _ in 0..6 {
            stats.record_connection();
        }
        stats.record_eviction();

        let snapshot = stats.snapshot(5);
        assert_eq!(snapshot.total_connections, 6);
        assert_eq!(snapshot.evictions, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(FanoutStats::new().snapshot(1)).unwrap();
        assert_eq!(json["active_connections"], 1);
        assert!(json.get("uptime_secs").is_some());
    }
}
