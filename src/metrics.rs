use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing relay activity since process start
#[derive(Debug, Default)]
pub struct RelayMetrics {
    // Connection metrics
    pub total_connections: AtomicU64,
    pub active_connections: AtomicU64,
    pub disconnections: AtomicU64,

    // Registry metrics
    pub registrations: AtomicU64,
    pub name_updates: AtomicU64,

    // Routing metrics
    pub signals_forwarded: AtomicU64,
    pub signals_dropped: AtomicU64,
    pub forward_failures: AtomicU64,

    // Broadcast metrics
    pub broadcasts: AtomicU64,
    pub broadcast_send_failures: AtomicU64,

    // Inbound frame errors
    pub decode_errors: AtomicU64,
    pub oversized_frames: AtomicU64,
    pub panics_contained: AtomicU64,
}

/// Point-in-time copy of [`RelayMetrics`] suitable for serialization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub total_connections: u64,
    pub active_connections: u64,
    pub disconnections: u64,
    pub registrations: u64,
    pub name_updates: u64,
    pub signals_forwarded: u64,
    pub signals_dropped: u64,
    pub forward_failures: u64,
    pub broadcasts: u64,
    pub broadcast_send_failures: u64,
    pub decode_errors: u64,
    pub oversized_frames: u64,
    pub panics_contained: u64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.disconnections.fetch_add(1, Ordering::Relaxed);
        // Saturate instead of wrapping if a close is ever double counted.
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(1))
            });
    }

    pub fn increment_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_name_updates(&self) {
        self.name_updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signals_forwarded(&self) {
        self.signals_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signals_dropped(&self) {
        self.signals_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_forward_failures(&self) {
        self.forward_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_broadcasts(&self) {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_broadcast_send_failures(&self, count: u64) {
        self.broadcast_send_failures
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_decode_errors(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_oversized_frames(&self) {
        self.oversized_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_panics_contained(&self) {
        self.panics_contained.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_connections: self.total_connections.load(Ordering::Relaxed),
            active_connections: self.active_connections.load(Ordering::Relaxed),
            disconnections: self.disconnections.load(Ordering::Relaxed),
            registrations: self.registrations.load(Ordering::Relaxed),
            name_updates: self.name_updates.load(Ordering::Relaxed),
            signals_forwarded: self.signals_forwarded.load(Ordering::Relaxed),
            signals_dropped: self.signals_dropped.load(Ordering::Relaxed),
            forward_failures: self.forward_failures.load(Ordering::Relaxed),
            broadcasts: self.broadcasts.load(Ordering::Relaxed),
            broadcast_send_failures: self.broadcast_send_failures.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            oversized_frames: self.oversized_frames.load(Ordering::Relaxed),
            panics_contained: self.panics_contained.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_counters_track_open_and_close() {
        let metrics = RelayMetrics::new();
        metrics.connection_opened();
        metrics.connection_opened();
        metrics.connection_closed();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_connections, 2);
        assert_eq!(snapshot.active_connections, 1);
        assert_eq!(snapshot.disconnections, 1);
    }

    #[test]
    fn active_connections_never_underflow() {
        let metrics = RelayMetrics::new();
        metrics.connection_closed();
        assert_eq!(metrics.snapshot().active_connections, 0);
    }
}
