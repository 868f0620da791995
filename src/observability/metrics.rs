//! Engine counters
//!
//! - Counters only, monotonic
//! - Reset only when the engine is created

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one sync engine
#[derive(Debug, Default)]
pub struct EngineMetrics {
    /// Features entered into the index
    features_indexed: AtomicU64,
    /// Features removed from the index
    features_unindexed: AtomicU64,
    /// Sibling endpoints moved by propagation
    vertices_propagated: AtomicU64,
    /// Sibling modifications committed
    modifications_committed: AtomicU64,
    /// Events the engine emitted on layer channels
    notifications_emitted: AtomicU64,
    /// Events ignored because the engine generated them
    self_events_ignored: AtomicU64,
    /// Split results reconciled
    splits_reconciled: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub features_indexed: u64,
    pub features_unindexed: u64,
    pub vertices_propagated: u64,
    pub modifications_committed: u64,
    pub notifications_emitted: u64,
    pub self_events_ignored: u64,
    pub splits_reconciled: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_features_indexed(&self, n: usize) {
        self.features_indexed.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn add_features_unindexed(&self, n: usize) {
        self.features_unindexed.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn increment_vertices_propagated(&self) {
        self.vertices_propagated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_modifications_committed(&self) {
        self.modifications_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_notifications_emitted(&self) {
        self.notifications_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_self_events_ignored(&self) {
        self.self_events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_splits_reconciled(&self) {
        self.splits_reconciled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            features_indexed: self.features_indexed.load(Ordering::Relaxed),
            features_unindexed: self.features_unindexed.load(Ordering::Relaxed),
            vertices_propagated: self.vertices_propagated.load(Ordering::Relaxed),
            modifications_committed: self.modifications_committed.load(Ordering::Relaxed),
            notifications_emitted: self.notifications_emitted.load(Ordering::Relaxed),
            self_events_ignored: self.self_events_ignored.load(Ordering::Relaxed),
            splits_reconciled: self.splits_reconciled.load(Ordering::Relaxed),
        }
    }
}
