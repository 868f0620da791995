//! Modification tracker
//!
//! Remembers, per feature moved by propagation, the geometry it had before
//! the edit session touched it.
//!
//! Per feature:
//! - absent: clean
//! - present, pending: endpoint overwritten, state not yet promoted
//! - present, committed: promoted and notified, waiting for session end

use std::collections::BTreeMap;

use crate::geometry::Geometry;
use crate::source::{Feature, FeatureId, LayerId};

/// Tracked pre-edit snapshot of one feature
#[derive(Debug, Clone, PartialEq)]
pub struct PendingModification {
    /// Layer owning the feature
    pub layer: LayerId,
    /// Geometry before the first uncommitted move
    pub original: Geometry,
    committed: bool,
}

impl PendingModification {
    /// Whether the move has been committed this session
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

/// Snapshots of features with moves awaiting finalization
#[derive(Debug, Default)]
pub struct ModificationTracker {
    entries: BTreeMap<FeatureId, PendingModification>,
}

impl ModificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `feature` before its first move this session.
    ///
    /// An earlier `modified.geometry` wins over the current geometry so the
    /// oldest pre-edit state survives across sessions. A feature already
    /// tracked keeps its snapshot and becomes pending again. Returns true
    /// when a new snapshot was taken.
    pub fn capture_original(&mut self, layer: LayerId, feature: &Feature) -> bool {
        if let Some(entry) = self.entries.get_mut(&feature.id) {
            entry.committed = false;
            return false;
        }
        let Some(original) = feature
            .original_geometry()
            .or(feature.geometry.as_ref())
            .cloned()
        else {
            return false;
        };
        self.entries.insert(
            feature.id,
            PendingModification {
                layer,
                original,
                committed: false,
            },
        );
        true
    }

    /// Record that the feature's move was committed
    pub fn mark_committed(&mut self, id: FeatureId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.committed = true;
        }
    }

    pub fn get(&self, id: FeatureId) -> Option<&PendingModification> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries not yet committed
    pub fn pending_count(&self) -> usize {
        self.entries.values().filter(|e| !e.committed).count()
    }

    /// Owned copy of every entry in id order
    pub fn snapshot(&self) -> Vec<(FeatureId, PendingModification)> {
        self.entries.iter().map(|(id, e)| (*id, e.clone())).collect()
    }

    /// Whether any tracked feature belongs to `layer`
    pub fn tracks_layer(&self, layer: LayerId) -> bool {
        self.entries.values().any(|e| e.layer == layer)
    }

    /// Forget every entry of `layer`. Returns the number dropped.
    pub fn remove_layer(&mut self, layer: LayerId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.layer != layer);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
