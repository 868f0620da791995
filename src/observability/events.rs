//! Observable engine events
//!
//! Every line the sync engine logs is named by one of these.

use std::fmt;

/// Observable events of the sync engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Lifecycle
    /// Engine activated and indexes rebuilt
    EngineActivated,
    /// Engine deactivated and indexes cleared
    EngineDeactivated,
    /// A target layer was indexed and subscribed
    LayerOn,
    /// A target layer was unindexed and unsubscribed
    LayerOff,

    // Index
    /// Features entered the index
    FeaturesIndexed,
    /// Features left the index
    FeaturesUnindexed,
    /// Index consistency check failed (FATAL)
    IndexInconsistent,

    // Propagation
    /// A shared endpoint move was applied to sibling features
    GhostPropagated,
    /// Pending sibling moves were committed
    ModificationCommitted,
    /// An edit session ended and its notifications were sent
    ModificationSessionEnded,

    // Split
    /// A split collaborator was attached
    SplitAttached,
    /// A split collaborator was rejected
    SplitRejected,
    /// The index was reconciled after a split
    SplitReconciled,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::EngineActivated => "ENGINE_ACTIVATED",
            Event::EngineDeactivated => "ENGINE_DEACTIVATED",
            Event::LayerOn => "LAYER_ON",
            Event::LayerOff => "LAYER_OFF",

            Event::FeaturesIndexed => "FEATURES_INDEXED",
            Event::FeaturesUnindexed => "FEATURES_UNINDEXED",
            Event::IndexInconsistent => "INDEX_INCONSISTENT",

            Event::GhostPropagated => "GHOST_PROPAGATED",
            Event::ModificationCommitted => "MODIFICATION_COMMITTED",
            Event::ModificationSessionEnded => "MODIFICATION_SESSION_ENDED",

            Event::SplitAttached => "SPLIT_ATTACHED",
            Event::SplitRejected => "SPLIT_REJECTED",
            Event::SplitReconciled => "SPLIT_RECONCILED",
        }
    }

    /// Returns true if this event indicates a broken invariant
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::IndexInconsistent)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
