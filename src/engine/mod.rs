//! # Ghost node sync engine
//!
//! Keeps coincident endpoints of line features moving together while an
//! operator edits them.
//!
//! The engine owns the topology index, the modification tracker and the
//! reentrancy flag. Layers own the features; every operation that touches
//! them takes the `LayerSet` explicitly.
//!
//! # Event flow
//!
//! ```text
//! host event ──> handle_layer_event ──> index / propagate / finalize
//!                        ^                        │
//!                        └──── ignored (ghostly) ─┤ emit
//!                                                 v
//!                                      LayerSet::publish ──> listeners
//! ```
//!
//! Events the engine emits go through its own handler first, where the
//! raised reentrancy flag makes them no-ops, and are then published to the
//! layer's external listeners.

mod guard;
mod handlers;
mod tracker;

pub use tracker::{ModificationTracker, PendingModification};

use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;

use crate::config::GhostNodesConfig;
use crate::error::GhostResult;
use crate::index::TopologyIndex;
use crate::observability::{log_event, EngineMetrics, Event, Logger, MetricsSnapshot};
use crate::source::{
    FeatureId, LayerEvent, LayerId, LayerSet, MapEvent, RenderIntent, SplitControl, SplitEvent,
    SplitId,
};

/// The ghost node sync engine
#[derive(Debug)]
pub struct GhostNodes {
    config: GhostNodesConfig,
    edit_intent: RenderIntent,
    committed_intent: RenderIntent,
    /// Target layers in insertion order
    layers: Vec<LayerId>,
    /// Target layers currently switched on
    listening: BTreeSet<LayerId>,
    index: TopologyIndex,
    tracker: ModificationTracker,
    /// Feature whose endpoint the operator is dragging
    current_feature: Option<FeatureId>,
    ghostly: Rc<Cell<bool>>,
    split: Option<SplitControl>,
    active: bool,
    metrics: EngineMetrics,
    logger: Logger,
}

impl GhostNodes {
    /// Create an inactive engine without target layers
    pub fn new(config: GhostNodesConfig) -> GhostResult<Self> {
        Self::with_options(config, Vec::new(), None)
    }

    /// Create an inactive engine over `layers`, attaching `split` if its
    /// source is one of them.
    ///
    /// Layers are registered before the split so a split on a target layer
    /// is accepted.
    pub fn with_options(
        config: GhostNodesConfig,
        layers: Vec<LayerId>,
        split: Option<&SplitControl>,
    ) -> GhostResult<Self> {
        let logger = config.logger()?;
        let mut engine = Self {
            edit_intent: config.edit_intent(),
            committed_intent: config.committed_intent(),
            config,
            layers: Vec::new(),
            listening: BTreeSet::new(),
            index: TopologyIndex::new(),
            tracker: ModificationTracker::new(),
            current_feature: None,
            ghostly: Rc::new(Cell::new(false)),
            split: None,
            active: false,
            metrics: EngineMetrics::new(),
            logger,
        };
        for layer in layers {
            if !engine.layers.contains(&layer) {
                engine.layers.push(layer);
            }
        }
        if let Some(split) = split {
            engine.set_split(split);
        }
        Ok(engine)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start tracking the target layers.
    ///
    /// Indexes are rebuilt from scratch. Returns false if already active.
    pub fn activate(&mut self, layers: &mut LayerSet) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.index.clear();
        self.tracker.clear();
        self.listening.clear();
        for id in self.layers.clone() {
            self.layer_on(layers, id);
        }
        log_event(
            &self.logger,
            Event::EngineActivated,
            &[
                ("layers", self.layers.len().to_string().as_str()),
                ("features", self.index.len().to_string().as_str()),
                ("nodes", self.index.node_count().to_string().as_str()),
            ],
        );
        true
    }

    /// Stop tracking.
    ///
    /// A modification still in flight is committed and closed first.
    /// Returns false if not active.
    pub fn deactivate(&mut self, layers: &mut LayerSet) -> bool {
        if !self.active {
            return false;
        }
        if !self.tracker.is_empty() {
            self.each_modification(layers, Self::complete_modification);
            self.each_modification(layers, Self::stop_modification);
        }
        self.index.clear();
        self.tracker.clear();
        self.current_feature = None;
        self.listening.clear();
        self.active = false;
        log_event(&self.logger, Event::EngineDeactivated, &[]);
        true
    }

    /// Deactivate, detach the split collaborator and forget every target layer
    pub fn destroy(&mut self, layers: &mut LayerSet) {
        self.deactivate(layers);
        self.split = None;
        self.layers.clear();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    // ------------------------------------------------------------------
    // Target layers
    // ------------------------------------------------------------------

    /// Add a target layer, switching it on when active
    pub fn add_layer(&mut self, layers: &mut LayerSet, id: LayerId) {
        if self.layers.contains(&id) {
            return;
        }
        self.layers.push(id);
        if self.active {
            self.layer_on(layers, id);
        }
    }

    /// Remove a target layer, switching it off when active
    pub fn remove_layer(&mut self, layers: &mut LayerSet, id: LayerId) {
        let Some(pos) = self.layers.iter().position(|l| *l == id) else {
            return;
        };
        self.layers.remove(pos);
        if self.active {
            self.layer_off(layers, id);
        }
    }

    pub fn layers(&self) -> &[LayerId] {
        &self.layers
    }

    /// Whether the engine currently receives events of `id`
    pub fn is_listening(&self, id: LayerId) -> bool {
        self.listening.contains(&id)
    }

    /// Index a target layer's features and subscribe to it.
    ///
    /// Layers that are not on the map are skipped.
    fn layer_on(&mut self, layers: &LayerSet, id: LayerId) {
        let Some(layer) = layers.layer(id).filter(|l| l.is_on_map()) else {
            return;
        };
        let indexed = self.index.add_features(id, layer.features());
        self.metrics.add_features_indexed(indexed);
        self.listening.insert(id);
        self.logger.info(
            Event::LayerOn.as_str(),
            &[("layer", id.to_string().as_str()), ("indexed", indexed.to_string().as_str())],
        );
    }

    /// Unindex a target layer and unsubscribe from it.
    ///
    /// Ghost moves still tracked on the layer are committed and closed
    /// first, so nothing re-indexes its features afterwards.
    fn layer_off(&mut self, layers: &mut LayerSet, id: LayerId) {
        if self.tracker.tracks_layer(id) {
            self.each_modification(layers, |engine, layers, tracked, pending| {
                if pending.layer == id {
                    engine.complete_modification(layers, tracked, pending);
                    engine.stop_modification(layers, tracked, pending);
                }
            });
            self.tracker.remove_layer(id);
        }
        let removed = self.index.remove_layer(id);
        self.metrics.add_features_unindexed(removed);
        self.listening.remove(&id);
        if self.current_feature.is_some_and(|f| !self.index.contains(f)) {
            self.current_feature = None;
        }
        self.logger.info(
            Event::LayerOff.as_str(),
            &[("layer", id.to_string().as_str()), ("unindexed", removed.to_string().as_str())],
        );
    }

    // ------------------------------------------------------------------
    // Split collaborator
    // ------------------------------------------------------------------

    /// Attach a split collaborator.
    ///
    /// Any current one is detached first. The split is accepted only when
    /// its source layer is a target layer; otherwise the engine stays
    /// detached and false is returned.
    pub fn set_split(&mut self, split: &SplitControl) -> bool {
        self.split = None;
        match split.source() {
            Some(source) if self.layers.contains(&source) => {
                self.split = Some(split.clone());
                self.logger.info(
                    Event::SplitAttached.as_str(),
                    &[("split", split.id().to_string().as_str()), ("layer", source.to_string().as_str())],
                );
                true
            }
            source => {
                let source = source.map_or_else(|| "none".to_string(), |l| l.to_string());
                self.logger.warn(
                    Event::SplitRejected.as_str(),
                    &[("split", split.id().to_string().as_str()), ("layer", source.as_str())],
                );
                false
            }
        }
    }

    pub fn clear_split(&mut self) {
        self.split = None;
    }

    pub fn split(&self) -> Option<&SplitControl> {
        self.split.as_ref()
    }

    // ------------------------------------------------------------------
    // Event entry points
    // ------------------------------------------------------------------

    /// Handle an event fired on a layer's feature channel.
    ///
    /// Ignored unless the engine is listening to `layer`. Events arriving
    /// while the engine replays its own modifications are dropped.
    pub fn handle_layer_event(&mut self, layers: &mut LayerSet, layer: LayerId, event: &LayerEvent) {
        if !self.active || !self.listening.contains(&layer) {
            return;
        }
        if self.ghostly.get() {
            self.metrics.increment_self_events_ignored();
            return;
        }
        match event {
            LayerEvent::FeaturesAdded { features } => self.on_features_added(layers, layer, features),
            LayerEvent::FeaturesRemoved { features } => self.on_features_removed(features),
            LayerEvent::FeatureModified { feature } => {
                self.on_feature_modified(layers, layer, *feature)
            }
            LayerEvent::AfterFeatureModified { .. } => self.on_modification_session_ended(layers),
            LayerEvent::VertexModified { feature, vertex } => {
                self.on_vertex_moved(layers, layer, *feature, *vertex)
            }
        }
        self.verify_index();
    }

    /// Deliver a host event: publish it to the layer's listeners, then
    /// let the engine react.
    pub fn dispatch(&mut self, layers: &mut LayerSet, layer: LayerId, event: &LayerEvent) {
        layers.publish(layer, event);
        self.handle_layer_event(layers, layer, event);
    }

    /// Handle a layer being put on or taken off the map
    pub fn handle_map_event(&mut self, layers: &mut LayerSet, event: MapEvent) {
        if !self.active {
            return;
        }
        match event {
            MapEvent::AddLayer(id) if self.layers.contains(&id) => self.layer_on(layers, id),
            MapEvent::RemoveLayer(id) if self.layers.contains(&id) => self.layer_off(layers, id),
            _ => {}
        }
    }

    /// Handle an event from a split collaborator.
    ///
    /// Honoured only while active and only from the attached split.
    pub fn handle_split_event(&mut self, layers: &mut LayerSet, split: SplitId, event: &SplitEvent) {
        if !self.active || self.ghostly.get() {
            return;
        }
        let Some(source_layer) = self
            .split
            .as_ref()
            .filter(|s| s.id() == split)
            .and_then(SplitControl::source)
        else {
            return;
        };
        match event {
            SplitEvent::AfterSplit { source, features } => {
                self.on_after_split(layers, source_layer, *source, features)
            }
        }
        self.verify_index();
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &GhostNodesConfig {
        &self.config
    }

    pub fn index(&self) -> &TopologyIndex {
        &self.index
    }

    pub fn tracker(&self) -> &ModificationTracker {
        &self.tracker
    }

    pub fn current_feature(&self) -> Option<FeatureId> {
        self.current_feature
    }

    /// Whether the engine is replaying its own modifications
    pub fn is_ghostly(&self) -> bool {
        self.ghostly.get()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Check the index when `check_consistency` is on; a violation is fatal
    fn verify_index(&self) {
        if !self.config.check_consistency {
            return;
        }
        if let Err(e) = self.index.check_consistency() {
            log_event(&self.logger, Event::IndexInconsistent, &[("error", e.to_string().as_str())]);
            panic!("{}", e);
        }
    }
}
