//! Event handlers, vertex propagation and the modification passes

use crate::geometry::Point;
use crate::index::{EndpointType, NodeKey};
use crate::observability::Event;
use crate::source::{Feature, FeatureId, FeatureState, LayerEvent, LayerId, LayerSet, Modified};

use super::guard::ReentrancyGuard;
use super::tracker::PendingModification;
use super::GhostNodes;

impl GhostNodes {
    pub(super) fn on_features_added(&mut self, layers: &LayerSet, layer: LayerId, ids: &[FeatureId]) {
        let Some(source) = layers.layer(layer) else {
            return;
        };
        let indexed = self
            .index
            .add_features(layer, ids.iter().filter_map(|id| source.feature(*id)));
        self.metrics.add_features_indexed(indexed);
        self.logger.trace(
            Event::FeaturesIndexed.as_str(),
            &[("layer", layer.to_string().as_str()), ("count", indexed.to_string().as_str())],
        );
    }

    pub(super) fn on_features_removed(&mut self, ids: &[FeatureId]) {
        let removed = self.index.remove_features(ids.iter().copied());
        self.metrics.add_features_unindexed(removed);
        self.logger.trace(
            Event::FeaturesUnindexed.as_str(),
            &[("count", removed.to_string().as_str())],
        );
    }

    /// The operator committed `id`.
    ///
    /// Pending ghost moves of other features are committed first; the
    /// feature itself is then re-indexed under its new endpoints.
    pub(super) fn on_feature_modified(&mut self, layers: &mut LayerSet, layer: LayerId, id: FeatureId) {
        self.each_modification(layers, |engine, layers, tracked, pending| {
            if tracked == id {
                engine.adopt_operator_commit(layers, tracked, pending);
            } else {
                engine.complete_modification(layers, tracked, pending);
            }
        });
        self.reindex(layers, layer, id);
    }

    /// Close the edit session: commit whatever is still pending, notify
    /// every tracked feature and forget them.
    pub(super) fn on_modification_session_ended(&mut self, layers: &mut LayerSet) {
        if self.tracker.pending_count() > 0 {
            self.each_modification(layers, Self::complete_modification);
        }
        let closed = self.tracker.len();
        self.each_modification(layers, Self::stop_modification);
        self.tracker.clear();
        self.current_feature = None;
        if closed > 0 {
            self.logger.info(
                Event::ModificationSessionEnded.as_str(),
                &[("features", closed.to_string().as_str())],
            );
        }
    }

    /// Propagate a moved endpoint of `id` to every feature sharing its node.
    ///
    /// Interior vertices and unindexed features are ignored.
    pub(super) fn on_vertex_moved(
        &mut self,
        layers: &mut LayerSet,
        layer: LayerId,
        id: FeatureId,
        vertex: usize,
    ) {
        let Some(feature) = layers.feature(layer, id) else {
            return;
        };
        let Some(line) = self.index.indexable_line(feature) else {
            return;
        };
        let (Some(endpoint), Some(to)) = (EndpointType::of_vertex(vertex, line.len()), line.vertex(vertex))
        else {
            return;
        };
        // The node is looked up under the key indexed before the move
        let Some(node) = self.index.neighbors_at(id, endpoint) else {
            return;
        };
        let siblings: Vec<(EndpointType, FeatureId)> =
            node.iter().filter(|(_, sibling)| *sibling != id).collect();

        if self.current_feature.is_some_and(|current| current != id) {
            self.each_modification(layers, Self::complete_modification);
        }
        self.current_feature = Some(id);

        for (sibling_endpoint, sibling) in &siblings {
            self.modify_vertex(layers, *sibling, *sibling_endpoint, to);
        }
        if !siblings.is_empty() {
            self.logger.info(
                Event::GhostPropagated.as_str(),
                &[
                    ("feature", id.to_string().as_str()),
                    ("endpoint", endpoint.as_str()),
                    ("node", NodeKey::from_point(to).to_string().as_str()),
                    ("siblings", siblings.len().to_string().as_str()),
                ],
            );
        }
    }

    /// Move `endpoint` of a sibling feature to `to` without committing it
    fn modify_vertex(&mut self, layers: &mut LayerSet, id: FeatureId, endpoint: EndpointType, to: Point) {
        let Some(layer) = self.index.entry(id).map(|entry| entry.layer) else {
            return;
        };
        let Some(feature) = layers.feature(layer, id) else {
            return;
        };
        if self.index.indexable_line(feature).is_none() {
            return;
        }
        self.tracker.capture_original(layer, feature);

        let Some(source) = layers.layer_mut(layer) else {
            return;
        };
        let Some(line) = source.feature_mut(id).and_then(Feature::line_mut) else {
            return;
        };
        let at = endpoint.vertex_index(line.len());
        line.set_vertex(at, to);
        source.draw_feature(id, &self.edit_intent);
        self.metrics.increment_vertices_propagated();
    }

    /// Reconcile the index with a split of `source` into `pieces`
    pub(super) fn on_after_split(
        &mut self,
        layers: &LayerSet,
        layer: LayerId,
        source: FeatureId,
        pieces: &[FeatureId],
    ) {
        let removed = self.index.remove_features([source]);
        let indexed = match layers.layer(layer) {
            Some(owner) => self
                .index
                .add_features(layer, pieces.iter().filter_map(|id| owner.feature(*id))),
            None => 0,
        };
        self.metrics.add_features_unindexed(removed);
        self.metrics.add_features_indexed(indexed);
        self.metrics.increment_splits_reconciled();
        self.logger.info(
            Event::SplitReconciled.as_str(),
            &[
                ("source", source.to_string().as_str()),
                ("pieces", indexed.to_string().as_str()),
            ],
        );
    }

    // ------------------------------------------------------------------
    // Modification passes
    // ------------------------------------------------------------------

    /// Run `f` over every tracked feature with the reentrancy flag raised.
    ///
    /// This is the only place the flag is raised. Entries are copied first
    /// so `f` may mutate the tracker.
    pub(super) fn each_modification<F>(&mut self, layers: &mut LayerSet, mut f: F)
    where
        F: FnMut(&mut Self, &mut LayerSet, FeatureId, &PendingModification),
    {
        let _guard = ReentrancyGuard::enter(&self.ghostly);
        for (id, pending) in self.tracker.snapshot() {
            f(self, layers, id, &pending);
        }
    }

    /// Commit a pending ghost move: record the original geometry, promote
    /// the state, redraw in the committed style, re-index and notify.
    pub(super) fn complete_modification(
        &mut self,
        layers: &mut LayerSet,
        id: FeatureId,
        pending: &PendingModification,
    ) {
        if pending.is_committed() {
            return;
        }
        let layer = pending.layer;
        let Some(owner) = layers.layer_mut(layer) else {
            return;
        };
        let Some(feature) = owner.feature_mut(id) else {
            return;
        };
        feature.modified.get_or_insert_with(Modified::default).geometry = Some(pending.original.clone());
        if !matches!(feature.state, FeatureState::Insert | FeatureState::Delete) {
            feature.state = FeatureState::Update;
        }
        let state = feature.state;
        owner.draw_feature(id, &self.committed_intent);

        self.reindex(layers, layer, id);
        self.tracker.mark_committed(id);
        self.metrics.increment_modifications_committed();
        self.logger.info(
            Event::ModificationCommitted.as_str(),
            &[("feature", id.to_string().as_str()), ("state", state.as_str())],
        );
        self.emit(layers, layer, LayerEvent::FeatureModified { feature: id });
    }

    /// Announce the end of a tracked feature's edit session
    pub(super) fn stop_modification(
        &mut self,
        layers: &mut LayerSet,
        id: FeatureId,
        pending: &PendingModification,
    ) {
        if layers.feature(pending.layer, id).is_none() {
            return;
        }
        self.emit(
            layers,
            pending.layer,
            LayerEvent::AfterFeatureModified {
                feature: id,
                modified: true,
            },
        );
    }

    /// The operator committed a feature the engine had moved: keep the
    /// original snapshot but do not notify a second time.
    fn adopt_operator_commit(&mut self, layers: &mut LayerSet, id: FeatureId, pending: &PendingModification) {
        if let Some(feature) = layers.layer_mut(pending.layer).and_then(|l| l.feature_mut(id)) {
            feature.modified.get_or_insert_with(Modified::default).geometry =
                Some(pending.original.clone());
        }
        self.tracker.mark_committed(id);
    }

    /// Remove and re-add a feature so its index entry follows its geometry
    ///
    /// Features of layers the engine is not listening to stay unindexed.
    fn reindex(&mut self, layers: &LayerSet, layer: LayerId, id: FeatureId) {
        self.index.remove_features([id]);
        if !self.listening.contains(&layer) {
            return;
        }
        if let Some(feature) = layers.feature(layer, id) {
            self.index.add_features(layer, [feature]);
        }
    }

    /// Send an engine-generated event through the engine's own handler,
    /// where it is dropped, then to the layer's listeners.
    fn emit(&mut self, layers: &mut LayerSet, layer: LayerId, event: LayerEvent) {
        self.metrics.increment_notifications_emitted();
        self.handle_layer_event(layers, layer, &event);
        layers.publish(layer, &event);
    }
}
