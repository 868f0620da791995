//! # Layers
//!
//! A layer owns its features, forwards redraw requests to its renderer and
//! delivers channel events to its external listeners. `LayerSet` plays the
//! role of the map holding the layers.
//!
//! The mutating helpers (`add_features`, `move_vertex`, ...) stand in for
//! the editing tools that drive a layer: each applies its change and
//! returns the event the tool would fire. Delivering that event is up to
//! the caller.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GhostError, GhostResult};
use crate::geometry::Point;

use super::event::{LayerEvent, MapEvent};
use super::feature::{Feature, FeatureId, FeatureState};
use super::listener::FeatureListener;
use super::render::{RenderIntent, RenderRequester};

/// Identity of a layer within a `LayerSet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerId(pub u32);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer-{}", self.0)
    }
}

/// A vector layer
pub struct Layer {
    id: LayerId,
    name: String,
    on_map: bool,
    features: BTreeMap<FeatureId, Feature>,
    renderer: Option<Box<dyn RenderRequester>>,
    listeners: Vec<Box<dyn FeatureListener>>,
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("on_map", &self.on_map)
            .field("features", &self.features.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Layer {
    /// Create an empty layer that is not on any map
    pub fn new(id: LayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            on_map: false,
            features: BTreeMap::new(),
            renderer: None,
            listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the layer is currently attached to the map
    pub fn is_on_map(&self) -> bool {
        self.on_map
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> impl Iterator<Item = &Feature> {
        self.features.values()
    }

    pub fn feature_ids(&self) -> Vec<FeatureId> {
        self.features.keys().copied().collect()
    }

    pub fn feature(&self, id: FeatureId) -> Option<&Feature> {
        self.features.get(&id)
    }

    pub fn feature_mut(&mut self, id: FeatureId) -> Option<&mut Feature> {
        self.features.get_mut(&id)
    }

    /// Install the renderer that receives redraw requests
    pub fn set_renderer(&mut self, renderer: Box<dyn RenderRequester>) {
        self.renderer = Some(renderer);
    }

    /// Register an external listener on the feature channel
    pub fn subscribe(&mut self, listener: Box<dyn FeatureListener>) {
        self.listeners.push(listener);
    }

    /// Deliver an event to every external listener
    pub fn notify(&mut self, event: &LayerEvent) {
        let id = self.id;
        for listener in &mut self.listeners {
            listener.on_event(id, event);
        }
    }

    /// Ask the renderer to redraw a feature; unknown features are ignored
    pub fn draw_feature(&mut self, id: FeatureId, intent: &RenderIntent) {
        let layer = self.id;
        if let (Some(renderer), Some(feature)) = (self.renderer.as_mut(), self.features.get(&id)) {
            renderer.draw_feature(layer, feature, intent);
        }
    }

    /// Add features, returning `featuresadded`
    pub fn add_features(&mut self, features: Vec<Feature>) -> LayerEvent {
        let mut ids = Vec::with_capacity(features.len());
        for feature in features {
            ids.push(feature.id);
            self.features.insert(feature.id, feature);
        }
        LayerEvent::FeaturesAdded { features: ids }
    }

    /// Remove features, returning the removed ones and `featuresremoved`.
    ///
    /// Unknown ids are skipped.
    pub fn remove_features(&mut self, ids: &[FeatureId]) -> (Vec<Feature>, LayerEvent) {
        let removed: Vec<Feature> = ids.iter().filter_map(|id| self.features.remove(id)).collect();
        let event = LayerEvent::FeaturesRemoved {
            features: removed.iter().map(|f| f.id).collect(),
        };
        (removed, event)
    }

    /// Move one vertex of a feature's line in place, returning `vertexmodified`
    pub fn move_vertex(&mut self, id: FeatureId, vertex: usize, to: Point) -> GhostResult<LayerEvent> {
        let feature = self.features.get_mut(&id).ok_or(GhostError::FeatureNotFound(id))?;
        let line = feature.line_mut().ok_or(GhostError::NotALine(id))?;
        if !line.set_vertex(vertex, to) {
            return Err(GhostError::VertexOutOfRange { feature: id, vertex });
        }
        Ok(LayerEvent::VertexModified { feature: id, vertex })
    }

    /// Commit an operator edit, returning `featuremodified`.
    ///
    /// Inserted and deleted features keep their state.
    pub fn commit_feature(&mut self, id: FeatureId) -> GhostResult<LayerEvent> {
        let feature = self.features.get_mut(&id).ok_or(GhostError::FeatureNotFound(id))?;
        if !matches!(feature.state, FeatureState::Insert | FeatureState::Delete) {
            feature.state = FeatureState::Update;
        }
        Ok(LayerEvent::FeatureModified { feature: id })
    }

    /// Close an operator edit session, returning `afterfeaturemodified`
    pub fn end_modification(&self, id: FeatureId, modified: bool) -> GhostResult<LayerEvent> {
        if !self.features.contains_key(&id) {
            return Err(GhostError::FeatureNotFound(id));
        }
        Ok(LayerEvent::AfterFeatureModified { feature: id, modified })
    }

    /// Delete a feature the way an editing toolbar does.
    ///
    /// Never-persisted features (no `fid`) are destroyed outright and
    /// `featuresremoved` is returned. Persisted ones are marked `DELETE`
    /// and `afterfeaturemodified` is returned.
    pub fn delete_feature(&mut self, id: FeatureId) -> GhostResult<LayerEvent> {
        let feature = self.features.get_mut(&id).ok_or(GhostError::FeatureNotFound(id))?;
        if feature.fid.is_none() {
            let (_, event) = self.remove_features(&[id]);
            return Ok(event);
        }
        feature.state = FeatureState::Delete;
        Ok(LayerEvent::AfterFeatureModified { feature: id, modified: false })
    }
}

/// The map: an ordered set of layers
#[derive(Debug, Default)]
pub struct LayerSet {
    layers: BTreeMap<LayerId, Layer>,
    next_id: u32,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a layer that is not yet on the map
    pub fn create_layer(&mut self, name: impl Into<String>) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers.insert(id, Layer::new(id, name));
        id
    }

    /// Put a layer on the map, returning `addlayer`
    pub fn add_to_map(&mut self, id: LayerId) -> GhostResult<MapEvent> {
        let layer = self.layers.get_mut(&id).ok_or(GhostError::LayerNotFound(id))?;
        layer.on_map = true;
        Ok(MapEvent::AddLayer(id))
    }

    /// Take a layer off the map, returning `removelayer`.
    ///
    /// The layer and its features stay in the set.
    pub fn remove_from_map(&mut self, id: LayerId) -> GhostResult<MapEvent> {
        let layer = self.layers.get_mut(&id).ok_or(GhostError::LayerNotFound(id))?;
        layer.on_map = false;
        Ok(MapEvent::RemoveLayer(id))
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(&id)
    }

    /// Like `layer_mut` but failing on unknown ids
    pub fn require_mut(&mut self, id: LayerId) -> GhostResult<&mut Layer> {
        self.layers.get_mut(&id).ok_or(GhostError::LayerNotFound(id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<LayerId> {
        self.layers.values().find(|l| l.name == name).map(|l| l.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    /// Look up a feature together with its layer
    pub fn feature(&self, layer: LayerId, id: FeatureId) -> Option<&Feature> {
        self.layers.get(&layer).and_then(|l| l.feature(id))
    }

    /// Deliver an event to a layer's external listeners
    pub fn publish(&mut self, layer: LayerId, event: &LayerEvent) {
        if let Some(layer) = self.layers.get_mut(&layer) {
            layer.notify(event);
        }
    }
}
