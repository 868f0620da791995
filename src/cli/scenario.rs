//! Scripted edit scenarios
//!
//! A scenario describes layers with their features, an optional split
//! tool and a list of operator actions. Features are referred to by a
//! scenario-local `key`.
//!
//! ```json
//! {
//!   "layers": [
//!     {"name": "roads", "features": [
//!       {"key": "L1", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
//!       {"key": "L2", "geometry": {"type": "LineString", "coordinates": [[1, 1], [2, 2]]}}
//!     ]}
//!   ],
//!   "operations": [
//!     {"op": "move_vertex", "feature": "L1", "vertex": 1, "to": [1, 2]},
//!     {"op": "modify", "feature": "L1"},
//!     {"op": "end_session", "feature": "L1"}
//!   ]
//! }
//! ```
//!
//! `Replay` plays the operations the way an editing toolbar would: each
//! action mutates a layer and the resulting event is dispatched to the
//! layer's listeners and to the engine.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GhostNodesConfig;
use crate::engine::GhostNodes;
use crate::error::{GhostError, GhostResult};
use crate::geometry::{Geometry, Point};
use crate::observability::MetricsSnapshot;
use crate::source::{
    DrawRecorder, EventRecorder, Feature, FeatureId, FeatureState, LayerEvent, LayerId, LayerSet,
    SplitControl,
};

/// A scripted edit session
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub layers: Vec<LayerSpec>,
    /// Split tool bound to the named layer
    #[serde(default)]
    pub split: Option<SplitSpec>,
    #[serde(default)]
    pub operations: Vec<Operation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerSpec {
    pub name: String,
    /// Whether the layer starts on the map (default: true)
    #[serde(default = "default_true")]
    pub on_map: bool,
    /// Whether the engine manages this layer (default: true)
    #[serde(default = "default_true")]
    pub target: bool,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureSpec {
    pub key: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub state: FeatureState,
    #[serde(default)]
    pub fid: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitSpec {
    pub layer: String,
}

/// One piece produced by a split
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PieceSpec {
    pub key: String,
    pub geometry: Geometry,
}

/// Operator action
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Drag one vertex of a feature's line
    MoveVertex {
        feature: String,
        vertex: usize,
        to: Point,
    },
    /// Commit the operator's edit of a feature
    Modify { feature: String },
    /// Close the operator's edit session
    EndSession {
        feature: String,
        #[serde(default = "default_true")]
        modified: bool,
    },
    /// Add new features to a layer
    Add {
        layer: String,
        features: Vec<FeatureSpec>,
    },
    /// Remove features from their layers
    Remove { features: Vec<String> },
    /// Split a feature with the scenario's split tool
    Split {
        feature: String,
        pieces: Vec<PieceSpec>,
    },
    /// Delete a feature through the editing toolbar
    Delete { feature: String },
}

fn default_true() -> bool {
    true
}

impl Scenario {
    pub fn load(path: &Path) -> GhostResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> GhostResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Final state of one feature
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub key: String,
    pub layer: String,
    pub state: FeatureState,
    pub geometry: Option<Geometry>,
    /// Geometry before the edit session, when recorded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<Geometry>,
}

/// One event delivered to a layer's listeners
#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub layer: String,
    pub event: &'static str,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<bool>,
}

/// One redraw request
#[derive(Debug, Clone, Serialize)]
pub struct DrawReport {
    pub feature: String,
    pub intent: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IndexReport {
    pub features: usize,
    pub nodes: usize,
}

/// Outcome of a replay
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub features: Vec<FeatureReport>,
    pub events: Vec<EventReport>,
    pub draws: Vec<DrawReport>,
    pub index: IndexReport,
    pub metrics: MetricsSnapshot,
    pub split_attached: bool,
}

impl ReplayReport {
    /// Report of the feature with `key`
    pub fn feature(&self, key: &str) -> Option<&FeatureReport> {
        self.features.iter().find(|f| f.key == key)
    }

    /// Number of events with channel name `event` mentioning `key`
    pub fn event_count(&self, event: &str, key: &str) -> usize {
        self.events
            .iter()
            .filter(|e| e.event == event && e.features.iter().any(|f| f == key))
            .count()
    }
}

#[derive(Debug, Clone, Copy)]
struct FeatureRef {
    layer: LayerId,
    id: FeatureId,
}

/// A scenario's layers and engine, ready to play operations
#[derive(Debug)]
pub struct Replay {
    layers: LayerSet,
    engine: GhostNodes,
    split: Option<SplitControl>,
    keys: BTreeMap<String, FeatureRef>,
    events: EventRecorder,
    draws: DrawRecorder,
}

impl Replay {
    /// Build the layers and an active engine over the target layers
    pub fn new(scenario: &Scenario, config: GhostNodesConfig) -> GhostResult<Self> {
        let events = EventRecorder::new();
        let draws = DrawRecorder::new();
        let mut layers = LayerSet::new();
        let mut keys = BTreeMap::new();
        let mut targets = Vec::new();

        for spec in &scenario.layers {
            if layers.find_by_name(&spec.name).is_some() {
                return Err(GhostError::Scenario(format!("duplicate layer '{}'", spec.name)));
            }
            let id = layers.create_layer(spec.name.as_str());
            if spec.on_map {
                layers.add_to_map(id)?;
            }
            if spec.target {
                targets.push(id);
            }
            let features = build_features(&mut keys, id, &spec.features)?;
            let layer = layers.require_mut(id)?;
            layer.subscribe(Box::new(events.clone()));
            layer.set_renderer(Box::new(draws.clone()));
            layer.add_features(features);
        }

        let split = match &scenario.split {
            Some(spec) => Some(SplitControl::new(Some(layer_id(&layers, &spec.layer)?))),
            None => None,
        };
        let mut engine = GhostNodes::with_options(config, targets, split.as_ref())?;
        engine.activate(&mut layers);

        Ok(Self {
            layers,
            engine,
            split,
            keys,
            events,
            draws,
        })
    }

    /// Build and play every operation of `scenario`
    pub fn run(scenario: &Scenario, config: GhostNodesConfig) -> GhostResult<ReplayReport> {
        let mut replay = Self::new(scenario, config)?;
        for op in &scenario.operations {
            replay.apply(op)?;
        }
        Ok(replay.report())
    }

    /// Play one operator action
    pub fn apply(&mut self, op: &Operation) -> GhostResult<()> {
        match op {
            Operation::MoveVertex { feature, vertex, to } => {
                let target = self.resolve(feature)?;
                let event = self
                    .layers
                    .require_mut(target.layer)?
                    .move_vertex(target.id, *vertex, *to)?;
                self.dispatch(target.layer, &event);
            }
            Operation::Modify { feature } => {
                let target = self.resolve(feature)?;
                let event = self.layers.require_mut(target.layer)?.commit_feature(target.id)?;
                self.dispatch(target.layer, &event);
            }
            Operation::EndSession { feature, modified } => {
                let target = self.resolve(feature)?;
                let event = self
                    .layers
                    .require_mut(target.layer)?
                    .end_modification(target.id, *modified)?;
                self.dispatch(target.layer, &event);
            }
            Operation::Add { layer, features } => {
                let id = layer_id(&self.layers, layer)?;
                let features = build_features(&mut self.keys, id, features)?;
                let event = self.layers.require_mut(id)?.add_features(features);
                self.dispatch(id, &event);
            }
            Operation::Remove { features } => {
                let mut by_layer: BTreeMap<LayerId, Vec<FeatureId>> = BTreeMap::new();
                for key in features {
                    let target = self.resolve(key)?;
                    by_layer.entry(target.layer).or_default().push(target.id);
                }
                for (layer, ids) in by_layer {
                    let (_, event) = self.layers.require_mut(layer)?.remove_features(&ids);
                    self.dispatch(layer, &event);
                }
            }
            Operation::Split { feature, pieces } => self.apply_split(feature, pieces)?,
            Operation::Delete { feature } => {
                let target = self.resolve(feature)?;
                let event = self.layers.require_mut(target.layer)?.delete_feature(target.id)?;
                self.dispatch(target.layer, &event);
            }
        }
        Ok(())
    }

    fn apply_split(&mut self, feature: &str, pieces: &[PieceSpec]) -> GhostResult<()> {
        let split = self
            .split
            .clone()
            .ok_or_else(|| GhostError::Scenario("scenario has no split tool".to_string()))?;
        let target = self.resolve(feature)?;
        for piece in pieces {
            if self.keys.contains_key(&piece.key) {
                return Err(GhostError::Scenario(format!("duplicate feature key '{}'", piece.key)));
            }
        }

        let geometries = pieces.iter().map(|p| p.geometry.clone()).collect();
        let (added, after) = split.apply(self.layers.require_mut(target.layer)?, target.id, geometries)?;
        for (piece, id) in pieces.iter().zip(added.features()) {
            self.keys.insert(
                piece.key.clone(),
                FeatureRef {
                    layer: target.layer,
                    id,
                },
            );
        }

        self.dispatch(target.layer, &added);
        self.engine.handle_split_event(&mut self.layers, split.id(), &after);
        Ok(())
    }

    fn dispatch(&mut self, layer: LayerId, event: &LayerEvent) {
        self.engine.dispatch(&mut self.layers, layer, event);
    }

    fn resolve(&self, key: &str) -> GhostResult<FeatureRef> {
        self.keys
            .get(key)
            .copied()
            .ok_or_else(|| GhostError::Scenario(format!("unknown feature key '{}'", key)))
    }

    pub fn layers(&self) -> &LayerSet {
        &self.layers
    }

    pub fn engine(&self) -> &GhostNodes {
        &self.engine
    }

    /// Feature with scenario key `key`, if it still exists
    pub fn feature(&self, key: &str) -> Option<&Feature> {
        let target = self.keys.get(key)?;
        self.layers.feature(target.layer, target.id)
    }

    /// Snapshot of features, delivered events, redraws and counters
    pub fn report(&self) -> ReplayReport {
        let names: HashMap<FeatureId, &str> =
            self.keys.iter().map(|(key, r)| (r.id, key.as_str())).collect();
        let name = |id: FeatureId| {
            names
                .get(&id)
                .map_or_else(|| id.to_string(), |key| key.to_string())
        };
        let layer_name = |id: LayerId| {
            self.layers
                .layer(id)
                .map_or_else(|| id.to_string(), |l| l.name().to_string())
        };

        let features = self
            .keys
            .iter()
            .filter_map(|(key, target)| {
                let feature = self.layers.feature(target.layer, target.id)?;
                Some(FeatureReport {
                    key: key.clone(),
                    layer: layer_name(target.layer),
                    state: feature.state,
                    geometry: feature.geometry.clone(),
                    original: feature.original_geometry().cloned(),
                })
            })
            .collect();

        let events = self
            .events
            .events()
            .into_iter()
            .map(|recorded| EventReport {
                layer: layer_name(recorded.layer),
                event: recorded.event.name(),
                features: recorded.event.features().into_iter().map(&name).collect(),
                modified: match recorded.event {
                    LayerEvent::AfterFeatureModified { modified, .. } => Some(modified),
                    _ => None,
                },
            })
            .collect();

        let draws = self
            .draws
            .calls()
            .into_iter()
            .map(|call| DrawReport {
                feature: name(call.feature),
                intent: call.intent.as_str().to_string(),
            })
            .collect();

        ReplayReport {
            features,
            events,
            draws,
            index: IndexReport {
                features: self.engine.index().len(),
                nodes: self.engine.index().node_count(),
            },
            metrics: self.engine.metrics(),
            split_attached: self.engine.split().is_some(),
        }
    }
}

fn layer_id(layers: &LayerSet, name: &str) -> GhostResult<LayerId> {
    layers
        .find_by_name(name)
        .ok_or_else(|| GhostError::Scenario(format!("unknown layer '{}'", name)))
}

fn build_features(
    keys: &mut BTreeMap<String, FeatureRef>,
    layer: LayerId,
    specs: &[FeatureSpec],
) -> GhostResult<Vec<Feature>> {
    let mut features = Vec::with_capacity(specs.len());
    for spec in specs {
        if keys.contains_key(&spec.key) {
            return Err(GhostError::Scenario(format!("duplicate feature key '{}'", spec.key)));
        }
        let mut feature = Feature::new(spec.geometry.clone()).with_state(spec.state);
        feature.fid = spec.fid.clone();
        feature.attributes = spec.attributes.clone();
        keys.insert(spec.key.clone(), FeatureRef { layer, id: feature.id });
        features.push(feature);
    }
    Ok(features)
}
