//! # Feature Source Events
//!
//! Events fired by layers, the map and split collaborators.

use serde::{Deserialize, Serialize};

use super::feature::FeatureId;
use super::layer::LayerId;

/// Event on a layer's feature channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerEvent {
    /// Features were added to the layer
    FeaturesAdded { features: Vec<FeatureId> },

    /// Features were removed from the layer
    FeaturesRemoved { features: Vec<FeatureId> },

    /// A feature's modification was committed
    FeatureModified { feature: FeatureId },

    /// A feature's edit session ended
    AfterFeatureModified { feature: FeatureId, modified: bool },

    /// A vertex of a feature's line was moved in place.
    ///
    /// `vertex` is the index into the line the geometry reduces to.
    VertexModified { feature: FeatureId, vertex: usize },
}

impl LayerEvent {
    /// Channel name of this event
    pub fn name(&self) -> &'static str {
        match self {
            LayerEvent::FeaturesAdded { .. } => "featuresadded",
            LayerEvent::FeaturesRemoved { .. } => "featuresremoved",
            LayerEvent::FeatureModified { .. } => "featuremodified",
            LayerEvent::AfterFeatureModified { .. } => "afterfeaturemodified",
            LayerEvent::VertexModified { .. } => "vertexmodified",
        }
    }

    /// Features this event refers to
    pub fn features(&self) -> Vec<FeatureId> {
        match self {
            LayerEvent::FeaturesAdded { features } | LayerEvent::FeaturesRemoved { features } => {
                features.clone()
            }
            LayerEvent::FeatureModified { feature }
            | LayerEvent::AfterFeatureModified { feature, .. }
            | LayerEvent::VertexModified { feature, .. } => vec![*feature],
        }
    }
}

/// Event on the map's layer channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "layer", rename_all = "lowercase")]
pub enum MapEvent {
    AddLayer(LayerId),
    RemoveLayer(LayerId),
}

/// Event fired by a split collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SplitEvent {
    /// `source` was split into `features`
    AfterSplit {
        source: FeatureId,
        features: Vec<FeatureId>,
    },
}
