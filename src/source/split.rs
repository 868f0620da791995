//! # Split Collaborator
//!
//! A split tool cuts one line feature into pieces and reports the result
//! with `aftersplit`. The cutting geometry itself is computed elsewhere;
//! this type only applies an already-computed split to a layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{GhostError, GhostResult};
use crate::geometry::Geometry;

use super::event::{LayerEvent, SplitEvent};
use super::feature::{Feature, FeatureId, FeatureState};
use super::layer::{Layer, LayerId};

/// Identity of a split collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitId(Uuid);

impl fmt::Display for SplitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A split tool bound to the layer whose features it splits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitControl {
    id: SplitId,
    source: Option<LayerId>,
}

impl SplitControl {
    /// Create a split tool splitting features of `source`
    pub fn new(source: Option<LayerId>) -> Self {
        Self {
            id: SplitId(Uuid::new_v4()),
            source,
        }
    }

    pub fn id(&self) -> SplitId {
        self.id
    }

    /// Layer whose features this tool splits
    pub fn source(&self) -> Option<LayerId> {
        self.source
    }

    /// Apply a split of `source` into `pieces` on `layer`.
    ///
    /// Deferred delete: the source stays in the layer marked `DELETE` and
    /// each piece is added as a new `INSERT` feature carrying the source's
    /// attributes. Returns the `featuresadded` event for the pieces and the
    /// `aftersplit` event, in firing order.
    pub fn apply(
        &self,
        layer: &mut Layer,
        source: FeatureId,
        pieces: Vec<Geometry>,
    ) -> GhostResult<(LayerEvent, SplitEvent)> {
        if self.source != Some(layer.id()) {
            return Err(GhostError::SplitSourceMismatch(layer.id()));
        }
        let original = layer.feature_mut(source).ok_or(GhostError::FeatureNotFound(source))?;
        original.state = FeatureState::Delete;
        let attributes = original.attributes.clone();

        let features: Vec<Feature> = pieces
            .into_iter()
            .map(|geometry| {
                let mut piece = Feature::new(geometry).with_state(FeatureState::Insert);
                piece.attributes = attributes.clone();
                piece
            })
            .collect();
        let ids: Vec<FeatureId> = features.iter().map(|f| f.id).collect();

        let added = layer.add_features(features);
        Ok((added, SplitEvent::AfterSplit { source, features: ids }))
    }
}
