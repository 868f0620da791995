//! Topology index
//!
//! Combines the node index (key -> features) with the feature index
//! (feature -> keys) and keeps them consistent after every mutation.
//!
//! # API
//!
//! - `add_features(layer, features)` - Index features whose geometry reduces to a line
//! - `remove_features(ids)` - Unindex features, dropping emptied nodes
//! - `neighbors_at(id, endpoint)` - Node entry at one endpoint of an indexed feature
//! - `indexable_line(feature)` - Line used for indexing; unindexes deleted features
//! - `check_consistency()` - Verify both directions agree

use std::collections::HashMap;

use crate::geometry::LineString;
use crate::source::{Feature, FeatureId, FeatureState, LayerId};

use super::errors::{IndexError, IndexResult};
use super::key::{EndpointType, NodeKey};
use super::node::{NodeEntry, NodeIndex};

/// Where an indexed feature lives and which nodes it touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureIndexEntry {
    /// Layer owning the feature
    pub layer: LayerId,
    /// Start and end node keys
    pub nodes: [NodeKey; 2],
}

impl FeatureIndexEntry {
    /// Node key at one endpoint
    pub fn key(&self, endpoint: EndpointType) -> NodeKey {
        match endpoint {
            EndpointType::Start => self.nodes[0],
            EndpointType::End => self.nodes[1],
        }
    }
}

/// Bidirectional endpoint index over line features
#[derive(Debug, Default)]
pub struct TopologyIndex {
    nodes: NodeIndex,
    features: HashMap<FeatureId, FeatureIndexEntry>,
}

impl TopologyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.features.clear();
    }

    /// Number of indexed features
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of ghost nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.features.contains_key(&id)
    }

    pub fn entry(&self, id: FeatureId) -> Option<&FeatureIndexEntry> {
        self.features.get(&id)
    }

    pub fn node(&self, key: &NodeKey) -> Option<&NodeEntry> {
        self.nodes.get(key)
    }

    /// Ghost nodes in key order
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeKey, &NodeEntry)> {
        self.nodes.iter()
    }

    /// The line a feature is indexed by.
    ///
    /// Returns `None` for features whose geometry does not reduce to a
    /// single line. Features in `DELETE` state also return `None` and are
    /// removed from the index as a side effect.
    pub fn indexable_line<'f>(&mut self, feature: &'f Feature) -> Option<&'f LineString> {
        let geometry = feature.geometry.as_ref()?;
        if feature.state == FeatureState::Delete {
            self.remove_features([feature.id]);
            return None;
        }
        geometry.reduce_to_line()
    }

    /// Index features of `layer`.
    ///
    /// Features without an indexable line are skipped. A feature that is
    /// already indexed is re-indexed under its current endpoints. Returns
    /// the number of features indexed.
    pub fn add_features<'a, I>(&mut self, layer: LayerId, features: I) -> usize
    where
        I: IntoIterator<Item = &'a Feature>,
    {
        let mut added = 0;
        for feature in features {
            let Some(line) = self.indexable_line(feature) else {
                continue;
            };
            let (Some(first), Some(last)) = (line.first(), line.last()) else {
                continue;
            };
            if self.features.contains_key(&feature.id) {
                self.remove_features([feature.id]);
            }

            let nodes = [NodeKey::from_point(first), NodeKey::from_point(last)];
            self.nodes.insert(nodes[0], EndpointType::Start, feature.id);
            self.nodes.insert(nodes[1], EndpointType::End, feature.id);
            self.features.insert(feature.id, FeatureIndexEntry { layer, nodes });
            added += 1;
        }
        added
    }

    /// Unindex features; unknown ids are ignored. Returns the number removed.
    pub fn remove_features<I>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = FeatureId>,
    {
        let mut removed = 0;
        for id in ids {
            let Some(entry) = self.features.remove(&id) else {
                continue;
            };
            for endpoint in EndpointType::BOTH {
                let key = entry.key(endpoint);
                if !self.nodes.remove(&key, endpoint, id) {
                    unreachable!("feature {id} indexed at {key} ({endpoint}) but missing from node");
                }
            }
            removed += 1;
        }
        removed
    }

    /// Unindex every feature of `layer`. Returns the number removed.
    pub fn remove_layer(&mut self, layer: LayerId) -> usize {
        let ids: Vec<FeatureId> = self
            .features
            .iter()
            .filter(|(_, entry)| entry.layer == layer)
            .map(|(id, _)| *id)
            .collect();
        self.remove_features(ids)
    }

    /// Node entry touched by feature `id` at `endpoint`, if the feature is indexed
    pub fn neighbors_at(&self, id: FeatureId, endpoint: EndpointType) -> Option<&NodeEntry> {
        let entry = self.features.get(&id)?;
        self.nodes.get(&entry.key(endpoint))
    }

    /// Verify that the node index and the feature index mirror each other.
    pub fn check_consistency(&self) -> IndexResult<()> {
        for (id, entry) in &self.features {
            for endpoint in EndpointType::BOTH {
                let key = entry.key(endpoint);
                let member = self
                    .nodes
                    .get(&key)
                    .is_some_and(|node| node.contains(endpoint, *id));
                if !member {
                    return Err(IndexError::inconsistent(
                        key,
                        format!("feature {} missing from {} list", id, endpoint),
                    ));
                }
            }
        }

        for (key, node) in self.nodes.iter() {
            if node.is_empty() {
                return Err(IndexError::stale_node(key));
            }
            for (endpoint, id) in node.iter() {
                let points_back = self
                    .features
                    .get(&id)
                    .is_some_and(|entry| entry.key(endpoint) == *key);
                if !points_back {
                    return Err(IndexError::inconsistent(
                        key,
                        format!("{} member {} has no matching feature entry", endpoint, id),
                    ));
                }
            }
        }
        Ok(())
    }
}
