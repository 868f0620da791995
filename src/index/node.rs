//! BTreeMap-based node index
//!
//! Maps a `NodeKey` to the features touching that point, split by which
//! endpoint touches it. Entries are dropped as soon as both lists are
//! empty.

use std::collections::BTreeMap;

use crate::source::FeatureId;

use super::key::{EndpointType, NodeKey};

/// Features touching one ghost node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeEntry {
    start: Vec<FeatureId>,
    end: Vec<FeatureId>,
}

impl NodeEntry {
    /// Features touching this node with the given endpoint, in insertion order
    pub fn features(&self, endpoint: EndpointType) -> &[FeatureId] {
        match endpoint {
            EndpointType::Start => &self.start,
            EndpointType::End => &self.end,
        }
    }

    fn list_mut(&mut self, endpoint: EndpointType) -> &mut Vec<FeatureId> {
        match endpoint {
            EndpointType::Start => &mut self.start,
            EndpointType::End => &mut self.end,
        }
    }

    /// Whether `feature` touches this node with `endpoint`
    pub fn contains(&self, endpoint: EndpointType, feature: FeatureId) -> bool {
        self.features(endpoint).contains(&feature)
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }

    /// Total number of memberships (a closed line counts twice)
    pub fn len(&self) -> usize {
        self.start.len() + self.end.len()
    }

    /// Every membership: start list first, then end list
    pub fn iter(&self) -> impl Iterator<Item = (EndpointType, FeatureId)> + '_ {
        self.start
            .iter()
            .map(|f| (EndpointType::Start, *f))
            .chain(self.end.iter().map(|f| (EndpointType::End, *f)))
    }
}

/// All ghost nodes currently known
#[derive(Debug, Default)]
pub struct NodeIndex {
    nodes: BTreeMap<NodeKey, NodeEntry>,
}

impl NodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `feature` at `key`, creating the entry if needed
    pub fn insert(&mut self, key: NodeKey, endpoint: EndpointType, feature: FeatureId) {
        self.nodes
            .entry(key)
            .or_default()
            .list_mut(endpoint)
            .push(feature);
    }

    /// Unregister `feature` from `key`.
    ///
    /// Drops the entry when both lists become empty. Returns false if the
    /// membership did not exist.
    pub fn remove(&mut self, key: &NodeKey, endpoint: EndpointType, feature: FeatureId) -> bool {
        let Some(entry) = self.nodes.get_mut(key) else {
            return false;
        };
        let list = entry.list_mut(endpoint);
        let found = match list.iter().position(|f| *f == feature) {
            Some(pos) => {
                list.remove(pos);
                true
            }
            None => false,
        };
        if entry.is_empty() {
            self.nodes.remove(key);
        }
        found
    }

    pub fn get(&self, key: &NodeKey) -> Option<&NodeEntry> {
        self.nodes.get(key)
    }

    pub fn contains_key(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &NodeEntry)> {
        self.nodes.iter()
    }
}
