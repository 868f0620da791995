//! # Features
//!
//! Line features as owned by a layer. The sync engine only reads and
//! annotates them; it never creates or destroys one.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::geometry::{Geometry, LineString};

/// Runtime identity of a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureId(Uuid);

impl FeatureId {
    /// Generate a fresh id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FeatureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persistence state of a feature
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeatureState {
    /// Unchanged since loaded
    #[default]
    None,
    /// Created locally, not yet persisted
    Insert,
    /// Persisted and locally modified
    Update,
    /// Slated for deletion
    Delete,
}

impl FeatureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureState::None => "NONE",
            FeatureState::Insert => "INSERT",
            FeatureState::Update => "UPDATE",
            FeatureState::Delete => "DELETE",
        }
    }
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Pre-edit values kept until the feature is persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Modified {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
}

/// A vector feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub id: FeatureId,

    /// Persistent id, present once the feature has been stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<String>,

    #[serde(default)]
    pub geometry: Option<Geometry>,

    #[serde(default)]
    pub state: FeatureState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<Modified>,

    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl Feature {
    /// Create a feature with a fresh id and no state
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: FeatureId::new(),
            fid: None,
            geometry: Some(geometry),
            state: FeatureState::None,
            modified: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_state(mut self, state: FeatureState) -> Self {
        self.state = state;
        self
    }

    pub fn with_fid(mut self, fid: impl Into<String>) -> Self {
        self.fid = Some(fid.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The single line this feature's geometry reduces to, regardless of state
    pub fn line(&self) -> Option<&LineString> {
        self.geometry.as_ref().and_then(Geometry::reduce_to_line)
    }

    /// Mutable counterpart of `line`
    pub fn line_mut(&mut self) -> Option<&mut LineString> {
        self.geometry.as_mut().and_then(Geometry::reduce_to_line_mut)
    }

    /// Geometry recorded before the first uncommitted edit, if any
    pub fn original_geometry(&self) -> Option<&Geometry> {
        self.modified.as_ref().and_then(|m| m.geometry.as_ref())
    }
}
