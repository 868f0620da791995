//! Ghost node index
//!
//! Endpoints of independently digitized lines that coincide exactly form a
//! "ghost node": a shared point with no explicit shared-vertex record.
//! This module groups features by those points.
//!
//! # Design Principles
//!
//! - Derived state: the index mirrors the layers, never the source of truth
//! - Exact coincidence: keys come from bit-equal coordinates
//! - Deterministic: nodes iterate in key order, members in insertion order
//!
//! # Invariants
//!
//! - Every indexed feature is a member of the node at each of its two keys
//! - Every node member has a feature entry pointing back at that node
//! - Nodes with no members are removed immediately

mod errors;
mod key;
mod manager;
mod node;

pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use key::{EndpointType, NodeKey};
pub use manager::{FeatureIndexEntry, TopologyIndex};
pub use node::{NodeEntry, NodeIndex};
