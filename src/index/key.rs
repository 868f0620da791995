//! Node keys and endpoint selectors

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Key of a ghost node, derived from exact endpoint coordinates.
///
/// Two endpoints share a key iff their coordinates are equal; no tolerance
/// is applied. `-0.0` is folded into `0.0` so numerically equal
/// coordinates always meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    x: u64,
    y: u64,
}

impl NodeKey {
    pub fn from_point(p: Point) -> Self {
        Self {
            x: Self::bits(p.x),
            y: Self::bits(p.y),
        }
    }

    fn bits(v: f64) -> u64 {
        if v == 0.0 {
            0.0f64.to_bits()
        } else {
            v.to_bits()
        }
    }

    /// The coordinate this key was derived from
    pub fn point(&self) -> Point {
        Point::new(f64::from_bits(self.x), f64::from_bits(self.y))
    }
}

impl From<Point> for NodeKey {
    fn from(p: Point) -> Self {
        NodeKey::from_point(p)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.point();
        write!(f, "{}_{}", p.x, p.y)
    }
}

/// Which end of a line a vertex is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    /// First vertex
    Start,
    /// Last vertex
    End,
}

impl EndpointType {
    pub const BOTH: [EndpointType; 2] = [EndpointType::Start, EndpointType::End];

    /// Classify vertex `index` of a line with `len` vertices.
    ///
    /// Interior vertices are not endpoints. On a line that is too short to
    /// have two distinct ends the first vertex wins.
    pub fn of_vertex(index: usize, len: usize) -> Option<Self> {
        if len == 0 {
            None
        } else if index == 0 {
            Some(EndpointType::Start)
        } else if index == len - 1 {
            Some(EndpointType::End)
        } else {
            None
        }
    }

    /// Index of this endpoint in a line with `len` vertices
    pub fn vertex_index(&self, len: usize) -> usize {
        match self {
            EndpointType::Start => 0,
            EndpointType::End => len.saturating_sub(1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::Start => "start",
            EndpointType::End => "end",
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
