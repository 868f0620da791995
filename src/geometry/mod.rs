//! Geometry model for editable vector features
//!
//! Only the shapes the topology index needs to reason about are modelled.
//!
//! # Reduction
//!
//! A geometry "reduces" to a line when unwrapping single-component
//! containers ends on a `LineString` with at least two vertices.
//! Polygons and multi-part geometries never reduce.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 2D coordinate, serialized as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

impl From<Point> for (f64, f64) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl Bounds {
    fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Bounds {
            left: first.x,
            bottom: first.y,
            right: first.x,
            top: first.y,
        };
        for p in &points[1..] {
            bounds.left = bounds.left.min(p.x);
            bounds.bottom = bounds.bottom.min(p.y);
            bounds.right = bounds.right.max(p.x);
            bounds.top = bounds.top.max(p.y);
        }
        Some(bounds)
    }
}

/// An ordered sequence of vertices.
///
/// Bounds are computed lazily and cached; any in-place vertex write must
/// be followed by `clear_bounds`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Point>", into = "Vec<Point>")]
pub struct LineString {
    points: Vec<Point>,
    bounds: Option<Bounds>,
}

impl PartialEq for LineString {
    fn eq(&self, other: &Self) -> bool {
        self.points == other.points
    }
}

impl LineString {
    /// Create a line from its vertices
    pub fn new(points: Vec<Point>) -> Self {
        Self { points, bounds: None }
    }

    /// Vertices in order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the line has no vertices
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First vertex
    pub fn first(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Last vertex
    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Vertex at `index`
    pub fn vertex(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    /// Overwrite the vertex at `index` in place.
    ///
    /// Returns false if the index is out of range.
    pub fn set_vertex(&mut self, index: usize, point: Point) -> bool {
        match self.points.get_mut(index) {
            Some(slot) => {
                *slot = point;
                self.clear_bounds();
                true
            }
            None => false,
        }
    }

    /// Sum of segment lengths
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| (w[1].x - w[0].x).hypot(w[1].y - w[0].y))
            .sum()
    }

    /// Cached bounding box
    pub fn bounds(&mut self) -> Option<Bounds> {
        if self.bounds.is_none() {
            self.bounds = Bounds::of(&self.points);
        }
        self.bounds
    }

    /// Whether a bounding box is currently cached
    pub fn has_cached_bounds(&self) -> bool {
        self.bounds.is_some()
    }

    /// Drop the cached bounding box
    pub fn clear_bounds(&mut self) {
        self.bounds = None;
    }
}

impl From<Vec<Point>> for LineString {
    fn from(points: Vec<Point>) -> Self {
        LineString::new(points)
    }
}

impl From<LineString> for Vec<Point> {
    fn from(line: LineString) -> Self {
        line.points
    }
}

impl From<Vec<(f64, f64)>> for LineString {
    fn from(coords: Vec<(f64, f64)>) -> Self {
        LineString::new(coords.into_iter().map(Point::from).collect())
    }
}

/// Feature geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Point),
    LineString(LineString),
    /// Outer ring followed by holes
    Polygon(Vec<LineString>),
    MultiLineString(Vec<LineString>),
    Collection(Vec<Geometry>),
}

impl Geometry {
    /// Convenience constructor for a line from raw coordinates
    pub fn line(coords: Vec<(f64, f64)>) -> Self {
        Geometry::LineString(coords.into())
    }

    /// Short type name used in reports
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::LineString(_) => "LineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Collection(_) => "Collection",
        }
    }

    /// Total length of all linear parts
    pub fn length(&self) -> f64 {
        match self {
            Geometry::Point(_) => 0.0,
            Geometry::LineString(line) => line.length(),
            Geometry::Polygon(rings) | Geometry::MultiLineString(rings) => {
                rings.iter().map(LineString::length).sum()
            }
            Geometry::Collection(parts) => parts.iter().map(Geometry::length).sum(),
        }
    }

    /// Unwrap single-component containers down to a bare line.
    pub fn reduce_to_line(&self) -> Option<&LineString> {
        match self {
            Geometry::LineString(line) if line.len() >= 2 => Some(line),
            Geometry::MultiLineString(lines) if lines.len() == 1 => {
                Some(&lines[0]).filter(|l| l.len() >= 2)
            }
            Geometry::Collection(parts) if parts.len() == 1 => parts[0].reduce_to_line(),
            _ => None,
        }
    }

    /// Mutable counterpart of `reduce_to_line`.
    pub fn reduce_to_line_mut(&mut self) -> Option<&mut LineString> {
        match self {
            Geometry::LineString(line) if line.len() >= 2 => Some(line),
            Geometry::MultiLineString(lines) if lines.len() == 1 => {
                lines.first_mut().filter(|l| l.len() >= 2)
            }
            Geometry::Collection(parts) if parts.len() == 1 => parts[0].reduce_to_line_mut(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_reduces() {
        let geom = Geometry::line(vec![(0.0, 0.0), (1.0, 1.0)]);
        let line = geom.reduce_to_line().unwrap();
        assert_eq!(line.first(), Some(Point::new(0.0, 0.0)));
        assert_eq!(line.last(), Some(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_nested_single_component_reduces() {
        let inner = LineString::from(vec![(0.0, 0.0), (2.0, 0.0)]);
        let geom = Geometry::Collection(vec![Geometry::MultiLineString(vec![inner])]);
        assert!(geom.reduce_to_line().is_some());
    }

    #[test]
    fn test_multi_part_does_not_reduce() {
        let geom = Geometry::MultiLineString(vec![
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            LineString::from(vec![(5.0, 0.0), (6.0, 0.0)]),
        ]);
        assert!(geom.reduce_to_line().is_none());
    }

    #[test]
    fn test_point_polygon_and_degenerate_line_do_not_reduce() {
        assert!(Geometry::Point(Point::new(1.0, 1.0)).reduce_to_line().is_none());

        let ring = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert!(Geometry::Polygon(vec![ring]).reduce_to_line().is_none());

        assert!(Geometry::line(vec![(3.0, 3.0)]).reduce_to_line().is_none());
    }

    #[test]
    fn test_set_vertex_clears_bounds() {
        let mut line = LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(line.bounds().unwrap().right, 1.0);
        assert!(line.has_cached_bounds());

        assert!(line.set_vertex(1, Point::new(4.0, 2.0)));
        assert!(!line.has_cached_bounds());
        assert_eq!(line.bounds().unwrap().right, 4.0);

        assert!(!line.set_vertex(7, Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_length() {
        let geom = Geometry::line(vec![(0.0, 0.0), (3.0, 4.0)]);
        assert_eq!(geom.length(), 5.0);
    }

    #[test]
    fn test_geometry_json_shape() {
        let geom = Geometry::line(vec![(0.0, 0.0), (1.0, 2.0)]);
        let value = serde_json::to_value(&geom).unwrap();
        assert_eq!(value["type"], "LineString");
        assert_eq!(value["coordinates"][1], serde_json::json!([1.0, 2.0]));

        let back: Geometry = serde_json::from_value(value).unwrap();
        assert_eq!(back, geom);
    }
}
