//! Index Consistency Tests
//!
//! Tests for the ghost node index:
//! - Node lists and feature entries always mirror each other
//! - Empty nodes disappear immediately
//! - Only features reducing to a single line are indexed
//! - Deleted features heal out of the index on first lookup

use ghostnodes::geometry::{Geometry, LineString, Point};
use ghostnodes::index::{EndpointType, NodeKey, TopologyIndex};
use ghostnodes::source::{Feature, FeatureId, FeatureState, LayerId};
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

const ROADS: LayerId = LayerId(1);
const RIVERS: LayerId = LayerId(2);

fn line(coords: Vec<(f64, f64)>) -> Feature {
    Feature::new(Geometry::line(coords))
}

fn key(x: f64, y: f64) -> NodeKey {
    NodeKey::from_point(Point::new(x, y))
}

/// One step of an index churn run
#[derive(Debug, Clone)]
enum ChurnOp {
    Add {
        rivers: bool,
        from: (u8, u8),
        to: (u8, u8),
    },
    Remove(usize),
    Reindex(usize),
}

/// Coordinates on a coarse grid so endpoints collide often
fn grid_point() -> impl Strategy<Value = (u8, u8)> {
    (0u8..4, 0u8..4)
}

fn churn_op() -> impl Strategy<Value = ChurnOp> {
    prop_oneof![
        2 => (any::<bool>(), grid_point(), grid_point())
            .prop_map(|(rivers, from, to)| ChurnOp::Add { rivers, from, to }),
        1 => any::<usize>().prop_map(ChurnOp::Remove),
        1 => any::<usize>().prop_map(ChurnOp::Reindex),
    ]
}

fn grid_line(from: (u8, u8), to: (u8, u8)) -> Feature {
    line(vec![
        (f64::from(from.0), f64::from(from.1)),
        (f64::from(to.0), f64::from(to.1)),
    ])
}

fn total_memberships(index: &TopologyIndex) -> usize {
    index.nodes().map(|(_, node)| node.len()).sum()
}

// =============================================================================
// Bidirectional Consistency
// =============================================================================

/// Every indexed feature sits in exactly two node lists.
#[test]
fn test_memberships_match_entries() {
    let features = vec![
        line(vec![(0.0, 0.0), (1.0, 1.0)]),
        line(vec![(1.0, 1.0), (2.0, 2.0)]),
        line(vec![(1.0, 1.0), (1.0, 5.0), (0.0, 0.0)]),
    ];
    let mut index = TopologyIndex::new();
    assert_eq!(index.add_features(ROADS, &features), 3);

    assert_eq!(index.len(), 3);
    assert_eq!(index.node_count(), 3);
    assert_eq!(total_memberships(&index), 6);
    index.check_consistency().unwrap();

    let node = index.node(&key(1.0, 1.0)).unwrap();
    assert_eq!(node.features(EndpointType::End), &[features[0].id]);
    assert_eq!(
        node.features(EndpointType::Start),
        &[features[1].id, features[2].id]
    );
}

/// Removing a layer unindexes only that layer's features.
#[test]
fn test_remove_layer_is_scoped() {
    let road = line(vec![(0.0, 0.0), (1.0, 1.0)]);
    let river = line(vec![(1.0, 1.0), (2.0, 0.0)]);
    let mut index = TopologyIndex::new();
    index.add_features(ROADS, [&road]);
    index.add_features(RIVERS, [&river]);

    assert_eq!(index.remove_layer(ROADS), 1);
    assert!(!index.contains(road.id));
    assert_eq!(index.entry(river.id).unwrap().layer, RIVERS);
    assert!(index.node(&key(0.0, 0.0)).is_none());
    index.check_consistency().unwrap();
}

// =============================================================================
// Node Lifecycle
// =============================================================================

/// A node vanishes with its last member.
#[test]
fn test_empty_nodes_are_removed() {
    let a = line(vec![(0.0, 0.0), (1.0, 1.0)]);
    let b = line(vec![(1.0, 1.0), (2.0, 2.0)]);
    let mut index = TopologyIndex::new();
    index.add_features(ROADS, [&a, &b]);

    index.remove_features([a.id]);
    assert!(index.node(&key(0.0, 0.0)).is_none());
    assert!(index.node(&key(1.0, 1.0)).is_some());

    index.remove_features([b.id]);
    assert_eq!(index.node_count(), 0);
    assert!(index.is_empty());
}

/// Re-indexing after an in-place move drops the old node.
#[test]
fn test_reindex_follows_geometry() {
    let mut a = line(vec![(0.0, 0.0), (1.0, 1.0)]);
    let mut index = TopologyIndex::new();
    index.add_features(ROADS, [&a]);

    a.line_mut().unwrap().set_vertex(1, Point::new(3.0, 3.0));
    index.add_features(ROADS, [&a]);

    assert!(index.node(&key(1.0, 1.0)).is_none());
    assert_eq!(index.entry(a.id).unwrap().key(EndpointType::End), key(3.0, 3.0));
    assert_eq!(index.len(), 1);
    index.check_consistency().unwrap();
}

/// A closed ring is a member of one node under both endpoints.
#[test]
fn test_closed_ring_shares_one_node() {
    let ring = line(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
    let mut index = TopologyIndex::new();
    index.add_features(ROADS, [&ring]);

    assert_eq!(index.node_count(), 1);
    let node = index.node(&key(0.0, 0.0)).unwrap();
    assert!(node.contains(EndpointType::Start, ring.id));
    assert!(node.contains(EndpointType::End, ring.id));

    index.remove_features([ring.id]);
    assert_eq!(index.node_count(), 0);
}

// =============================================================================
// Indexability
// =============================================================================

/// Points, polygons, multi-part lines and degenerate lines stay out.
#[test]
fn test_non_lines_are_skipped() {
    let square: LineString = vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)].into();
    let features = vec![
        Feature::new(Geometry::Point(Point::new(0.0, 0.0))),
        Feature::new(Geometry::Polygon(vec![square])),
        Feature::new(Geometry::MultiLineString(vec![
            vec![(0.0, 0.0), (1.0, 1.0)].into(),
            vec![(2.0, 2.0), (3.0, 3.0)].into(),
        ])),
        line(vec![(0.0, 0.0)]),
        Feature {
            geometry: None,
            ..line(vec![(0.0, 0.0), (1.0, 1.0)])
        },
    ];
    let mut index = TopologyIndex::new();
    assert_eq!(index.add_features(ROADS, &features), 0);
    assert!(index.is_empty());
}

/// Single-component containers reduce to their line.
#[test]
fn test_single_component_containers_are_indexed() {
    let multi = Feature::new(Geometry::MultiLineString(vec![
        vec![(0.0, 0.0), (1.0, 1.0)].into(),
    ]));
    let collection = Feature::new(Geometry::Collection(vec![Geometry::line(vec![
        (1.0, 1.0),
        (2.0, 2.0),
    ])]));
    let mut index = TopologyIndex::new();
    assert_eq!(index.add_features(ROADS, [&multi, &collection]), 2);
    assert_eq!(index.node(&key(1.0, 1.0)).unwrap().len(), 2);
}

/// A feature flagged DELETE is unindexed the first time it is looked at.
#[test]
fn test_deleted_feature_self_heals() {
    let mut a = line(vec![(0.0, 0.0), (1.0, 1.0)]);
    let b = line(vec![(1.0, 1.0), (2.0, 2.0)]);
    let mut index = TopologyIndex::new();
    index.add_features(ROADS, [&a, &b]);

    a.state = FeatureState::Delete;
    assert!(index.indexable_line(&a).is_none());
    assert!(!index.contains(a.id));
    assert_eq!(
        index.node(&key(1.0, 1.0)).unwrap().features(EndpointType::Start),
        &[b.id]
    );
    index.check_consistency().unwrap();

    // Deleted features are never indexed in the first place
    assert_eq!(index.add_features(ROADS, [&a]), 0);
}

/// Unknown ids are ignored on removal.
#[test]
fn test_remove_unknown_is_noop() {
    let mut index = TopologyIndex::new();
    index.add_features(ROADS, [&line(vec![(0.0, 0.0), (1.0, 1.0)])]);
    assert_eq!(index.remove_features([FeatureId::new()]), 0);
    assert_eq!(index.len(), 1);
}

// =============================================================================
// Key Exactness
// =============================================================================

/// Keys compare by exact bits, except that -0.0 equals 0.0.
#[test]
fn test_key_exactness() {
    assert_eq!(key(-0.0, 0.0), key(0.0, -0.0));
    assert_ne!(key(0.1 + 0.2, 0.0), key(0.3, 0.0));

    let a = line(vec![(0.1 + 0.2, 0.0), (1.0, 0.0)]);
    let b = line(vec![(-1.0, 0.0), (0.3, 0.0)]);
    let mut index = TopologyIndex::new();
    index.add_features(ROADS, [&a, &b]);
    assert_eq!(index.node_count(), 4);
}

// =============================================================================
// Churn Properties
// =============================================================================

proptest! {
    /// Any interleaving of add, remove and re-index keeps both directions in sync.
    #[test]
    fn test_churn_keeps_index_consistent(ops in prop::collection::vec(churn_op(), 1..200)) {
        let mut live: Vec<Feature> = Vec::new();
        let mut index = TopologyIndex::new();

        for op in ops {
            match op {
                ChurnOp::Add { rivers, from, to } => {
                    let feature = grid_line(from, to);
                    let layer = if rivers { RIVERS } else { ROADS };
                    prop_assert_eq!(index.add_features(layer, [&feature]), 1);
                    live.push(feature);
                }
                ChurnOp::Remove(i) if !live.is_empty() => {
                    let victim = live.swap_remove(i % live.len());
                    prop_assert_eq!(index.remove_features([victim.id]), 1);
                }
                ChurnOp::Reindex(i) if !live.is_empty() => {
                    let feature = &live[i % live.len()];
                    prop_assert_eq!(index.add_features(ROADS, [feature]), 1);
                }
                _ => {}
            }

            prop_assert!(index.check_consistency().is_ok());
            prop_assert_eq!(index.len(), live.len());
            prop_assert_eq!(total_memberships(&index), 2 * live.len());
        }

        index.remove_features(live.iter().map(|f| f.id));
        prop_assert!(index.is_empty());
        prop_assert_eq!(index.node_count(), 0);
    }
}
