//! Snapping external coordinates onto the graph and building the
//! spatial index that makes it fast ([`crate::queries::nearest_node`]).

use geo::{prelude::*, Point};
use petgraph::graph::DiGraph;
use petgraph::graph::NodeIndex;
use rstar::Point as RstarPoint;
use rstar::RTree;

use crate::graph::{GraphEdge, GraphNode, GraphStore, WalkEdge};
use crate::{Error, WALK_SPEED};

/// Any object that can be snapped to the nearest node in the graph. The
/// object should have a geometry method that returns its representation
/// as `geo::Point`.
pub(crate) trait Snappable {
    fn geometry(&self) -> &Point;
}

impl Snappable for Point {
    fn geometry(&self) -> &Point {
        self
    }
}

/// An external point that has been resolved to its nearest walk node.
/// The point itself is not stored in the graph; instead it carries the
/// nearest node's index plus the walking distance to it, so routing
/// calculations can treat the query coordinate as "the nearest node,
/// minus a fixed head/tail walk".
#[derive(Debug, Clone, Copy)]
pub struct SnappedPoint {
    pub geometry: Point,
    index: NodeIndex,
    distance: f64,
}

impl SnappedPoint {
    pub fn init(geometry: Point, graph: &GraphStore) -> Result<Self, Error> {
        snap_single_point(&geometry, graph.rtree_ref())
    }

    const fn new(geometry: Point, index: NodeIndex, distance: f64) -> Self {
        Self {
            geometry,
            index,
            distance,
        }
    }

    #[must_use]
    pub const fn index(&self) -> NodeIndex {
        self.index
    }

    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }
}

/// Finds the nearest point in the `RTree` and the walking-time distance
/// to it. Returns the nearest node index and the calculated distance.
fn find_nearest_point_and_calculate_distance(
    point: &IndexedPoint,
    tree: &RTree<IndexedPoint>,
) -> Result<(NodeIndex, f64), Error> {
    let nearest_point = tree
        .nearest_neighbor(point)
        .ok_or_else(|| Error::NodeNotFound(format!("Nearest node not found for point {:?}", point.geometry)))?;

    let distance = point.geometry.haversine_distance(&nearest_point.geometry) / WALK_SPEED;
    let node = nearest_point
        .index
        .ok_or_else(|| Error::NodeNotFound(format!("Nearest node not found for point {:?}", point.geometry)))?;
    Ok((node, distance))
}

/// Snaps a single point to the nearest node in the `RTree`.
pub(crate) fn snap_single_point<T: Snappable>(point: &T, tree: &RTree<IndexedPoint>) -> Result<SnappedPoint, Error> {
    let point_to_snap = IndexedPoint {
        index: None,
        geometry: *point.geometry(),
    };

    let (nearest_node, distance) = find_nearest_point_and_calculate_distance(&point_to_snap, tree)?;

    Ok(SnappedPoint::new(*point.geometry(), nearest_node, distance))
}

/// A graph node as stored in the `RTree`. `rstar` requires a structure
/// implementing its `Point` trait; the node index is carried alongside
/// so a nearest-neighbor hit can be connected back into the graph.
#[derive(Copy, Clone, PartialEq, Debug)]
pub(crate) struct IndexedPoint {
    pub(crate) index: Option<NodeIndex>,
    pub(crate) geometry: Point,
}

impl RstarPoint for IndexedPoint {
    type Scalar = f64;
    const DIMENSIONS: usize = 2;

    fn generate(mut generator: impl FnMut(usize) -> Self::Scalar) -> Self {
        Self {
            index: None,
            geometry: Point::new(generator(0), generator(1)),
        }
    }

    fn nth(&self, index: usize) -> Self::Scalar {
        self.geometry.nth(index)
    }

    fn nth_mut(&mut self, index: usize) -> &mut Self::Scalar {
        self.geometry.nth_mut(index)
    }
}

pub(crate) fn build_rtree(graph: &DiGraph<GraphNode, GraphEdge>) -> RTree<IndexedPoint> {
    let index_geo_vec: Vec<IndexedPoint> = graph
        .node_indices()
        .map(|node| {
            let node_data = graph.node_weight(node).unwrap();
            let node_point: Point = *node_data.geometry();
            IndexedPoint {
                index: Some(node),
                geometry: node_point,
            }
        })
        .collect();

    RTree::bulk_load(index_geo_vec)
}

/// Connects every transit stop to its nearest walk node with a
/// bidirectional [`GraphEdge::Transfer`], establishing the "every Stop
/// has at least one anchor Node" derived invariant.
pub(crate) fn connect_stops_to_streets(graph: &mut GraphStore) -> Result<(), Error> {
    let rtree = graph.rtree_ref().clone();

    for node in graph.node_indices().collect::<Vec<_>>() {
        // Avoid duplicate transfer edges when merging multiple GTFS
        // feeds onto the same street graph.
        if graph.edges(node).any(|edge| matches!(edge.weight(), GraphEdge::Transfer(_))) {
            continue;
        }

        let weight = graph
            .node(node)
            .ok_or_else(|| Error::MissingValue("Node weight not found".to_string()))?;

        if let GraphNode::Transit(_) = weight {
            let node_point = IndexedPoint {
                index: Some(node),
                geometry: *weight.geometry(),
            };

            if let Ok((nearest_point_index, distance)) = find_nearest_point_and_calculate_distance(&node_point, &rtree)
            {
                let edge = GraphEdge::Transfer(WalkEdge { edge_weight: distance });

                graph.add_edge(node, nearest_point_index, edge.clone());
                graph.add_edge(nearest_point_index, node, edge);
            }
        }
    }
    Ok(())
}
