//! Convenience re-exports for callers who just want to build a graph,
//! snap points, and run a query without naming every submodule.

pub use crate::algo::dijkstra::{shortest_path, DijkstraTraversal, Trace};
pub use crate::algo::segmentation::{partition, Context, Piece};
pub use crate::connectors::SnappedPoint;
pub use crate::directions::{Directions, Maneuver, Route, Step};
pub use crate::entities::{
    Agency, AgencyId, Node, NodeId, Route as RouteEntity, RouteId, Service, ServiceId, Stop, StopId, StopTime, Trip,
    TripId, Way, WayId,
};
pub use crate::graph::{GraphEdge, GraphNode, GraphStore};
pub use crate::router::{Router, Transition, TransitionPayload};
pub use crate::{queries, Error, WALK_SPEED};
