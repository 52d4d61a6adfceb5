/*!
Defines [`GraphStore`] and the node/edge types backing it.

The store unifies OSM walk nodes and GTFS stops into one `petgraph::DiGraph`,
with secondary indexes (`HashMap`s plus an [`rstar::RTree`]) providing the
unique-lookup and range-scan primitives the data model calls for.

# Structs
- `GraphStore`: owns the graph, the spatial index, and every entity's unique index.
- `ScheduledTrip`: one scheduled movement carried on a [`TransitEdge`].
- `WalkEdge`, `TransitEdge`: edge payloads.

# Enums
- `GraphNode`: `Walk` (an OSM road node) or `Transit` (a GTFS stop).
- `GraphEdge`: `Walk`, `Transfer` (stop-to-anchor-node), or `Transit`.
*/

use ahash::{HashMap, HashMapExt};
use geo::Point;
use petgraph::graph::{DiGraph, EdgeReference};
use petgraph::prelude::{EdgeIndex, NodeIndex};
use petgraph::Direction;
use rstar::RTree;

use crate::connectors::IndexedPoint;
use crate::entities::{
    Agency, AgencyId, Node, NodeId, Route, RouteId, Service, ServiceId, Stop, StopId, StopTime, Trip, TripId, Way,
    WayId,
};
use crate::queries::StopTimesByTrip;

/// One scheduled movement between the two stops an edge connects.
/// `TransitEdge::edge_trips` is kept sorted by `departure_time` so
/// [`crate::queries::find_trip`] can binary-search it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTrip {
    pub trip: TripId,
    pub departure_time: u32,
    pub arrival_time: u32,
}

impl ScheduledTrip {
    #[must_use]
    pub const fn new(trip: TripId, departure_time: u32, arrival_time: u32) -> Self {
        Self {
            trip,
            departure_time,
            arrival_time,
        }
    }
}

/// A pedestrian edge (Node-Node, Node-Stop, or Stop-Node). `edge_weight`
/// is the walking time in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkEdge {
    pub edge_weight: f64,
}

/// A transit edge (Stop-Stop) carrying every scheduled trip that
/// traverses it, sorted by departure time at the source stop.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitEdge {
    pub edge_trips: Vec<ScheduledTrip>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphEdge {
    /// A walkable hop between two road nodes, threaded through a
    /// [`Way`] when one covers the pair.
    Walk(WalkEdge),
    /// The fixed link connecting a [`Stop`] to its anchor [`Node`].
    Transfer(WalkEdge),
    /// A scheduled transit hop between two stops.
    Transit(TransitEdge),
}

impl GraphEdge {
    #[must_use]
    pub const fn is_transit(&self) -> bool {
        matches!(self, Self::Transit(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    Walk(Node),
    Transit(Stop),
}

impl GraphNode {
    #[must_use]
    pub const fn geometry(&self) -> &Point<f64> {
        match self {
            Self::Walk(node) => &node.location,
            Self::Transit(stop) => &stop.location,
        }
    }

    #[must_use]
    pub const fn as_stop(&self) -> Option<&Stop> {
        match self {
            Self::Transit(stop) => Some(stop),
            Self::Walk(_) => None,
        }
    }
}

/// The read-only, build-once graph store. Owns the `petgraph` adjacency
/// structure, the spatial index, and every entity's unique index.
///
/// `GraphStore` has no interior mutability; once built it is `Send +
/// Sync` and safe to share across worker threads behind a plain
/// reference or `Arc`.
#[derive(Debug, Clone)]
pub struct GraphStore {
    graph: DiGraph<GraphNode, GraphEdge>,
    rtree: RTree<IndexedPoint>,
    ways: HashMap<WayId, Way>,
    way_by_node_pair: HashMap<(NodeId, NodeId), WayId>,
    routes: HashMap<RouteId, Route>,
    agencies: HashMap<AgencyId, Agency>,
    trips: HashMap<TripId, Trip>,
    services: HashMap<ServiceId, Service>,
    stop_times: StopTimesByTrip,
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            rtree: RTree::new(),
            ways: HashMap::new(),
            way_by_node_pair: HashMap::new(),
            routes: HashMap::new(),
            agencies: HashMap::new(),
            trips: HashMap::new(),
            services: HashMap::new(),
            stop_times: HashMap::new(),
        }
    }

    /// Assembles a store from a walk graph and its spatial index, before
    /// any GTFS entities are merged in. Used by [`crate::streets`].
    #[must_use]
    pub(crate) fn from_parts(graph: DiGraph<GraphNode, GraphEdge>, rtree: RTree<IndexedPoint>) -> Self {
        Self {
            graph,
            rtree,
            ways: HashMap::new(),
            way_by_node_pair: HashMap::new(),
            routes: HashMap::new(),
            agencies: HashMap::new(),
            trips: HashMap::new(),
            services: HashMap::new(),
            stop_times: HashMap::new(),
        }
    }

    pub(crate) fn rtree_ref(&self) -> &RTree<IndexedPoint> {
        &self.rtree
    }

    pub(crate) fn rebuild_rtree(&mut self) {
        self.rtree = crate::connectors::build_rtree(&self.graph);
    }

    pub(crate) fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        self.graph.add_node(node)
    }

    pub(crate) fn add_edge(&mut self, source: NodeIndex, target: NodeIndex, edge: GraphEdge) -> EdgeIndex {
        self.graph.add_edge(source, target, edge)
    }

    /// Registers a [`Way`] and indexes every consecutive node pair it
    /// covers, so [`Self::way_between`] is O(1) instead of a scan.
    pub(crate) fn insert_way(&mut self, way: Way) {
        for pair in way.nodes.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            self.way_by_node_pair.entry((a, b)).or_insert(way.id);
            self.way_by_node_pair.entry((b, a)).or_insert(way.id);
        }
        self.ways.insert(way.id, way);
    }

    pub(crate) fn insert_route(&mut self, route: Route) {
        self.routes.insert(route.id, route);
    }

    pub(crate) fn insert_agency(&mut self, agency: Agency) {
        self.agencies.insert(agency.id, agency);
    }

    pub(crate) fn insert_trip(&mut self, trip: Trip) {
        self.trips.insert(trip.id, trip);
    }

    pub(crate) fn insert_service(&mut self, service: Service) {
        self.services.insert(service.id, service);
    }

    /// Records `trip`'s full, sequence-sorted stop-time timeline.
    /// Called once per trip while loading GTFS; consulted afterwards
    /// by [`crate::queries::continue_trip`] and [`crate::queries::find_trip`].
    pub(crate) fn insert_stop_times(&mut self, trip: TripId, mut times: Vec<StopTime>) {
        times.sort_by_key(|st| st.sequence);
        self.stop_times.insert(trip, times);
    }

    pub(crate) fn stop_times(&self) -> &StopTimesByTrip {
        &self.stop_times
    }

    #[must_use]
    pub fn way(&self, id: WayId) -> Option<&Way> {
        self.ways.get(&id)
    }

    /// The [`Way`] that directly connects `a` and `b`, if any. Backs
    /// the pedestrian transition payload.
    #[must_use]
    pub fn way_between(&self, a: NodeId, b: NodeId) -> Option<WayId> {
        self.way_by_node_pair.get(&(a, b)).copied()
    }

    #[must_use]
    pub fn route(&self, id: RouteId) -> Option<&Route> {
        self.routes.get(&id)
    }

    #[must_use]
    pub fn agency(&self, id: AgencyId) -> Option<&Agency> {
        self.agencies.get(&id)
    }

    #[must_use]
    pub fn trip(&self, id: TripId) -> Option<&Trip> {
        self.trips.get(&id)
    }

    #[must_use]
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.get(&id)
    }

    #[must_use]
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    #[must_use]
    pub fn trips(&self) -> impl Iterator<Item = &Trip> {
        self.trips.values()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.graph.node_weight(id)
    }

    #[must_use]
    pub fn stop_id(&self, node: NodeId) -> Option<StopId> {
        match self.node(node)? {
            GraphNode::Transit(stop) => Some(stop.id),
            GraphNode::Walk(_) => None,
        }
    }

    /// Every node id in the graph, walk and transit alike.
    #[must_use]
    pub fn node_indices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub(crate) fn node_weight_mut(&mut self, node: NodeId) -> Option<&mut GraphNode> {
        self.graph.node_weight_mut(node)
    }

    pub(crate) fn find_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub(crate) fn edge_indices(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub(crate) fn edge_weight(&self, edge: EdgeIndex) -> Option<&GraphEdge> {
        self.graph.edge_weight(edge)
    }

    pub(crate) fn edge_weight_mut(&mut self, edge: EdgeIndex) -> Option<&mut GraphEdge> {
        self.graph.edge_weight_mut(edge)
    }

    /// `node`'s outgoing edges — used to check for an existing transfer
    /// edge before adding another one.
    pub(crate) fn edges(&self, node: NodeId) -> impl Iterator<Item = EdgeReference<'_, GraphEdge>> + '_ {
        self.graph.edges(node)
    }

    pub(crate) fn edges_directed(&self, node: NodeId, direction: Direction) -> impl Iterator<Item = EdgeReference<'_, GraphEdge>> + '_ {
        self.graph.edges_directed(node, direction)
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
