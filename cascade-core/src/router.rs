//! Router Interface: a polymorphic "traverse from node at time"
//! abstraction over pedestrian-only, transit-only, and composite
//! (the one the Dijkstra engine is actually handed) dispatch.
//!
//! `Composite` inspects the node's kind (`GraphNode::Walk` vs
//! `GraphNode::Transit`) to decide whether transit transitions are
//! even attempted — a tagged `enum`, not a trait object, per the data
//! model's note that duck-typed router dispatch is the wrong shape
//! here.

use ahash::HashSet;
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::cost::{TransitCost, WalkCost};
use crate::entities::{NodeId, StopTime, TripId, WayId};
use crate::graph::{GraphEdge, GraphStore};

/// The router's view of "where and when" — the state a
/// [`crate::algo::dijkstra::DijkstraTraversal`] hands to
/// [`Router::successors`] on every pop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterState {
    pub node: NodeId,
    pub time: u32,
}

/// What riding or walking an edge actually means, carried alongside its
/// cost so [`crate::algo::segmentation`] and [`crate::directions`] never
/// have to re-derive which trip was boarded or which way was walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPayload {
    /// A pedestrian hop, threaded through a [`WayId`] when one covers
    /// the pair (`None` for e.g. a stop-to-anchor-node transfer).
    Walk(Option<WayId>),
    /// A transit ride: the boarding and alighting `StopTime`s, and how
    /// long the traveler waited at the stop before `boarded`'s
    /// departure.
    Board {
        boarded: StopTime,
        alighted: StopTime,
        wait: u32,
    },
}

/// One edge relaxation candidate: move to `dst`, paying `cost` seconds,
/// for the reason described by `payload`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub dst: NodeId,
    pub cost: f64,
    pub payload: TransitionPayload,
}

/// Polymorphic traversal rule, tagged by which edge kinds it is willing
/// to offer as successors.
pub enum Router<'g> {
    /// Walk edges only, ignoring any transit edges present on the node.
    Pedestrian { store: &'g GraphStore },
    /// Transit edges only (still falls back to walking per stop, since
    /// a stop with no upcoming trip must not strand the search).
    Transit {
        store: &'g GraphStore,
        active_trips: HashSet<TripId>,
    },
    /// Both, dispatched per node kind. What [`crate::algo::dijkstra`]
    /// is actually handed.
    Composite {
        store: &'g GraphStore,
        active_trips: HashSet<TripId>,
    },
}

impl<'g> Router<'g> {
    /// Every transition reachable from `state`, in no particular order
    /// — the caller (the Dijkstra heap) imposes the ordering that
    /// matters.
    pub fn successors(&self, state: RouterState) -> Vec<Transition> {
        match self {
            Self::Pedestrian { store } => walk_successors(store, state),
            Self::Transit { store, active_trips } => {
                let mut out = transit_successors(store, active_trips, state);
                out.extend(walk_successors(store, state));
                out
            }
            Self::Composite { store, active_trips } => {
                let mut out = walk_successors(store, state);
                out.extend(transit_successors(store, active_trips, state));
                out
            }
        }
    }
}

/// Walk edges (`Node`-`Node`, `Node`-`Stop`, `Stop`-`Node`): cost is
/// haversine distance over [`WALK_SPEED`], payload threaded through the
/// covering `Way` when one exists.
fn walk_successors(store: &GraphStore, state: RouterState) -> Vec<Transition> {
    if store.node(state.node).is_none() {
        return Vec::new();
    }

    store
        .edges_directed(state.node, Direction::Outgoing)
        .filter_map(|edge| match edge.weight() {
            GraphEdge::Walk(walk) | GraphEdge::Transfer(walk) => {
                let dst = edge.target();
                let way = store.way_between(state.node, dst);
                Some(Transition {
                    dst,
                    cost: WalkCost::seconds(walk.edge_weight),
                    payload: TransitionPayload::Walk(way),
                })
            }
            GraphEdge::Transit(_) => None,
        })
        .collect()
}

/// Transit edges (`Stop`-`Stop`): for every stop reachable from
/// `state.node`, ask [`queries::find_trip`] for the earliest active
/// trip departing after `state.time`.
fn transit_successors(store: &GraphStore, active_trips: &HashSet<TripId>, state: RouterState) -> Vec<Transition> {
    let Some(src_stop) = store.stop_id(state.node) else {
        return Vec::new();
    };

    store
        .edges_directed(state.node, Direction::Outgoing)
        .filter(|edge| edge.weight().is_transit())
        .filter_map(|edge| {
            let dst = edge.target();
            let dst_stop = store.stop_id(dst)?;
            let (cost, payload) =
                TransitCost::evaluate(store, store.stop_times(), src_stop, dst_stop, state.time, active_trips)?;
            Some(Transition { dst, cost, payload })
        })
        .collect()
}
