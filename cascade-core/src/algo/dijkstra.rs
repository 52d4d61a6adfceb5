//! Time-dependent Dijkstra: the delay crossing an edge is calculated
//! from the current time, via [`crate::router::Router::successors`],
//! rather than a fixed edge weight. Matches the classic algorithm
//! otherwise: no decrease-key, stale heap entries discarded on pop.

use std::collections::BinaryHeap;
use std::rc::Rc;

use ahash::{HashSet, HashSetExt};

use crate::algo::MinScored;
use crate::entities::NodeId;
use crate::router::{Router, RouterState, TransitionPayload};

/// One settled (or pending) point in a time-dependent shortest path:
/// which node, at what absolute time, and how the traveler got there.
///
/// `predecessor` is a shared handle rather than an owned link, so
/// pushing a trace onto the heap multiple times (as stale entries
/// accumulate before being discarded on pop) is an O(1) clone.
#[derive(Debug)]
pub struct Trace {
    pub node: NodeId,
    pub time: u32,
    pub payload: Option<TransitionPayload>,
    predecessor: Option<Rc<Trace>>,
}

impl Trace {
    #[must_use]
    pub fn predecessor(&self) -> Option<&Rc<Trace>> {
        self.predecessor.as_ref()
    }

    /// Builds a trace directly. Visible crate-wide so tests in sibling
    /// modules (e.g. [`crate::algo::segmentation`]) can construct
    /// fixtures without going through a full traversal.
    #[must_use]
    pub(crate) fn new(
        node: NodeId,
        time: u32,
        payload: Option<TransitionPayload>,
        predecessor: Option<Rc<Trace>>,
    ) -> Self {
        Self {
            node,
            time,
            payload,
            predecessor,
        }
    }
}

impl PartialEq for Trace {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.time == other.time
    }
}

impl Eq for Trace {}

/// A pull-driven, cancellation-safe time-dependent Dijkstra traversal.
/// Owns the heap and the settled-set, so dropping the iterator before
/// exhausting it (the caller found what it needed, or gave up) frees
/// both immediately — no separate cleanup step.
pub struct DijkstraTraversal<'g> {
    router: Router<'g>,
    heap: BinaryHeap<MinScored<Rc<Trace>>>,
    settled: HashSet<NodeId>,
}

impl<'g> DijkstraTraversal<'g> {
    #[must_use]
    pub fn new(router: Router<'g>, start: NodeId, start_time: u32) -> Self {
        let seed = Rc::new(Trace {
            node: start,
            time: start_time,
            payload: None,
            predecessor: None,
        });
        let mut heap = BinaryHeap::new();
        heap.push(MinScored(f64::from(start_time), seed));
        Self {
            router,
            heap,
            settled: HashSet::new(),
        }
    }
}

impl Iterator for DijkstraTraversal<'_> {
    type Item = Rc<Trace>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(MinScored(_, trace)) = self.heap.pop() {
            if self.settled.contains(&trace.node) {
                continue;
            }
            self.settled.insert(trace.node);

            let state = RouterState {
                node: trace.node,
                time: trace.time,
            };

            for transition in self.router.successors(state) {
                if self.settled.contains(&transition.dst) {
                    continue;
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let next_time = trace.time + transition.cost as u32;
                let next_trace = Rc::new(Trace {
                    node: transition.dst,
                    time: next_time,
                    payload: Some(transition.payload),
                    predecessor: Some(Rc::clone(&trace)),
                });
                self.heap.push(MinScored(f64::from(next_time), next_trace));
            }

            return Some(trace);
        }
        None
    }
}

/// Finds the shortest time-dependent path from `src` to `dst`,
/// departing at `departure`. Returns the traces in forward order
/// (`src` first, `dst` last); `None` if `dst` is unreachable.
///
/// `src == dst` is the degenerate case: a single-trace path with no
/// payload, handled before the traversal starts.
#[must_use]
pub fn shortest_path(router: Router, src: NodeId, dst: NodeId, departure: u32) -> Option<Vec<Rc<Trace>>> {
    if src == dst {
        return Some(vec![Rc::new(Trace {
            node: src,
            time: departure,
            payload: None,
            predecessor: None,
        })]);
    }

    DijkstraTraversal::new(router, src, departure)
        .find(|trace| trace.node == dst)
        .map(reconstruct)
}

fn reconstruct(target: Rc<Trace>) -> Vec<Rc<Trace>> {
    let mut out = Vec::new();
    let mut current = Some(target);
    while let Some(trace) = current {
        current = trace.predecessor.clone();
        out.push(trace);
    }
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Node as NodeEntity;
    use crate::graph::{GraphEdge, GraphNode, GraphStore, WalkEdge};
    use geo::Point;

    /// Builds the graph with edges `{1-2:7,1-3:9,1-6:14,2-3:10,2-4:15,
    /// 3-4:11,3-6:2,4-5:6,5-6:9}` (1-indexed in the textbook figure;
    /// 0-indexed node handles here), returning handles `[n1..n6]`.
    fn rosetta_graph() -> (GraphStore, Vec<NodeId>) {
        let mut store = GraphStore::new();
        let nodes: Vec<NodeId> = (0..6)
            .map(|i| {
                store.add_node(GraphNode::Walk(NodeEntity {
                    location: Point::new(f64::from(i), 0.0),
                }))
            })
            .collect();

        let mut edge = |a: usize, b: usize, weight: f64| {
            let edge = GraphEdge::Walk(WalkEdge { edge_weight: weight });
            store.add_edge(nodes[a], nodes[b], edge.clone());
            store.add_edge(nodes[b], nodes[a], edge);
        };

        edge(0, 1, 7.0);
        edge(0, 2, 9.0);
        edge(0, 5, 14.0);
        edge(1, 2, 10.0);
        edge(1, 3, 15.0);
        edge(2, 3, 11.0);
        edge(2, 5, 2.0);
        edge(3, 4, 6.0);
        edge(4, 5, 9.0);

        (store, nodes)
    }

    #[test]
    fn rosetta_graph_shortest_path_is_1_3_4_5_cost_26() {
        let (store, nodes) = rosetta_graph();
        let router = Router::Pedestrian { store: &store };

        let path = shortest_path(router, nodes[0], nodes[4], 0).expect("path exists");
        let visited: Vec<NodeId> = path.iter().map(|t| t.node).collect();
        assert_eq!(visited, vec![nodes[0], nodes[2], nodes[3], nodes[4]]);
        assert_eq!(path.last().unwrap().time, 26);
    }

    #[test]
    fn emitted_traces_have_monotonically_nondecreasing_time() {
        let (store, nodes) = rosetta_graph();
        let router = Router::Pedestrian { store: &store };
        let traversal = DijkstraTraversal::new(router, nodes[0], 0);

        let mut last_time = 0;
        for trace in traversal {
            assert!(trace.time >= last_time, "time went backwards at {:?}", trace.node);
            last_time = trace.time;
        }
    }

    #[test]
    fn source_equals_target_yields_single_trace_with_no_payload() {
        let (store, nodes) = rosetta_graph();
        let router = Router::Pedestrian { store: &store };

        let path = shortest_path(router, nodes[0], nodes[0], 100).unwrap();
        assert_eq!(path.len(), 1);
        assert_eq!(path[0].node, nodes[0]);
        assert_eq!(path[0].time, 100);
        assert!(path[0].payload.is_none());
    }

    #[test]
    fn disconnected_components_yield_no_route() {
        let mut store = GraphStore::new();
        let a = store.add_node(GraphNode::Walk(NodeEntity {
            location: Point::new(0.0, 0.0),
        }));
        let b = store.add_node(GraphNode::Walk(NodeEntity {
            location: Point::new(100.0, 100.0),
        }));

        let router = Router::Pedestrian { store: &store };
        assert!(shortest_path(router, a, b, 0).is_none());
    }
}
