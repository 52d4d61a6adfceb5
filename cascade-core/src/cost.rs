//! Transit Cost Model: cost is a pure function of the current absolute
//! time, never of elapsed travel time — the same invariant the
//! teacher's `GraphEdge::calculate_delay`/`calculate_itinerary` encode,
//! generalized here to return the richer [`TransitionPayload`] the
//! directions builder needs, instead of a bare `f64`.

use ahash::HashSet;

use crate::entities::{StopId, TripId};
use crate::graph::GraphStore;
use crate::queries::{self, StopTimesByTrip};
use crate::router::TransitionPayload;

/// The cost (seconds) and payload of walking a precomputed edge
/// weight. Walking cost never depends on the time of day, so this is
/// a pass-through — kept as a named type so the router's dispatch
/// reads symmetrically with [`TransitCost`].
pub struct WalkCost;

impl WalkCost {
    #[must_use]
    pub const fn seconds(edge_weight: f64) -> f64 {
        edge_weight
    }
}

/// Wraps [`queries::find_trip`]'s binary search over sorted departures,
/// translating the matched trip into a cost plus the `Board` payload
/// the directions builder will eventually need, so it never has to
/// re-derive which trip was boarded from a bare cost number.
pub struct TransitCost;

impl TransitCost {
    /// `None` when no active trip departs from `src_stop` after `now`
    /// — the router interprets this as "no transit successor", not an
    /// error, and falls back to the stop's walking transitions.
    #[must_use]
    pub fn evaluate(
        store: &GraphStore,
        stop_times: &StopTimesByTrip,
        src_stop: StopId,
        dst_stop: StopId,
        now: u32,
        active_trips: &HashSet<TripId>,
    ) -> Option<(f64, TransitionPayload)> {
        let (boarded, alighted) = queries::find_trip(store, stop_times, src_stop, dst_stop, now, active_trips)?;
        let cost = f64::from(alighted.arrival_time.saturating_sub(now));
        let wait = boarded.departure_time.saturating_sub(now);
        Some((cost, TransitionPayload::Board { boarded, alighted, wait }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::StopTime;
    use ahash::{HashMap, HashMapExt, HashSetExt};
    use petgraph::graph::NodeIndex;

    fn stop(i: u32) -> StopId {
        StopId(NodeIndex::new(i as usize))
    }

    #[test]
    fn walk_cost_passes_edge_weight_through() {
        assert!((WalkCost::seconds(42.0) - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn transit_cost_none_when_no_active_trip() {
        let store = GraphStore::new();
        let stop_times: StopTimesByTrip = HashMap::new();
        let active = HashSet::new();

        assert!(TransitCost::evaluate(&store, &stop_times, stop(0), stop(1), 0, &active).is_none());
    }

    #[test]
    fn transit_cost_reports_wait_and_ride_duration() {
        let mut store = GraphStore::new();
        let src = NodeIndex::new(0);
        let dst = NodeIndex::new(1);
        store.add_node(crate::graph::GraphNode::Transit(crate::entities::Stop {
            id: stop(0),
            location: geo::Point::new(0.0, 0.0),
            name: "A".into(),
        }));
        store.add_node(crate::graph::GraphNode::Transit(crate::entities::Stop {
            id: stop(1),
            location: geo::Point::new(0.0, 0.0),
            name: "B".into(),
        }));
        store.add_edge(
            src,
            dst,
            crate::graph::GraphEdge::Transit(crate::graph::TransitEdge {
                edge_trips: vec![crate::graph::ScheduledTrip::new(TripId(1), 100, 180)],
            }),
        );

        let mut stop_times: StopTimesByTrip = HashMap::new();
        stop_times.insert(
            TripId(1),
            vec![
                StopTime {
                    trip: TripId(1),
                    stop: stop(0),
                    arrival_time: 100,
                    departure_time: 100,
                    sequence: 0,
                },
                StopTime {
                    trip: TripId(1),
                    stop: stop(1),
                    arrival_time: 180,
                    departure_time: 180,
                    sequence: 1,
                },
            ],
        );

        let mut active = HashSet::new();
        active.insert(TripId(1));

        let (cost, payload) = TransitCost::evaluate(&store, &stop_times, stop(0), stop(1), 60, &active).unwrap();
        assert!((cost - 120.0).abs() < f64::EPSILON);
        match payload {
            TransitionPayload::Board { wait, .. } => assert_eq!(wait, 40),
            TransitionPayload::Walk(_) => panic!("expected Board payload"),
        }
    }
}
