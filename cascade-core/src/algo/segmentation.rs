//! Path Segmentation: groups a flat trace path into `Piece`s sharing a
//! "travel context" — the `Way` being walked or the transit `Stop`
//! being ridden toward — so [`crate::directions`] can turn traces into
//! steps without re-deriving context boundaries itself.

use std::rc::Rc;

use crate::algo::dijkstra::Trace;
use crate::entities::{StopId, WayId};
use crate::router::TransitionPayload;

/// The travel context a trace's incoming hop belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Way(WayId),
    Stop(StopId),
    /// The seed trace of the path: no incoming hop, hence no context.
    /// A dedicated sentinel rather than silently adopting whatever the
    /// second trace resolves to, so the first piece never accidentally
    /// merges with the second when both happen to land on the same
    /// `Way` by coincidence.
    None,
}

/// A maximal run of consecutive traces sharing one [`Context`].
#[derive(Debug, Clone)]
pub struct Piece {
    pub context: Context,
    pub traces: Vec<Rc<Trace>>,
}

/// Splits `path` into [`Piece`]s. `Walk(Some(way))` traces contribute
/// `Context::Way(way)`; `Walk(None)` traces (a transfer edge with no
/// covering way) carry forward the previous piece's context; `Board`
/// traces start a new `Context::Stop` piece keyed on the destination
/// stop reached by that hop.
#[must_use]
pub fn partition(path: &[Rc<Trace>]) -> Vec<Piece> {
    let mut pieces: Vec<Piece> = Vec::new();

    for trace in path {
        let context = context_of(trace, pieces.last().map(|p| p.context));

        match pieces.last_mut() {
            Some(piece) if piece.context == context => piece.traces.push(Rc::clone(trace)),
            _ => pieces.push(Piece {
                context,
                traces: vec![Rc::clone(trace)],
            }),
        }
    }

    pieces
}

fn context_of(trace: &Trace, carried: Option<Context>) -> Context {
    match &trace.payload {
        None => Context::None,
        Some(TransitionPayload::Walk(Some(way))) => Context::Way(*way),
        Some(TransitionPayload::Walk(None)) => carried.unwrap_or(Context::None),
        Some(TransitionPayload::Board { .. }) => {
            trace_stop(trace).map_or(Context::None, Context::Stop)
        }
    }
}

fn trace_stop(trace: &Trace) -> Option<StopId> {
    match &trace.payload {
        Some(TransitionPayload::Board { alighted, .. }) => Some(alighted.stop),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NodeId, StopTime, TripId};
    use petgraph::graph::NodeIndex;

    fn node(i: u32) -> NodeId {
        NodeIndex::new(i as usize)
    }

    fn walk_trace(n: u32, way: Option<WayId>, predecessor: Option<Rc<Trace>>) -> Rc<Trace> {
        Rc::new(Trace::new(node(n), n, Some(TransitionPayload::Walk(way)), predecessor))
    }

    fn seed_trace(n: u32) -> Rc<Trace> {
        Rc::new(Trace::new(node(n), n, None, None))
    }

    #[test]
    fn first_piece_context_is_none_sentinel() {
        let seed = seed_trace(0);
        let pieces = partition(&[seed]);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].context, Context::None);
    }

    #[test]
    fn consecutive_same_way_traces_merge_into_one_piece() {
        let seed = seed_trace(0);
        let a = walk_trace(1, Some(WayId(1)), Some(Rc::clone(&seed)));
        let b = walk_trace(2, Some(WayId(1)), Some(Rc::clone(&a)));
        let c = walk_trace(3, Some(WayId(2)), Some(Rc::clone(&b)));

        let pieces = partition(&[seed, a, b, c]);
        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[1].traces.len(), 2);
        assert_eq!(pieces[1].context, Context::Way(WayId(1)));
        assert_eq!(pieces[2].context, Context::Way(WayId(2)));
    }

    #[test]
    fn walk_none_carries_forward_previous_context() {
        let seed = seed_trace(0);
        let a = walk_trace(1, Some(WayId(1)), Some(Rc::clone(&seed)));
        let transfer = walk_trace(2, None, Some(Rc::clone(&a)));

        let pieces = partition(&[seed, a, transfer]);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[1].context, Context::Way(WayId(1)));
        assert_eq!(pieces[1].traces.len(), 2);
    }

    #[test]
    fn board_starts_a_stop_context_piece() {
        let seed = seed_trace(0);
        let stop = StopId(node(9));
        let board = Rc::new(Trace::new(
            node(9),
            10,
            Some(TransitionPayload::Board {
                boarded: StopTime {
                    trip: TripId(1),
                    stop: StopId(node(5)),
                    arrival_time: 0,
                    departure_time: 5,
                    sequence: 0,
                },
                alighted: StopTime {
                    trip: TripId(1),
                    stop,
                    arrival_time: 10,
                    departure_time: 10,
                    sequence: 1,
                },
                wait: 5,
            }),
            Some(Rc::clone(&seed)),
        ));

        let pieces = partition(&[seed, board]);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[1].context, Context::Stop(stop));
    }
}
