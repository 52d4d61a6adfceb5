//! Directions Builder: turns a segmented path into a MapBox
//! Directions-v5-shaped response — `uuid`, `waypoints`, `distance`,
//! `duration`, and a `steps` array with maneuvers, bearings, and
//! modifiers — so a caller can `serde_json::to_string` the result
//! directly.

use std::rc::Rc;

use geo::{Coord, LineString, Point};
use serde::Serialize;
use uuid::Uuid;

use crate::algo::dijkstra::Trace;
use crate::algo::segmentation::{partition, Context, Piece};
use crate::entities::TripId;
use crate::geo_utils;
use crate::graph::{GraphNode, GraphStore};
use crate::router::TransitionPayload;

#[derive(Debug, Clone, Serialize)]
pub struct Waypoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: [f64; 2],
}

#[derive(Debug, Clone, Serialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Maneuver {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub bearing_before: f64,
    pub bearing_after: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripRef {
    pub id: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub mode: &'static str,
    pub distance: f64,
    pub geometry: Geometry,
    pub maneuver: Maneuver,
    pub arrive: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub distance: f64,
    pub duration: f64,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Directions {
    pub uuid: Uuid,
    pub waypoints: Vec<Waypoint>,
    #[serde(flatten)]
    pub route: Route,
}

/// `0→straight, 20→slight right, 60→right, 120→sharp right, 160→uturn,
/// 180→straight, -20→sharp left, -60→left, -120→slight left,
/// -180→straight` — the largest key ≤ `angle` wins.
fn classify_modifier(angle: f64) -> &'static str {
    if angle >= 180.0 {
        "straight"
    } else if angle >= 160.0 {
        "uturn"
    } else if angle >= 120.0 {
        "sharp right"
    } else if angle >= 60.0 {
        "right"
    } else if angle >= 20.0 {
        "slight right"
    } else if angle >= 0.0 {
        "straight"
    } else if angle >= -20.0 {
        "sharp left"
    } else if angle >= -60.0 {
        "left"
    } else if angle >= -120.0 {
        "slight left"
    } else {
        "straight"
    }
}

fn classify_maneuver(
    is_first: bool,
    is_last: bool,
    prev: Option<Context>,
    current: Context,
    next: Option<Context>,
) -> &'static str {
    if is_first {
        "depart"
    } else if is_last {
        "arrive"
    } else if matches!(prev, Some(Context::Way(_))) && matches!(current, Context::Stop(_)) {
        "notification"
    } else if matches!(current, Context::Stop(_)) && matches!(next, Some(Context::Stop(_))) {
        "continue"
    } else if matches!(current, Context::Stop(_)) && matches!(next, Some(Context::Way(_))) {
        "exit vehicle"
    } else {
        "turn"
    }
}

fn location_of(store: &GraphStore, trace: &Trace) -> [f64; 2] {
    let point = store
        .node(trace.node)
        .map_or(Point::new(0.0, 0.0), |n| *n.geometry());
    [point.x(), point.y()]
}

fn point_of(location: [f64; 2]) -> Point<f64> {
    Point::new(location[0], location[1])
}

fn line_string_of(coords: &[[f64; 2]]) -> LineString<f64> {
    LineString(coords.iter().map(|c| Coord { x: c[0], y: c[1] }).collect())
}

fn trip_of(trace: &Rc<Trace>) -> Option<TripId> {
    match &trace.payload {
        Some(TransitionPayload::Board { boarded, .. }) => Some(boarded.trip),
        _ => None,
    }
}

fn context_name(store: &GraphStore, context: Context) -> Option<String> {
    match context {
        Context::Way(way) => store.way(way).and_then(|w| w.name.clone()),
        Context::Stop(stop) => store.node(stop.0).and_then(GraphNode::as_stop).map(|s| s.name.clone()),
        Context::None => None,
    }
}

fn build_step(store: &GraphStore, pieces: &[Piece], index: usize, zone_midnight_epoch: i64) -> Step {
    let piece = &pieces[index];
    let is_first = index == 0;
    let is_last = index == pieces.len() - 1;
    let prev_context = (!is_first).then(|| pieces[index - 1].context);
    let next_context = (!is_last).then(|| pieces[index + 1].context);

    let maneuver_type = classify_maneuver(is_first, is_last, prev_context, piece.context, next_context);

    let prev_point = if is_first {
        location_of(store, &piece.traces[0])
    } else {
        location_of(store, &pieces[index - 1].traces[0])
    };
    let piece_point = location_of(store, &piece.traces[0]);
    let next_point = if is_last {
        location_of(store, piece.traces.last().expect("piece is never empty"))
    } else {
        location_of(store, &pieces[index + 1].traces[0])
    };

    let bearing_before = geo_utils::bearing(point_of(prev_point), point_of(piece_point));
    let bearing_after = geo_utils::bearing(point_of(piece_point), point_of(next_point));
    let modifier =
        (maneuver_type == "turn").then(|| classify_modifier(geo_utils::normalize_angle(bearing_before, bearing_after)));

    let mode = if matches!(piece.context, Context::Stop(_)) {
        "transit"
    } else {
        "walking"
    };

    let mut coordinates: Vec<[f64; 2]> = piece.traces.iter().map(|t| location_of(store, t)).collect();
    coordinates.push(next_point);
    let distance = geo_utils::arc_length(&line_string_of(&coordinates));

    let arrive = zone_midnight_epoch + i64::from(piece.traces.last().expect("piece is never empty").time);
    let name = context_name(store, piece.context);

    let wait = (maneuver_type == "notification")
        .then(|| {
            pieces.get(index + 1).and_then(|next| {
                next.traces.first().and_then(|t| match &t.payload {
                    Some(TransitionPayload::Board { wait, .. }) => Some(*wait),
                    _ => None,
                })
            })
        })
        .flatten();

    let trip = (mode == "transit")
        .then(|| {
            piece
                .traces
                .iter()
                .find_map(trip_of)
                .or_else(|| pieces.get(index + 1).and_then(|next| next.traces.iter().find_map(trip_of)))
        })
        .flatten()
        .map(|id| TripRef { id: id.0 });

    Step {
        mode,
        distance,
        geometry: Geometry {
            kind: "LineString",
            coordinates,
        },
        maneuver: Maneuver {
            kind: maneuver_type,
            bearing_before,
            bearing_after,
            modifier,
        },
        arrive,
        name,
        wait,
        trip,
    }
}

/// Builds the [`Directions`] response for a settled path, per §4.7 of
/// the data model. `zone_midnight_epoch` is the epoch timestamp of
/// local midnight on the query's travel date — every `StopTime`/`Trace`
/// carries seconds-since-midnight, so this is what turns those into
/// wall-clock `arrive` timestamps.
///
/// The degenerate single-trace path (`src == dst`) returns
/// `distance: 0, duration: 0, steps: []` without running segmentation.
#[must_use]
pub fn build(store: &GraphStore, path: &[Rc<Trace>], zone_midnight_epoch: i64) -> Directions {
    let Some(first) = path.first() else {
        return Directions {
            uuid: Uuid::new_v4(),
            waypoints: vec![],
            route: Route {
                distance: 0.0,
                duration: 0.0,
                steps: vec![],
            },
        };
    };

    if path.len() == 1 {
        let location = location_of(store, first);
        return Directions {
            uuid: Uuid::new_v4(),
            waypoints: vec![
                Waypoint { name: None, location },
                Waypoint { name: None, location },
            ],
            route: Route {
                distance: 0.0,
                duration: 0.0,
                steps: vec![],
            },
        };
    }

    let pieces = partition(path);
    let steps: Vec<Step> = (0..pieces.len())
        .map(|i| build_step(store, &pieces, i, zone_midnight_epoch))
        .collect();

    let full_coords: Vec<[f64; 2]> = path.iter().map(|t| location_of(store, t)).collect();
    let distance = geo_utils::arc_length(&line_string_of(&full_coords));
    let last = path.last().expect("checked non-empty above");
    let duration = f64::from(last.time.saturating_sub(first.time));

    let first_name = pieces.iter().find_map(|p| context_name(store, p.context));
    let last_name = pieces.iter().rev().find_map(|p| context_name(store, p.context));

    Directions {
        uuid: Uuid::new_v4(),
        waypoints: vec![
            Waypoint {
                name: first_name,
                location: location_of(store, first),
            },
            Waypoint {
                name: last_name,
                location: location_of(store, last),
            },
        ],
        route: Route {
            distance,
            duration,
            steps,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::dijkstra::Trace;
    use crate::entities::{Node as NodeEntity, WayId};
    use crate::graph::GraphStore;

    #[test]
    fn degenerate_single_trace_path_has_zero_distance_and_no_steps() {
        let mut store = GraphStore::new();
        let a = store.add_node(GraphNode::Walk(NodeEntity {
            location: Point::new(0.0, 0.0),
        }));
        let path = vec![Rc::new(Trace::new(a, 100, None, None))];

        let directions = build(&store, &path, 0);
        assert_eq!(directions.route.distance, 0.0);
        assert_eq!(directions.route.duration, 0.0);
        assert!(directions.route.steps.is_empty());
    }

    #[test]
    fn modifier_table_covers_every_integer_angle() {
        for angle in -180..=180 {
            let modifier = classify_modifier(f64::from(angle));
            assert!(["straight", "slight right", "right", "sharp right", "uturn", "sharp left", "left", "slight left"]
                .contains(&modifier));
        }
    }

    #[test]
    fn straight_walk_produces_depart_and_arrive_steps() {
        let mut store = GraphStore::new();
        let a = store.add_node(GraphNode::Walk(NodeEntity {
            location: Point::new(0.0, 0.0),
        }));
        let b = store.add_node(GraphNode::Walk(NodeEntity {
            location: Point::new(0.0, 0.01),
        }));
        let way = WayId(1);

        let seed = Rc::new(Trace::new(a, 0, None, None));
        let arrived = Rc::new(Trace::new(
            b,
            10,
            Some(TransitionPayload::Walk(Some(way))),
            Some(Rc::clone(&seed)),
        ));

        let directions = build(&store, &[seed, arrived], 1_000_000);
        assert_eq!(directions.route.steps.len(), 2);
        assert_eq!(directions.route.steps[0].maneuver.kind, "depart");
        assert_eq!(directions.route.steps[1].maneuver.kind, "arrive");
        assert_eq!(directions.route.duration, 10.0);
    }

    fn transit_stop(store: &mut GraphStore, lon: f64, lat: f64, name: &str) -> crate::entities::NodeId {
        let index = store.add_node(GraphNode::Transit(crate::entities::Stop {
            id: crate::entities::StopId(petgraph::graph::NodeIndex::end()),
            location: Point::new(lon, lat),
            name: name.to_string(),
        }));
        if let Some(GraphNode::Transit(stop)) = store.node_weight_mut(index) {
            stop.id = crate::entities::StopId(index);
        }
        index
    }

    fn stop_time(trip: TripId, stop: crate::entities::NodeId, time: u32, sequence: u32) -> crate::entities::StopTime {
        crate::entities::StopTime {
            trip,
            stop: crate::entities::StopId(stop),
            arrival_time: time,
            departure_time: time,
            sequence,
        }
    }

    /// A walk to the stop, a board, a ride through two intermediate
    /// stops, an exit, and a walk away — every [`classify_maneuver`]
    /// outcome in one path: depart, turn, notification, continue,
    /// exit vehicle, arrive.
    ///
    /// The sentinel `Context::None` piece (just the seed trace) is
    /// what actually reports "depart", so the first real walk piece
    /// lands on the default "turn" branch rather than "depart" itself
    /// — hence a single walk leg to the stop, not two.
    #[test]
    fn multimodal_path_walks_every_maneuver_kind() {
        let mut store = GraphStore::new();
        let a = store.add_node(GraphNode::Walk(NodeEntity {
            location: Point::new(0.0, 0.0),
        }));
        let board_stop = transit_stop(&mut store, 0.0, 0.002, "Board");
        let mid1 = transit_stop(&mut store, 0.0, 0.012, "Mid One");
        let mid2 = transit_stop(&mut store, 0.0, 0.022, "Mid Two");
        let exit_stop = transit_stop(&mut store, 0.0, 0.032, "Exit");
        let d = store.add_node(GraphNode::Walk(NodeEntity {
            location: Point::new(0.0, 0.033),
        }));

        let trip = TripId(1);
        let way_to_stop = WayId(1);
        let way_away = WayId(3);

        let seed = Rc::new(Trace::new(a, 0, None, None));
        let depart = Rc::new(Trace::new(
            board_stop,
            10,
            Some(TransitionPayload::Walk(Some(way_to_stop))),
            Some(Rc::clone(&seed)),
        ));
        let board = Rc::new(Trace::new(
            mid1,
            20,
            Some(TransitionPayload::Board {
                boarded: stop_time(trip, board_stop, 10, 0),
                alighted: stop_time(trip, mid1, 20, 1),
                wait: 0,
            }),
            Some(Rc::clone(&depart)),
        ));
        let continue_riding = Rc::new(Trace::new(
            mid2,
            30,
            Some(TransitionPayload::Board {
                boarded: stop_time(trip, mid1, 20, 1),
                alighted: stop_time(trip, mid2, 30, 2),
                wait: 0,
            }),
            Some(Rc::clone(&board)),
        ));
        let exit_vehicle = Rc::new(Trace::new(
            exit_stop,
            40,
            Some(TransitionPayload::Board {
                boarded: stop_time(trip, mid2, 30, 2),
                alighted: stop_time(trip, exit_stop, 40, 3),
                wait: 0,
            }),
            Some(Rc::clone(&continue_riding)),
        ));
        let arrive = Rc::new(Trace::new(
            d,
            45,
            Some(TransitionPayload::Walk(Some(way_away))),
            Some(Rc::clone(&exit_vehicle)),
        ));

        let path = vec![seed, depart, board, continue_riding, exit_vehicle, arrive];
        let directions = build(&store, &path, 0);

        let kinds: Vec<&str> = directions.route.steps.iter().map(|s| s.maneuver.kind).collect();
        assert_eq!(
            kinds,
            vec!["depart", "turn", "notification", "continue", "exit vehicle", "arrive"]
        );
        assert_eq!(directions.route.steps[2].mode, "transit");
        assert_eq!(directions.route.steps[2].wait, Some(0));
        assert_eq!(directions.route.steps[3].mode, "transit");
        assert_eq!(directions.route.steps[4].mode, "transit");
        assert_eq!(directions.route.duration, 45.0);
    }
}
