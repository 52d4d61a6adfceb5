//! End-to-end coverage of the GTFS half of the pipeline: load a small
//! synthetic feed, route across it with a time-dependent search, and
//! turn the result into a directions response — all through the
//! crate's public surface, the way an embedding application would.
//!
//! The pedestrian half ([`cascade_core::streets::build_walk_graph`])
//! needs a real `.pbf` extract and is exercised by unit tests inside
//! `streets.rs` instead, since authoring a binary PBF fixture by hand
//! would not meaningfully differ from those unit tests.

use std::path::PathBuf;

use cascade_core::loaders;
use cascade_core::prelude::*;
use chrono::NaiveDate;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/mini_gtfs")
}

fn stop_named(store: &GraphStore, name: &str) -> NodeId {
    store
        .node_indices()
        .find(|&id| matches!(store.node(id), Some(GraphNode::Transit(stop)) if stop.name == name))
        .unwrap_or_else(|| panic!("fixture is missing stop {name:?}"))
}

#[test]
fn day_trips_respects_the_calendar_window() {
    let store = GraphStore::new();
    let store = loaders::load_gtfs(store, fixture_path()).expect("fixture should load");

    // 2024-06-03 is a Monday within the WD service's date range.
    let monday = queries::day_trips(&store, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    assert_eq!(monday.len(), 1);

    // 2024-06-02 is a Sunday, and WD does not run on Sundays.
    let sunday = queries::day_trips(&store, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    assert!(sunday.is_empty());

    // 2025-01-01 falls outside the calendar's date range entirely.
    let out_of_range = queries::day_trips(&store, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    assert!(out_of_range.is_empty());
}

#[test]
fn transit_router_rides_through_an_intermediate_stop() {
    let store = GraphStore::new();
    let store = loaders::load_gtfs(store, fixture_path()).expect("fixture should load");

    let first = stop_named(&store, "First");
    let third = stop_named(&store, "Third");

    let active_trips = queries::day_trips(&store, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    let router = Router::Transit {
        store: &store,
        active_trips,
    };

    // Departs 50s before the trip's scheduled departure (100s past
    // midnight); the first hop should report a 50s wait.
    let path = shortest_path(router, first, third, 50).expect("a scheduled trip connects First to Third");
    let visited: Vec<NodeId> = path.iter().map(|t| t.node).collect();
    assert_eq!(visited, vec![first, stop_named(&store, "Second"), third]);
    assert_eq!(path.last().unwrap().time, 220);

    match &path[1].payload {
        Some(TransitionPayload::Board { wait, .. }) => assert_eq!(*wait, 50),
        other => panic!("expected a Board payload on the first hop, got {other:?}"),
    }
}

#[test]
fn no_service_on_the_query_date_yields_no_route() {
    let store = GraphStore::new();
    let store = loaders::load_gtfs(store, fixture_path()).expect("fixture should load");

    let first = stop_named(&store, "First");
    let third = stop_named(&store, "Third");

    let active_trips = queries::day_trips(&store, NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
    let router = Router::Transit {
        store: &store,
        active_trips,
    };

    assert!(shortest_path(router, first, third, 50).is_none());
}

#[test]
fn directions_builder_emits_a_piece_per_stop_on_the_ride() {
    let store = GraphStore::new();
    let store = loaders::load_gtfs(store, fixture_path()).expect("fixture should load");

    let first = stop_named(&store, "First");
    let third = stop_named(&store, "Third");
    let active_trips = queries::day_trips(&store, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
    let router = Router::Transit {
        store: &store,
        active_trips,
    };
    let path = shortest_path(router, first, third, 50).expect("a scheduled trip connects First to Third");

    // Each intermediate stop on the trip is its own piece (it is its
    // own `Board` hop onto the same physical ride), so the three-stop
    // trip yields depart -> continue (at Second) -> arrive (at Third).
    let directions = cascade_core::directions::build(&store, &path, 0);
    assert_eq!(directions.route.steps.len(), 3);
    assert_eq!(directions.route.steps[0].maneuver.kind, "depart");
    assert_eq!(directions.route.steps[1].maneuver.kind, "continue");
    assert_eq!(directions.route.steps[1].mode, "transit");
    assert_eq!(directions.route.steps[2].maneuver.kind, "arrive");
    assert_eq!(directions.route.steps[2].mode, "transit");
    assert_eq!(directions.route.duration, 170.0);
}
