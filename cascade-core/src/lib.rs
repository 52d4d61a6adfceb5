/*!
# cascade_core

A library for time-dependent multimodal trip planning: pedestrian
routing over an OpenStreetMap street network, fused with scheduled
transit from a GTFS feed, queried with a time-dependent Dijkstra search
whose edge costs depend on the absolute time a traveler reaches them.

Core logic is implemented in pure Rust: the street graph, the GTFS
timetable, and the spatial index are built once ([`streets`],
[`loaders`]) into a single [`graph::GraphStore`], then queried many
times ([`algo::dijkstra`]) without re-parsing any input.

## OSM pbf files with street network can be prepared with [`osmium`](https://osmcode.org/osmium-tool/)

### clip data by boundary

```bash
osmium extract --polygon=/border.geojson /source_file.pbf -o /target_file.pbf
```

### extract highways only

```bash
osmium tags-filter -o highways.osm.pbf input.pbf w/highway
```

# Example
```ignore
use cascade_core::prelude::*;
use geo::Point;
use chrono::NaiveDate;

let graph = streets::build_walk_graph("roads.pbf")?;
let graph = loaders::load_gtfs(graph, "files/Saint_Petersburg")?;
let source = SnappedPoint::init(Point::new(30.320234, 59.875912), &graph)?;
let target = SnappedPoint::init(Point::new(30.309416, 60.066852), &graph)?;

let active_trips = queries::day_trips(&graph, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
let router = Router::Composite { store: &graph, active_trips };
let path = algo::dijkstra::shortest_path(router, source.index(), target.index(), 43_200);
```
*/

use petgraph::graph::NodeIndex;
use thiserror::Error;

pub mod algo;
pub mod connectors;
pub mod cost;
pub mod directions;
pub mod entities;
pub mod geo_utils;
pub mod graph;
pub mod loaders;
pub mod prelude;
pub mod queries;
pub mod router;
pub mod streets;

/// Average pedestrian walking speed, in meters per second, used to
/// convert snapped-point and way-edge distances into seconds.
pub const WALK_SPEED: f64 = 1.4;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to cast column: {0}")]
    CastError(String),
    #[error("Numeric cast error: {0}")]
    CastErrorNumeric(#[from] std::num::TryFromIntError),
    #[error("Numeric parse error: {0}")]
    ParseError(#[from] std::num::ParseIntError),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    #[error("Hashmap does not contain key: {0:?}")]
    MissingKey(NodeIndex),
    #[error("Missing value in column: {0}")]
    MissingValue(String),
    #[error("Negative weight detected: {0}")]
    NegativeWeight(String),
    #[error("Node not found for id: {0}")]
    NodeNotFound(String),
    #[error("Polars error: {0}")]
    PolarsError(#[from] polars::prelude::PolarsError),
    #[error("Thread panicked: {0}")]
    ThreadPanicError(String),
    /// A structural invariant of the graph store was violated —
    /// for example, a `StopId` whose node is not a `GraphNode::Transit`.
    #[error("Graph invariant violated: {0}")]
    GraphInvariant(String),
    /// A caller-supplied argument failed validation before any graph
    /// work began (e.g. a departure time or coordinate out of range).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<Error> for polars::prelude::PolarsError {
    fn from(err: Error) -> Self {
        match err {
            Error::PolarsError(e) => e,
            other => Self::ComputeError(other.to_string().into()),
        }
    }
}
