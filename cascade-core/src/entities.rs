//! Typed entities backing the graph store.
//!
//! `cascade_core` does not implement a generic, runtime-typed
//! entity/attribute/value store. Instead every attribute named in the
//! data model is a field on one of the structs below, and the indexes
//! a real EAV store would maintain (`by_unique`, `range`) are concrete
//! [`std::collections::HashMap`]s and the [`rstar::RTree`] owned by
//! [`crate::graph::GraphStore`].

use chrono::{Datelike, NaiveDate, Weekday};
use geo::Point;
use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Identifies a walk node or a transit stop in the underlying
/// `petgraph` graph. Both kinds of node live in the same index space;
/// [`crate::graph::GraphNode`] tags which one a given id refers to.
pub type NodeId = NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WayId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopId(pub NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TripId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RouteId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgencyId(pub u32);

/// A road intersection. Location is the only attribute carried on the
/// node itself; successors are derived by [`crate::queries::node_successors`]
/// rather than stored inline, per the data model's "successors is
/// bidirectional in meaning" note.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub location: Point<f64>,
}

/// A contiguous OSM way. `nodes` is the ordered list of nodes it
/// threads through; `name` gives the street context surfaced on
/// walking steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: WayId,
    pub name: Option<String>,
    pub nodes: Vec<NodeId>,
}

/// A GTFS boarding location.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,
    pub location: Point<f64>,
    pub name: String,
}

/// One scheduled traversal of a sequence of stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    pub route: RouteId,
    pub service: ServiceId,
}

/// Calendar metadata: the dates and days of week a [`Trip`] runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub id: ServiceId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Indexed `[Mon, Tue, Wed, Thu, Fri, Sat, Sun]`, matching
    /// `chrono::Weekday::num_days_from_monday`.
    pub days: [bool; 7],
}

impl Service {
    /// A trip on this service runs on `date` iff `date` falls within
    /// the calendar's (inclusive) date range and its weekday is
    /// enabled. See DESIGN.md for why this is inclusive rather than
    /// the strict `<`/`>` spec.md's prose literally used.
    #[must_use]
    pub fn active_on(&self, date: NaiveDate) -> bool {
        if date < self.start_date || date > self.end_date {
            return false;
        }
        self.days[weekday_index(date.weekday())]
    }
}

#[must_use]
fn weekday_index(day: Weekday) -> usize {
    day.num_days_from_monday() as usize
}

/// The arrival/departure of one trip at one stop in its sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTime {
    pub trip: TripId,
    pub stop: StopId,
    /// Seconds since local midnight; may exceed 86400 for
    /// post-midnight service, per GTFS convention.
    pub arrival_time: u32,
    pub departure_time: u32,
    pub sequence: u32,
}

/// Metadata-only route record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub id: RouteId,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub agency: Option<AgencyId>,
}

/// Metadata-only agency record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agency {
    pub id: AgencyId,
    pub name: String,
}
