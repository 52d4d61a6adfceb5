//! GTFS ingestion: reads the standard `agency/routes/calendar/trips/
//! stops/stop_times` text files with `polars`, merges transit stops and
//! scheduled trips into an existing pedestrian [`GraphStore`], and
//! leaves service-day filtering to [`crate::queries::day_trips`] at
//! query time rather than baking one weekday into the load — unlike
//! the single-day-snapshot loader this one is descended from, a
//! `GraphStore` here is built once and queried across many travel
//! dates.

use std::path::{Path, PathBuf};

use ahash::{HashMap, HashMapExt};
use chrono::NaiveDate;
use geo::Point;
use itertools::Itertools;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;

use crate::connectors::connect_stops_to_streets;
use crate::entities::Route as RouteEntity;
use crate::entities::{Agency, AgencyId, RouteId, Service, ServiceId, Stop, StopId, StopTime, Trip, TripId};
use crate::graph::{GraphEdge, GraphNode, GraphStore, ScheduledTrip, TransitEdge};
use crate::Error;

fn read_csv(file_path: PathBuf) -> Result<DataFrame, Error> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        // This will be slow, but protects from wrong schema inference.
        // A `None` (scan-everything) budget made load times noticeably
        // worse on larger feeds without changing the inferred schema.
        .with_infer_schema_length(Some(10000))
        .try_into_reader_with_file_path(Some(file_path))?
        .finish()?;

    Ok(df)
}

fn hhmmss_to_sec(str_val: &Series) -> Series {
    str_val
        .str()
        .unwrap_or_else(|_| panic!("invalid time format for {}. Expected HH:MM:SS", str_val.name()))
        .iter()
        .map(|opt_time: Option<&str>| {
            let time = opt_time.unwrap();
            let parts: Vec<&str> = time.split(':').collect();
            let hours = parts[0].parse::<u32>().unwrap();
            let minutes = parts[1].parse::<u32>().unwrap();
            let seconds = parts[2].parse::<u32>().unwrap();
            Some(hours * 3600 + minutes * 60 + seconds)
        })
        .collect::<UInt32Chunked>()
        .into_series()
}

fn parse_date(raw: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| Error::InvalidData(format!("bad GTFS date: {raw}")))
}

fn str_column_owned(df: &DataFrame, name: &str) -> Result<Vec<String>, Error> {
    Ok(df
        .column(name)?
        .cast(&DataType::String)?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Merges a GTFS feed at `path` into `store`, returning it with every
/// [`Stop`], [`Trip`], [`Service`], [`RouteEntity`], and [`Agency`]
/// registered, and every `stop_times.txt` entry threaded onto the
/// graph as [`TransitEdge`]s plus a per-trip timeline recorded via
/// [`GraphStore::insert_stop_times`].
pub fn load_gtfs(mut store: GraphStore, path: impl AsRef<Path>) -> Result<GraphStore, Error> {
    let gtfs_path = PathBuf::from(path.as_ref());

    let agency_ids = load_agencies(&mut store, &gtfs_path)?;
    let route_ids = load_routes(&mut store, &gtfs_path, &agency_ids)?;
    let service_ids = load_calendar(&mut store, &gtfs_path)?;
    let trip_ids = load_trips(&mut store, &gtfs_path, &route_ids, &service_ids)?;
    log::debug!(
        "loaded {} agencies, {} routes, {} services, {} trips",
        agency_ids.len(),
        route_ids.len(),
        service_ids.len(),
        trip_ids.len()
    );
    let stop_ids = load_stops(&mut store, &gtfs_path)?;
    load_stop_times(&mut store, &gtfs_path, &stop_ids, &trip_ids)?;
    log::info!("merged {} stops into the walk graph", stop_ids.len());

    connect_stops_to_streets(&mut store)?;
    Ok(store)
}

fn load_agencies(store: &mut GraphStore, path: &Path) -> Result<HashMap<String, AgencyId>, Error> {
    let df = read_csv(path.join("agency.txt"))?;
    let ids = str_column_owned(&df, "agency_id").or_else(|_| str_column_owned(&df, "agency_name"))?;
    let names = str_column_owned(&df, "agency_name")?;

    let mut map = HashMap::new();
    for (sequence, raw_id) in ids.iter().enumerate() {
        let id = AgencyId(u32::try_from(sequence).map_err(Error::CastErrorNumeric)?);
        store.insert_agency(Agency {
            id,
            name: names[sequence].clone(),
        });
        map.insert(raw_id.clone(), id);
    }
    Ok(map)
}

fn load_routes(
    store: &mut GraphStore,
    path: &Path,
    agency_ids: &HashMap<String, AgencyId>,
) -> Result<HashMap<String, RouteId>, Error> {
    let df = read_csv(path.join("routes.txt"))?;
    let route_id_col = str_column_owned(&df, "route_id")?;
    let short_names = str_column_owned(&df, "route_short_name").ok();
    let long_names = str_column_owned(&df, "route_long_name").ok();
    let agency_col = str_column_owned(&df, "agency_id").ok();

    let mut map = HashMap::new();
    for (sequence, raw_id) in route_id_col.iter().enumerate() {
        let id = RouteId(u32::try_from(sequence).map_err(Error::CastErrorNumeric)?);
        let short_name = short_names.as_ref().map(|c| c[sequence].clone()).filter(|s| !s.is_empty());
        let long_name = long_names.as_ref().map(|c| c[sequence].clone()).filter(|s| !s.is_empty());
        let agency = agency_col
            .as_ref()
            .and_then(|c| c.get(sequence))
            .and_then(|raw| agency_ids.get(raw).copied());

        store.insert_route(RouteEntity {
            id,
            short_name,
            long_name,
            agency,
        });
        map.insert(raw_id.clone(), id);
    }
    Ok(map)
}

const WEEKDAY_COLUMNS: [&str; 7] = ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];

fn load_calendar(store: &mut GraphStore, path: &Path) -> Result<HashMap<String, ServiceId>, Error> {
    let df = read_csv(path.join("calendar.txt"))?;
    let service_id_col = str_column_owned(&df, "service_id")?;
    let start_dates = str_column_owned(&df, "start_date")?;
    let end_dates = str_column_owned(&df, "end_date")?;

    let day_columns: Vec<Vec<bool>> = WEEKDAY_COLUMNS
        .iter()
        .map(|name| -> Result<Vec<bool>, Error> {
            Ok(df
                .column(name)?
                .cast(&DataType::Int64)?
                .i64()?
                .into_iter()
                .map(|v| v.unwrap_or(0) == 1)
                .collect())
        })
        .collect::<Result<_, _>>()?;

    let mut map = HashMap::new();
    for (sequence, raw_id) in service_id_col.iter().enumerate() {
        let id = ServiceId(u32::try_from(sequence).map_err(Error::CastErrorNumeric)?);
        let mut days = [false; 7];
        for (day_index, column) in day_columns.iter().enumerate() {
            days[day_index] = column.get(sequence).copied().unwrap_or(false);
        }

        store.insert_service(Service {
            id,
            start_date: parse_date(&start_dates[sequence])?,
            end_date: parse_date(&end_dates[sequence])?,
            days,
        });
        map.insert(raw_id.clone(), id);
    }
    Ok(map)
}

fn load_trips(
    store: &mut GraphStore,
    path: &Path,
    route_ids: &HashMap<String, RouteId>,
    service_ids: &HashMap<String, ServiceId>,
) -> Result<HashMap<String, TripId>, Error> {
    let df = read_csv(path.join("trips.txt"))?;
    let trip_id_col = str_column_owned(&df, "trip_id")?;
    let route_id_col = str_column_owned(&df, "route_id")?;
    let service_id_col = str_column_owned(&df, "service_id")?;

    let mut map = HashMap::new();
    for (sequence, raw_trip_id) in trip_id_col.iter().enumerate() {
        let id = TripId(u32::try_from(sequence).map_err(Error::CastErrorNumeric)?);
        let route = *route_ids
            .get(&route_id_col[sequence])
            .ok_or_else(|| Error::NodeNotFound(format!("trip references unknown route {}", route_id_col[sequence])))?;
        let service = *service_ids.get(&service_id_col[sequence]).ok_or_else(|| {
            Error::NodeNotFound(format!("trip references unknown service {}", service_id_col[sequence]))
        })?;

        store.insert_trip(Trip { id, route, service });
        map.insert(raw_trip_id.clone(), id);
    }
    Ok(map)
}

fn load_stops(store: &mut GraphStore, path: &Path) -> Result<HashMap<String, StopId>, Error> {
    let df = read_csv(path.join("stops.txt"))?;
    let stop_id_col = str_column_owned(&df, "stop_id")?;
    let names = str_column_owned(&df, "stop_name")?;
    let lons = df.column("stop_lon")?.f64()?;
    let lats = df.column("stop_lat")?.f64()?;

    let mut map = HashMap::new();
    for (sequence, raw_stop_id) in stop_id_col.iter().enumerate() {
        let lon = lons.get(sequence).ok_or_else(|| Error::MissingValue("stop_lon".to_string()))?;
        let lat = lats.get(sequence).ok_or_else(|| Error::MissingValue("stop_lat".to_string()))?;

        // Placeholder `StopId`, rewritten below once the graph node
        // actually exists — `Stop::id` must equal the node's own
        // `StopId` (a newtype over its `NodeIndex`), which isn't known
        // until `add_node` returns.
        let node_index = store.add_node(GraphNode::Transit(Stop {
            id: StopId(petgraph::graph::NodeIndex::end()),
            location: Point::new(lon, lat),
            name: names[sequence].clone(),
        }));
        let id = StopId(node_index);
        if let Some(GraphNode::Transit(stop)) = store.node_weight_mut(node_index) {
            stop.id = id;
        }
        map.insert(raw_stop_id.clone(), id);
    }
    Ok(map)
}

fn load_stop_times(
    store: &mut GraphStore,
    path: &Path,
    stop_ids: &HashMap<String, StopId>,
    trip_ids: &HashMap<String, TripId>,
) -> Result<(), Error> {
    let mut df = read_csv(path.join("stop_times.txt"))?;
    df.apply("arrival_time", |c| hhmmss_to_sec(c.as_materialized_series()))?;
    df.apply("departure_time", |c| hhmmss_to_sec(c.as_materialized_series()))?;

    let trip_id_col = str_column_owned(&df, "trip_id")?;
    let stop_id_col = str_column_owned(&df, "stop_id")?;
    let arrivals = df.column("arrival_time")?.u32()?;
    let departures = df.column("departure_time")?.u32()?;
    let sequences = df.column("stop_sequence")?.cast(&DataType::UInt32)?;
    let sequences = sequences.u32()?;

    let mut by_trip: HashMap<TripId, Vec<StopTime>> = HashMap::new();
    for row in 0..trip_id_col.len() {
        let trip = *trip_ids
            .get(&trip_id_col[row])
            .ok_or_else(|| Error::NodeNotFound(format!("stop_times references unknown trip {}", trip_id_col[row])))?;
        let stop = *stop_ids
            .get(&stop_id_col[row])
            .ok_or_else(|| Error::NodeNotFound(format!("stop_times references unknown stop {}", stop_id_col[row])))?;

        by_trip.entry(trip).or_default().push(StopTime {
            trip,
            stop,
            arrival_time: arrivals.get(row).ok_or_else(|| Error::MissingValue("arrival_time".to_string()))?,
            departure_time: departures.get(row).ok_or_else(|| Error::MissingValue("departure_time".to_string()))?,
            sequence: sequences.get(row).ok_or_else(|| Error::MissingValue("stop_sequence".to_string()))?,
        });
    }

    for (trip, mut stop_times) in by_trip {
        stop_times.sort_by_key(|st| st.sequence);

        for (current, next) in stop_times.iter().tuple_windows() {
            // Invalid feeds with negative edge weights would otherwise
            // produce a Dijkstra search that never terminates cleanly.
            if current.arrival_time > next.arrival_time {
                return Err(Error::NegativeWeight(format!(
                    "trip {trip:?}: stop {:?} arrives after stop {:?}",
                    current.stop, next.stop
                )));
            }

            let scheduled = ScheduledTrip::new(trip, current.departure_time, next.arrival_time);
            if let Some(edge) = store.find_edge(current.stop.0, next.stop.0) {
                if let Some(GraphEdge::Transit(transit_edge)) = store.edge_weight_mut(edge) {
                    transit_edge.edge_trips.push(scheduled);
                }
            } else {
                store.add_edge(
                    current.stop.0,
                    next.stop.0,
                    GraphEdge::Transit(TransitEdge {
                        edge_trips: vec![scheduled],
                    }),
                );
            }
        }

        store.insert_stop_times(trip, stop_times);
    }

    // `find_trip`'s binary search over `edge_trips` requires each
    // edge's trips sorted by departure time; trips were appended in
    // per-trip load order above, not globally sorted.
    for edge in store.edge_indices().collect::<Vec<_>>() {
        if let Some(GraphEdge::Transit(transit_edge)) = store.edge_weight_mut(edge) {
            transit_edge.edge_trips.sort_by_key(|scheduled| scheduled.departure_time);
        }
    }

    Ok(())
}
