use std::path::PathBuf;
use std::time::Instant;

use cascade_core::prelude::*;
use clap::Parser;
use chrono::NaiveDate;
use geo::Point;

/// Plans a time-dependent walk+transit trip and prints the resulting
/// directions as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory containing the GTFS feed's `.txt` files.
    #[arg(long)]
    gtfs: PathBuf,

    /// OSM `.pbf` extract covering the feed's service area.
    #[arg(long)]
    osm: PathBuf,

    /// Origin longitude.
    #[arg(long, allow_hyphen_values = true)]
    from_lon: f64,
    /// Origin latitude.
    #[arg(long, allow_hyphen_values = true)]
    from_lat: f64,
    /// Destination longitude.
    #[arg(long, allow_hyphen_values = true)]
    to_lon: f64,
    /// Destination latitude.
    #[arg(long, allow_hyphen_values = true)]
    to_lat: f64,

    /// Travel date, `YYYY-MM-DD`. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Departure time, seconds since local midnight. Defaults to noon.
    #[arg(long, default_value_t = 43_200)]
    departure: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let date = cli
        .date
        .map(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let instant = Instant::now();
    let graph = cascade_core::streets::build_walk_graph(&cli.osm)?;
    let graph = cascade_core::loaders::load_gtfs(graph, &cli.gtfs)?;
    log::info!("graph built in {:?} ({} nodes)", instant.elapsed(), graph.node_count());

    let source = SnappedPoint::init(Point::new(cli.from_lon, cli.from_lat), &graph)?;
    let target = SnappedPoint::init(Point::new(cli.to_lon, cli.to_lat), &graph)?;

    let active_trips = queries::day_trips(&graph, date);
    let router = Router::Composite {
        store: &graph,
        active_trips,
    };

    let instant = Instant::now();
    let path = shortest_path(router, source.index(), target.index(), cli.departure)
        .ok_or_else(|| cascade_core::Error::NodeNotFound("no route between the given points".to_string()))?;
    log::info!("search finished in {:?} ({} traces)", instant.elapsed(), path.len());

    let midnight_epoch = date
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc()
        .timestamp();
    let directions = cascade_core::directions::build(&graph, &path, midnight_epoch);

    println!("{}", serde_json::to_string_pretty(&directions)?);
    Ok(())
}
