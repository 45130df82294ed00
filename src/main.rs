//! CLI entry point for the station traffic tool.
//!
//! Loads bike-share stations and trips, counts per-station arrivals and
//! departures under a time-of-day filter, and reports the traffic or the
//! marker geometry a map overlay would draw.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use station_traffic::{
    fetch::BasicClient,
    loader::{DEFAULT_STATIONS_URL, DEFAULT_TRIPS_URL, load_stations, load_trips},
    model::{Station, Trip},
    output::{append_records, print_json, print_pretty},
    time_filter::{LAST_MINUTE, TimeFilter, filter_trips_by_time},
    traffic::{TrafficSummary, compute_station_traffic},
    view::{Marker, ViewController},
    viewport::{MapOptions, MercatorViewport},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "station_traffic")]
#[command(about = "Bike-share station traffic by time of day", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Sources {
    /// Station metadata JSON (path or URL)
    #[arg(long, env = "STATIONS_URL", default_value = DEFAULT_STATIONS_URL)]
    stations: String,

    /// Trip CSV (path or URL, optionally .gz)
    #[arg(long, env = "TRIPS_URL", default_value = DEFAULT_TRIPS_URL)]
    trips: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Count arrivals and departures per station
    Traffic {
        #[command(flatten)]
        sources: Sources,

        /// Minute of the day to filter around, -1 for all trips
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        time: i32,

        /// CSV file to append per-station rows to
        #[arg(short, long)]
        output: Option<String>,

        /// Log the per-station traffic as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Replay the time slider across the day and append every position's traffic
    Sweep {
        #[command(flatten)]
        sources: Sources,

        /// Minutes between slider positions
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
        step: u32,

        /// CSV file to append per-station rows to
        #[arg(short, long, default_value = "traffic.csv")]
        output: String,
    },
    /// Compute marker positions and radii for a map camera
    Markers {
        #[command(flatten)]
        sources: Sources,

        /// Minute of the day to filter around, -1 for all trips
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        time: i32,

        #[arg(long, default_value_t = MapOptions::default().center_lon, allow_negative_numbers = true)]
        center_lon: f64,

        #[arg(long, default_value_t = MapOptions::default().center_lat, allow_negative_numbers = true)]
        center_lat: f64,

        #[arg(long, default_value_t = MapOptions::default().zoom)]
        zoom: f64,

        #[arg(long, default_value_t = MapOptions::default().width)]
        width: f64,

        #[arg(long, default_value_t = MapOptions::default().height)]
        height: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/station_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("station_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Traffic {
            sources,
            time,
            output,
            json,
        } => {
            let filter = TimeFilter::from_slider(time)?;
            let (stations, trips) = load(&sources).await?;

            let filtered = filter_trips_by_time(&trips, filter);
            let trip_count = filtered.len();
            let traffic = compute_station_traffic(&stations, filtered);

            let summary = TrafficSummary::from_traffic(&traffic, trip_count);
            info!(
                time = %filter.label(),
                stations = summary.stations,
                trips = summary.trips,
                stations_with_traffic = summary.stations_with_traffic,
                busiest = summary.busiest_station.as_deref().unwrap_or("-"),
                busiest_total = summary.busiest_total,
                "Traffic computed"
            );

            if json {
                print_json(&traffic)?;
            } else {
                print_pretty(&traffic);
            }
            if let Some(path) = output {
                append_records(&path, filter, &traffic)?;
                info!(path, "Traffic appended");
            }
        }
        Commands::Sweep {
            sources,
            step,
            output,
        } => {
            let (stations, trips) = load(&sources).await?;
            sweep(stations, trips, step, &output)?;
        }
        Commands::Markers {
            sources,
            time,
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        } => {
            let options = MapOptions {
                center_lon,
                center_lat,
                zoom,
                width,
                height,
                ..MapOptions::default()
            };
            let markers = markers(&sources, time, options).await?;
            print_json(&markers)?;
        }
    }

    Ok(())
}

/// Loads stations, then trips. Either failure ends the run.
async fn load(sources: &Sources) -> Result<(Vec<Station>, Vec<Trip>)> {
    let client = BasicClient::new()?;
    let stations = load_stations(&client, &sources.stations).await?;
    let trips = load_trips(&client, &sources.trips).await?;
    Ok((stations, trips))
}

/// Validates the slider value, loads the sources and lays out markers for
/// the given camera.
async fn markers(sources: &Sources, time: i32, options: MapOptions) -> Result<Vec<Marker>> {
    let filter = TimeFilter::from_slider(time)?;
    let (stations, trips) = load(sources).await?;

    let mut view = ViewController::new(MercatorViewport::new(options), stations, trips);
    view.on_slider_input(filter.slider_value())?;
    Ok(view.markers().to_vec())
}

/// Drives the view through every slider position the way a user dragging
/// it end to end would, appending each position's traffic to `output`.
#[tracing::instrument(skip(stations, trips), fields(stations = stations.len(), trips = trips.len()))]
fn sweep(stations: Vec<Station>, trips: Vec<Trip>, step: u32, output: &str) -> Result<()> {
    let mut view = ViewController::new(MercatorViewport::new(MapOptions::default()), stations, trips);

    let positions = std::iter::once(-1).chain((0..=LAST_MINUTE as i32).step_by(step as usize));
    let mut count = 0;
    for value in positions {
        view.on_slider_input(value)?;
        append_records(output, view.time_filter(), view.traffic())?;
        count += 1;
    }

    info!(positions = count, output, "Sweep complete");
    Ok(())
}
