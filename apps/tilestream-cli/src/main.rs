use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tilestream_common::{GeoPoint, TileConfig, normalize_longitude};
use tilestream_geo::{METERS_PER_DEGREE, meters_per_degree_at};
use tilestream_procgen::Generator;
use tilestream_stream::{TileEvent, TileManager};
use tilestream_tools::TileInspector;
use tracing_subscriber::EnvFilter;

/// Latitude limit for simulated flights; beyond it longitude steps explode.
const FLIGHT_LATITUDE_LIMIT: f64 = 89.0;

#[derive(Parser)]
#[command(name = "tilestream-cli", about = "CLI tool for tilestream operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Generate the tile containing a coordinate
    Generate {
        /// Latitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Emit the full tile content as JSON
        #[arg(long)]
        json: bool,
    },
    /// Fly an observer along a fixed heading and stream tiles around it
    Fly {
        /// Start latitude in degrees
        #[arg(long, allow_negative_numbers = true, default_value = "0")]
        lat: f64,
        /// Start longitude in degrees
        #[arg(long, allow_negative_numbers = true, default_value = "0")]
        lon: f64,
        /// Heading in degrees clockwise from north
        #[arg(long, default_value = "90")]
        heading: f64,
        /// Ground speed in meters per second
        #[arg(long, default_value = "120")]
        speed: f64,
        /// Seconds per simulation step
        #[arg(long, default_value = "1")]
        dt: f64,
        /// Number of steps to simulate
        #[arg(short, long, default_value = "60")]
        steps: usize,
    },
    /// Validate a configuration file and print it with defaults filled in
    CheckConfig {
        /// Path to the JSON configuration
        path: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tilestream-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tilestream_common::crate_info());
            println!("geo: {}", tilestream_geo::crate_info());
            println!("procgen: {}", tilestream_procgen::crate_info());
            println!("stream: {}", tilestream_stream::crate_info());
            println!("tools: {}", tilestream_tools::crate_info());
        }
        Commands::Generate { lat, lon, json } => {
            let config = load_config(cli.config.as_ref())?;
            let generator = Generator::new(config)?;
            let p = GeoPoint::try_new(lat, lon)?;
            let key = generator.grid().key_for(p);
            let tile = generator.generate_key(key);

            if json {
                println!("{}", serde_json::to_string_pretty(&tile)?);
            } else {
                let hf = &tile.heightfield;
                println!("Tile {} centered at {}", tile.key, tile.origin);
                println!(
                    "Bounds: N={:.6} S={:.6} E={:.6} W={:.6}",
                    tile.bounds.north, tile.bounds.south, tile.bounds.east, tile.bounds.west
                );
                println!(
                    "Heightfield: {}x{} elevation=[{:.1}, {:.1}]",
                    hf.width, hf.height, hf.min_elevation, hf.max_elevation
                );
                println!("Items: {}", tile.items.len());
                for item in &tile.items {
                    println!(
                        "  {} {:<9} at ({:.6}, {:.6}) ground={:.1} h={:.1} w={:.1} d={:.1}",
                        item.id,
                        item.kind,
                        item.latitude,
                        item.longitude,
                        item.elevation,
                        item.height,
                        item.width,
                        item.depth
                    );
                }
            }
        }
        Commands::Fly {
            lat,
            lon,
            heading,
            speed,
            dt,
            steps,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let mut manager = TileManager::new(config)?;
            manager.subscribe(|event: &TileEvent| {
                let keys: Vec<String> = event.tiles.iter().map(|t| t.key().to_string()).collect();
                println!("  {} {} tiles: {}", event.kind, keys.len(), keys.join(" "));
                Ok(())
            });

            let mut observer = GeoPoint::try_new(lat, lon)?;
            println!(
                "Flight: start={observer} heading={heading} speed={speed}m/s dt={dt}s steps={steps}"
            );
            let (sin_h, cos_h) = heading.to_radians().sin_cos();
            for step in 0..steps {
                let stats = manager
                    .update_position(observer)
                    .with_context(|| format!("update at step {step}"))?;
                if !stats.debounced {
                    println!(
                        "step {step}: {observer} loaded={} unloaded={} resident={} in {:?}",
                        stats.tiles_loaded,
                        stats.tiles_unloaded,
                        stats.total_resident,
                        stats.update_time
                    );
                }

                let north = speed * dt * cos_h;
                let east = speed * dt * sin_h;
                let next_lat = (observer.latitude + north / METERS_PER_DEGREE)
                    .clamp(-FLIGHT_LATITUDE_LIMIT, FLIGHT_LATITUDE_LIMIT);
                let next_lon = normalize_longitude(
                    observer.longitude + east / meters_per_degree_at(observer.latitude),
                );
                observer = GeoPoint::new(next_lat, next_lon);
            }

            println!("{}", TileInspector::summary(&manager));
            if let Some(p) = manager.last_position() {
                if let Some(ground) = manager.elevation_at(p) {
                    println!("Ground under observer: {ground:.1}m");
                }
                let near = manager.items_near(p, manager.config().load_radius_meters);
                if let Some((d, item)) = near.first() {
                    println!("Nearest item: {} ({}) at {d:.0}m", item.id, item.kind);
                }
            }
            println!("Totals: {}", manager.totals());
        }
        Commands::CheckConfig { path } => {
            let config = TileConfig::from_json_file(&path)
                .with_context(|| format!("checking {}", path.display()))?;
            println!("{}: OK", path.display());
            println!("{}", config.to_json_pretty()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<TileConfig> {
    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading config");
            TileConfig::from_json_file(path)
                .with_context(|| format!("loading config from {}", path.display()))
        }
        None => Ok(TileConfig::default()),
    }
}
