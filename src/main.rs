use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use findit::api::{AmenityFinder, NominatimClient, ReverseGeocoder};
use findit::config::FileConfig;
use findit::domain::{Location, Place, PlaceCategory, PlaceFilter};
use findit::geocode::GeocodeCache;
use findit::osm::NO_TAG_ADDRESS;

/// Upper bound on parallel reverse-geocoding lookups
const RESOLVE_WORKERS: usize = 4;

/// Find nearby public toilets and ATMs from OpenStreetMap data
///
/// Examples:
///   # Toilets around Orchard Road
///   findit --lat 1.3048 --lon 103.8318
///
///   # Free, wheelchair-accessible toilets, nearest 5
///   findit --lat 1.3048 --lon 103.8318 --free --wheelchair -n 5
///
///   # ATMs as JSON, filling in missing addresses
///   findit --lat 1.3048 --lon 103.8318 -c atm --resolve-addresses --json
#[derive(Parser, Debug)]
#[command(name = "findit")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches findit.toml if not provided)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Latitude of the search location (use with --lon)
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the search location (use with --lat)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Amenity to look for
    #[arg(short = 'c', long, value_enum)]
    category: Option<PlaceCategory>,

    /// Only places that are free to use
    #[arg(long)]
    free: bool,

    /// Only wheelchair-accessible places
    #[arg(long)]
    wheelchair: bool,

    /// Only places with a diaper-changing table
    #[arg(long)]
    diaper: bool,

    /// Reverse-geocode places that carry no address tags
    #[arg(long)]
    resolve_addresses: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Show at most this many places, nearest first
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NearbyPlace {
    #[serde(flatten)]
    place: Place,
    distance_m: f64,
}

#[derive(Serialize)]
struct Report<'a> {
    location: Location,
    address: &'a str,
    category: PlaceCategory,
    places: &'a [NearbyPlace],
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file_config = match args.config {
        Some(ref path) => {
            if !path.exists() {
                bail!("Config file not found: {:?}", path);
            }
            FileConfig::from_path(path)?
        }
        None => FileConfig::load().unwrap_or_default(),
    };

    let verbose = args.verbose || file_config.verbose;
    init_tracing(verbose);

    let lat = args.lat.or(file_config.lat);
    let lon = args.lon.or(file_config.lon);
    let (Some(lat), Some(lon)) = (lat, lon) else {
        bail!("Must provide --lat and --lon (or set lat/lon in the config file)");
    };
    let location = Location::new(lat, lon);
    let category = args.category.unwrap_or_else(|| file_config.category());
    let filter = PlaceFilter {
        free: args.free,
        wheelchair: args.wheelchair,
        diaper: args.diaper,
    };

    let overpass_config = file_config.overpass.clone().unwrap_or_default();
    let nominatim_config = file_config.nominatim.clone().unwrap_or_default();
    let cache_config = file_config.cache.clone().unwrap_or_default();

    tracing::debug!(?location, %category, ?filter, "starting search");

    let geocoder = NominatimClient::new(&nominatim_config)?;
    let cache = GeocodeCache::new(geocoder, &cache_config);
    let finder = AmenityFinder::new(&overpass_config)?;

    let spinner = create_spinner("Looking up your address...");
    let start = Instant::now();
    let here = cache.resolve(location);
    spinner.finish_with_message(format!(
        "Near: {} [{:.1}s]",
        here,
        start.elapsed().as_secs_f32()
    ));

    let spinner = create_spinner(&format!("Searching for nearby {}...", category.plural()));
    let start = Instant::now();
    let places = finder.find(category, location);
    let places = match places {
        Ok(places) => places,
        Err(e) => {
            spinner.abandon_with_message(e.to_string());
            return Err(e).context("Search failed");
        }
    };
    let found = places.len();
    let places = filter.apply(places);
    spinner.finish_with_message(format!(
        "Found {} {} ({} after filters) [{:.1}s]",
        found,
        category.plural(),
        places.len(),
        start.elapsed().as_secs_f32()
    ));

    let mut nearby: Vec<NearbyPlace> = places
        .into_iter()
        .map(|place| NearbyPlace {
            distance_m: location.distance_m(&place.location),
            place,
        })
        .collect();
    nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    if let Some(limit) = args.limit {
        nearby.truncate(limit);
    }

    if args.resolve_addresses {
        let spinner = create_spinner("Resolving missing addresses...");
        let start = Instant::now();
        let resolved = resolve_missing_addresses(&mut nearby, &cache);
        spinner.finish_with_message(format!(
            "Resolved {} addresses ({} cached) [{:.1}s]",
            resolved,
            cache.len(),
            start.elapsed().as_secs_f32()
        ));
    }

    if args.json {
        let report = Report {
            location,
            address: &here,
            category,
            places: &nearby,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_places(&nearby);
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "findit=debug" } else { "findit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Fill in addresses for places without address tags, sharing one cache
/// across a small pool of worker threads
fn resolve_missing_addresses<G: ReverseGeocoder>(
    places: &mut [NearbyPlace],
    cache: &GeocodeCache<G>,
) -> usize {
    let targets: Vec<(usize, Location)> = places
        .iter()
        .enumerate()
        .filter(|(_, p)| p.place.address.as_deref().is_none_or(|a| a == NO_TAG_ADDRESS))
        .map(|(i, p)| (i, p.place.location))
        .collect();

    let next = AtomicUsize::new(0);
    let results: Vec<(usize, String)> = thread::scope(|s| {
        let mut workers = Vec::new();
        for _ in 0..RESOLVE_WORKERS.min(targets.len()) {
            workers.push(s.spawn(|| {
                let mut out = Vec::new();
                loop {
                    let n = next.fetch_add(1, Ordering::Relaxed);
                    let Some(&(index, location)) = targets.get(n) else {
                        break;
                    };
                    out.push((index, cache.resolve(location)));
                }
                out
            }));
        }

        workers
            .into_iter()
            .flat_map(|w| {
                w.join().unwrap_or_else(|_| {
                    tracing::warn!("address worker panicked; its addresses were dropped");
                    Vec::new()
                })
            })
            .collect()
    });

    let resolved = results.len();
    for (index, address) in results {
        places[index].place.address = Some(address);
    }
    resolved
}

fn print_places(places: &[NearbyPlace]) {
    println!();
    if places.is_empty() {
        println!("Nothing found nearby.");
        return;
    }

    for (i, nearby) in places.iter().enumerate() {
        let place = &nearby.place;
        println!("{:>3}. {} ({:.0}m)", i + 1, place.name, nearby.distance_m);
        if let Some(ref address) = place.address {
            println!("     {}", address);
        }
        if let Some(ref parent) = place.housed_in {
            println!("     in {}", parent);
        }

        let mut badges = Vec::new();
        if place.free == Some(true) {
            badges.push("free");
        }
        if place.wheelchair == Some(true) {
            badges.push("wheelchair");
        }
        if place.diaper == Some(true) {
            badges.push("diaper");
        }
        if !badges.is_empty() {
            println!("     [{}]", badges.join(", "));
        }
        println!(
            "     https://www.openstreetmap.org/?mlat={}&mlon={}",
            place.location.lat, place.location.lng
        );
    }
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
