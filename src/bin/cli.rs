use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use serde::Serialize;
use skycache::logging::init_cli_tracing;
use skycache::modules::sky::{MoonDetails, SkyError, SkyQuery, SkyService, SkySummary};
use skycache_cache::{BlockingReadThrough, CacheConfig, SharedBlockingStore, probe_blocking_store};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "skycache-cli")]
#[command(about = "Skycache CLI - sky lookups through the shared cache", long_about = None)]
struct Cli {
    /// Override CACHE_TTL_SECONDS for entries written by this run
    #[arg(long, global = true)]
    ttl: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Coordinates {
    /// Latitude in degrees (default 35.92)
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude in degrees (default -86.86)
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,
}

impl From<Coordinates> for SkyQuery {
    fn from(c: Coordinates) -> Self {
        SkyQuery {
            lat: c.lat,
            lon: c.lon,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Moon phase and illumination
    Moon(Coordinates),
    /// Location, moon and sun details
    Summary(Coordinates),
    /// Check the cache store is reachable
    Ping,
}

fn moon_lookup(
    store: SharedBlockingStore,
    ttl: Duration,
) -> BlockingReadThrough<impl Fn(SkyQuery) -> Result<MoonDetails, SkyError>> {
    BlockingReadThrough::new("moon_details", store, |q: SkyQuery| {
        SkyService::moon_details(&q, Utc::now())
    })
    .with_ttl(ttl)
}

fn summary_lookup(
    store: SharedBlockingStore,
    ttl: Duration,
) -> BlockingReadThrough<impl Fn(SkyQuery) -> Result<SkySummary, SkyError>> {
    BlockingReadThrough::new("sky_summary", store, |q: SkyQuery| {
        SkyService::sky_summary(&q, Utc::now())
    })
    .with_ttl(ttl)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_cli_tracing();

    let cli = Cli::parse();
    let config = CacheConfig::from_env();
    let ttl = cli
        .ttl
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.ttl());

    let store: SharedBlockingStore = config
        .open_blocking_store()
        .context("Invalid REDIS_URL")?;

    match cli.command {
        Commands::Moon(coords) => {
            print_json(&moon_lookup(store, ttl).call(SkyQuery::from(coords))?)
        }
        Commands::Summary(coords) => {
            print_json(&summary_lookup(store, ttl).call(SkyQuery::from(coords))?)
        }
        Commands::Ping => {
            if !probe_blocking_store(&store) {
                anyhow::bail!("cache store at {} is unreachable", config.redis_url);
            }
            println!("PONG");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycache::modules::sky::Hemisphere;
    use skycache_cache::{BlockingKeyValueStore, MemoryStore};
    use std::sync::Arc;

    #[test]
    fn test_moon_command_parses_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "skycache-cli",
            "moon",
            "--lat",
            "-33.87",
            "--lon",
            "151.21",
        ])
        .unwrap();

        let Commands::Moon(coords) = cli.command else {
            panic!("expected the moon subcommand");
        };
        assert_eq!(SkyQuery::from(coords), SkyQuery::at(-33.87, 151.21));
    }

    #[test]
    fn test_missing_coordinates_stay_unset() {
        let cli = Cli::try_parse_from(["skycache-cli", "--ttl", "5", "summary"]).unwrap();

        assert_eq!(cli.ttl, Some(5));
        let Commands::Summary(coords) = cli.command else {
            panic!("expected the summary subcommand");
        };
        assert_eq!(SkyQuery::from(coords), SkyQuery::default());
    }

    #[test]
    fn test_moon_lookup_writes_the_shared_key() {
        let store = MemoryStore::new();
        let moon = moon_lookup(Arc::new(store.clone()), Duration::from_secs(60));

        let first = moon.call(SkyQuery::at(-33.87, 151.21)).unwrap();
        assert_eq!(first.hemisphere, Hemisphere::Southern);

        let raw = BlockingKeyValueStore::get(&store, "moon_details:-33.9:151.2")
            .unwrap()
            .expect("entry written on miss");
        let cached: MoonDetails = serde_json::from_str(&raw).unwrap();
        assert_eq!(cached, first);

        let second = moon.call(SkyQuery::at(-33.91, 151.24)).unwrap();
        assert_eq!(second, first);
    }

    #[test]
    fn test_invalid_latitude_is_an_error_and_not_cached() {
        let store = MemoryStore::new();
        let summary = summary_lookup(Arc::new(store.clone()), Duration::from_secs(60));

        assert!(summary.call(SkyQuery::at(95.0, 0.0)).is_err());
        assert!(store.is_empty());
    }
}
