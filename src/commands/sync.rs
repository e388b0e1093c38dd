//! The `sync` subcommand: run the master-server synchroniser once or, in
//! `--forever` mode, loop indefinitely with no internal backoff.

use gsd_cache::RedisCache;
use gsd_sync::{Region, SteamMasterServer};

use crate::exit::{CliError, FatalError};

pub async fn run(
    redis_url: &str,
    master_addr: &str,
    regions: Vec<Region>,
    filter: &str,
    forever: bool,
) -> Result<(), CliError> {
    let cache = RedisCache::connect(redis_url).await.map_err(FatalError::from)?;
    let master_addr = tokio::net::lookup_host(master_addr)
        .await
        .map_err(|error| anyhow::anyhow!("could not resolve master server address: {error}"))?
        .next()
        .ok_or_else(|| anyhow::anyhow!("master server address resolved to no addresses"))?;
    let directory = SteamMasterServer::new(master_addr);

    if forever {
        gsd_sync::sync_forever(&directory, &cache, &regions, filter)
            .await
            .map_err(FatalError::from)?;
    } else {
        let added = gsd_sync::sync_once(&directory, &cache, &regions, filter)
            .await
            .map_err(FatalError::from)?;
        tracing::info!(added, "sync pass complete");
    }
    Ok(())
}

/// Parse a comma-separated list of region names, as accepted by the
/// `--regions` flag. Unknown names are rejected up front by clap's value
/// parser, not here.
pub fn parse_region(value: &str) -> Result<Region, String> {
    match value.to_lowercase().as_str() {
        "us-east" => Ok(Region::UsEastCoast),
        "us-west" => Ok(Region::UsWestCoast),
        "south-america" => Ok(Region::SouthAmerica),
        "europe" => Ok(Region::Europe),
        "asia" => Ok(Region::Asia),
        "australia" => Ok(Region::Australia),
        "middle-east" => Ok(Region::MiddleEast),
        "africa" => Ok(Region::Africa),
        "all" => Ok(Region::All),
        other => Err(format!(
            "unknown region {other:?}; expected one of us-east, us-west, south-america, europe, asia, australia, middle-east, africa, all"
        )),
    }
}
