//! The `cache` administrative subcommand: small, direct operations over
//! the same [`gsd_cache::StateCache`] trait the poller and websocket
//! gateway use. The distilled spec lists `cache` in the CLI surface
//! table without describing its behavior; this gives it grounded
//! operational utility rather than leaving it a stub.

use gsd_cache::{RedisCache, StateCache};
use gsd_protocol::{Address, StatusEntity};

use crate::exit::{CliError, FatalError};

pub enum CacheCommand {
    Get { address: Address },
    Ensure { address: Address },
    Search { include: Vec<String>, exclude: Vec<String> },
}

pub async fn run(redis_url: &str, command: CacheCommand) -> Result<(), CliError> {
    let cache = RedisCache::connect(redis_url)
        .await
        .map_err(FatalError::from)?;

    match command {
        CacheCommand::Get { address } => {
            let status = cache.get(address).await.map_err(FatalError::from)?;
            let entity = StatusEntity::from_status(&status);
            println!("{}", serde_json::to_string_pretty(&entity).expect("StatusEntity always serializes"));
        }
        CacheCommand::Ensure { address } => {
            let inserted = cache.ensure(address).await.map_err(FatalError::from)?;
            if inserted {
                println!("added {address}");
            } else {
                println!("{address} was already known");
            }
        }
        CacheCommand::Search { include, exclude } => {
            let results = cache.search(&include, &exclude).await.map_err(FatalError::from)?;
            for address in results {
                println!("{address}");
            }
        }
    }
    Ok(())
}
