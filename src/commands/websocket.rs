//! The `websocket` subcommand: bind the fan-out gateway to an address and
//! serve client connections against a single shared cache handle.

use std::net::SocketAddr;

use gsd_cache::RedisCache;

use crate::exit::{CliError, FatalError};

pub async fn run(redis_url: &str, bind_addr: SocketAddr) -> Result<(), CliError> {
    let cache = RedisCache::connect(redis_url).await.map_err(FatalError::from)?;
    gsd_websocket::serve(bind_addr, cache)
        .await
        .map_err(FatalError::from)?;
    Ok(())
}
