//! The `poller` subcommand: connect `workers` independent cache handles
//! and run the poller pool against them.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use gsd_cache::RedisCache;
use gsd_poller::PollerConfig;
use gsd_tagger::Tagger;

use crate::exit::{CliError, FatalError};

pub async fn run(redis_url: &str, workers: usize, passive: bool) -> Result<(), CliError> {
    let tagger = Arc::new(
        Tagger::new(gsd_tagger::default_rules())
            .context("the built-in tag rule set failed to register")?,
    );

    let mut handles = Vec::with_capacity(workers.max(1));
    for _ in 0..workers.max(1) {
        let handle = RedisCache::connect(redis_url).await.map_err(FatalError::from)?;
        handles.push(handle);
    }

    tracing::info!(workers, passive, "starting poller pool");
    let config = PollerConfig {
        passive,
        idle_backoff: Duration::from_millis(100),
    };
    gsd_poller::run(handles, tagger, config)
        .await
        .map_err(FatalError::from)?;
    Ok(())
}
