//! The poller pool: drains the interest queue (or, in passive mode, walks
//! the whole server set), queries A2S, tags the result, and commits it.

mod config;

pub use config::PollerConfig;

use std::sync::Arc;

use dashmap::DashSet;
use gsd_cache::{CacheError, InterestingError, StateCache};
use gsd_protocol::{Address, Status};
use gsd_tagger::Tagger;
use tokio::task::JoinSet;

/// Run a pool of workers, one per cache handle in `handles`. Each handle
/// should be an independently-constructed connection (its own active-item
/// marker), never a clone of another entry — see
/// [`gsd_cache::RedisCache::connect`].
///
/// Returns once every worker has stopped. A [`CacheError`] from any
/// worker aborts the rest of the pool and is returned; per-address
/// [`gsd_a2s::PollError`]s never reach this far, they're logged and
/// skipped inside the worker loop.
pub async fn run<C>(
    handles: Vec<C>,
    tagger: Arc<Tagger>,
    config: PollerConfig,
) -> Result<(), CacheError>
where
    C: StateCache + Send + Sync + 'static,
{
    let in_flight = Arc::new(DashSet::<Address>::new());
    let mut tasks = JoinSet::new();
    for cache in handles {
        let tagger = tagger.clone();
        let in_flight = in_flight.clone();
        tasks.spawn(async move { worker_loop(cache, tagger, in_flight, config).await });
    }

    let mut fatal: Option<CacheError> = None;
    while let Some(outcome) = tasks.join_next().await {
        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::error!(%error, "poller worker hit a fatal cache error, stopping pool");
                if fatal.is_none() {
                    fatal = Some(error);
                }
                tasks.abort_all();
            }
            Err(join_error) => {
                tracing::error!(%join_error, "poller worker task panicked");
            }
        }
    }

    match fatal {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

async fn worker_loop<C>(
    cache: C,
    tagger: Arc<Tagger>,
    in_flight: Arc<DashSet<Address>>,
    config: PollerConfig,
) -> Result<(), CacheError>
where
    C: StateCache,
{
    loop {
        if config.passive {
            for addr in cache.all().await? {
                poll_if_unclaimed(&cache, &tagger, &in_flight, addr).await;
            }
            tokio::task::yield_now().await;
        } else {
            match cache.interesting().await {
                Ok(addr) => {
                    poll_if_unclaimed(&cache, &tagger, &in_flight, addr).await;
                    cache.update_interest_queue().await?;
                }
                Err(InterestingError::EmptyQueue) => {
                    tokio::time::sleep(config.idle_backoff).await;
                }
                Err(InterestingError::Cache(error)) => return Err(error),
            }
        }
    }
}

/// Skip `addr` if another worker already has it in flight; otherwise
/// claim it for the duration of one poll. This is the in-memory guard
/// the spec allows implementations to add on top of the queue's natural,
/// but imperfect, mutual exclusion.
async fn poll_if_unclaimed<C: StateCache>(
    cache: &C,
    tagger: &Tagger,
    in_flight: &DashSet<Address>,
    addr: Address,
) {
    if !in_flight.insert(addr) {
        return;
    }
    let result = poll_one(cache, tagger, addr).await;
    in_flight.remove(&addr);
    if let Err(error) = result {
        tracing::error!(address = %addr, %error, "cache write failed after a successful poll");
    }
}

async fn poll_one<C: StateCache>(
    cache: &C,
    tagger: &Tagger,
    addr: Address,
) -> Result<(), CacheError> {
    let query = match gsd_a2s::query(addr.socket_addr()).await {
        Ok(query) => query,
        Err(error) => {
            tracing::warn!(address = %addr, %error, "poll failed, skipping this address");
            return Ok(());
        }
    };

    let players = query.players.to_players(
        query.info.player_count,
        query.info.max_players,
        query.info.bot_count,
    );
    let tags = tagger.evaluate(
        &query.info.to_tagger_info(),
        &players,
        &query.rules.to_tagger_rules(),
    );

    let status = Status {
        address: addr,
        interest: 0,
        name: Some(query.info.server_name).filter(|s| !s.is_empty()),
        map: Some(query.info.map).filter(|s| !s.is_empty()),
        application_id: Some(query.info.app_id),
        players,
        tags,
    };
    cache.set(status).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsd_test_utils::FakeCache;
    use std::time::Duration;

    #[tokio::test]
    async fn passive_mode_leaves_unqueryable_addresses_alone_without_crashing() {
        let cache = FakeCache::new();
        let addr = Address::new(std::net::Ipv4Addr::new(192, 0, 2, 1), 27015).unwrap();
        cache.ensure(addr).await.unwrap();

        let tagger = Arc::new(Tagger::new(gsd_tagger::default_rules()).unwrap());
        let config = PollerConfig {
            passive: true,
            ..Default::default()
        };

        // 192.0.2.0/24 is unroutable, so the A2S query always fails; the
        // pool must absorb that and keep running rather than erroring out.
        let result = tokio::time::timeout(
            Duration::from_millis(200),
            run(vec![cache.handle()], tagger, config),
        )
        .await;
        assert!(result.is_err(), "pool should still be running after a timeout, not have returned");
    }

    #[tokio::test]
    async fn two_workers_never_claim_the_same_address_concurrently() {
        let in_flight = Arc::new(DashSet::<Address>::new());
        let addr = Address::new(std::net::Ipv4Addr::new(192, 0, 2, 1), 27015).unwrap();
        assert!(in_flight.insert(addr));
        assert!(!in_flight.insert(addr));
    }
}
