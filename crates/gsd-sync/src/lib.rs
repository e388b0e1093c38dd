//! The master-server synchroniser: enumerate addresses from an upstream
//! directory across a set of regions and seed them into the cache.

mod directory;
mod error;
mod protocol;

pub use directory::{MasterServerDirectory, SteamMasterServer, DEFAULT_MASTER_SERVER};
pub use error::SyncError;
pub use protocol::Region;

use gsd_cache::StateCache;

/// One full pass over `regions`: query each, `ensure` every address the
/// directory returns, and count how many were newly added.
///
/// An upstream timeout or malformed response for one region is logged
/// and skipped; the pass continues with the remaining regions. A cache
/// error is fatal and aborts the pass immediately.
pub async fn sync_once<D, C>(
    directory: &D,
    cache: &C,
    regions: &[Region],
    filter: &str,
) -> Result<usize, SyncError>
where
    D: MasterServerDirectory,
    C: StateCache,
{
    let mut added = 0;
    for &region in regions {
        let addresses = match directory.region(region, filter).await {
            Ok(addresses) => addresses,
            Err(error @ (SyncError::Timeout | SyncError::MalformedResponse | SyncError::Io(_))) => {
                tracing::warn!(?region, %error, "master server region query failed, skipping for this pass");
                continue;
            }
            Err(error @ SyncError::Cache(_)) => return Err(error),
        };

        for addr in addresses {
            if cache.ensure(addr).await.map_err(SyncError::Cache)? {
                added += 1;
            }
        }
    }
    Ok(added)
}

/// Loop `sync_once` indefinitely, with no internal backoff between
/// passes — one full pass over every region is one "tick."
pub async fn sync_forever<D, C>(
    directory: &D,
    cache: &C,
    regions: &[Region],
    filter: &str,
) -> Result<(), SyncError>
where
    D: MasterServerDirectory,
    C: StateCache,
{
    loop {
        let added = sync_once(directory, cache, regions, filter).await?;
        tracing::info!(added, "completed a master-server sync pass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsd_protocol::Address;
    use gsd_test_utils::FakeCache;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    struct FakeDirectory {
        pages: Mutex<Vec<Result<Vec<Address>, SyncError>>>,
    }

    impl MasterServerDirectory for FakeDirectory {
        async fn region(&self, _region: Region, _filter: &str) -> Result<Vec<Address>, SyncError> {
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                return Ok(Vec::new());
            }
            pages.remove(0)
        }
    }

    fn addr(last_octet: u8) -> Address {
        Address::new(Ipv4Addr::new(192, 0, 2, last_octet), 27015).unwrap()
    }

    #[tokio::test]
    async fn new_addresses_are_counted_once() {
        let directory = FakeDirectory {
            pages: Mutex::new(vec![Ok(vec![addr(1), addr(2)])]),
        };
        let cache = FakeCache::new();

        let added = sync_once(&directory, &cache, &[Region::All], "").await.unwrap();
        assert_eq!(added, 2);
        assert_eq!(cache.all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn rerunning_against_the_same_addresses_adds_nothing_new() {
        let directory = FakeDirectory {
            pages: Mutex::new(vec![Ok(vec![addr(1)]), Ok(vec![addr(1)])]),
        };
        let cache = FakeCache::new();

        sync_once(&directory, &cache, &[Region::All], "").await.unwrap();
        let added = sync_once(&directory, &cache, &[Region::All], "").await.unwrap();
        assert_eq!(added, 0);
    }

    #[tokio::test]
    async fn a_region_timeout_is_skipped_not_fatal() {
        let directory = FakeDirectory {
            pages: Mutex::new(vec![Err(SyncError::Timeout), Ok(vec![addr(1)])]),
        };
        let cache = FakeCache::new();

        let added = sync_once(
            &directory,
            &cache,
            &[Region::Europe, Region::Asia],
            "",
        )
        .await
        .unwrap();
        assert_eq!(added, 1);
    }
}
