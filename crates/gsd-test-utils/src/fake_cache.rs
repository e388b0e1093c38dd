use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use gsd_cache::{CacheError, InterestingError, StateCache};
use gsd_protocol::{Address, Players, Status};
use tokio::sync::{broadcast, Mutex};

use crate::event::{Channel, Event};
use crate::fake_notifier::FakeNotifier;

#[derive(Default, Clone)]
struct StatusFields {
    name: Option<String>,
    map: Option<String>,
    application_id: Option<i64>,
    players: Players,
}

struct ActiveItem {
    address: Address,
    enqueued_interest: i64,
}

#[derive(Default)]
struct Inner {
    servers: BTreeSet<Address>,
    fields: HashMap<Address, StatusFields>,
    tags: HashMap<Address, BTreeSet<String>>,
    tag_index: HashMap<String, BTreeSet<Address>>,
    interest: HashMap<Address, i64>,
    queue: VecDeque<(i64, Address)>,
}

/// An in-memory [`StateCache`], so tests exercise real cache semantics
/// (interest queue decay, tag reverse-index bookkeeping, notifications)
/// without a live Redis server.
///
/// `active` is deliberately kept out of the shared `inner`: cloning a
/// `FakeCache` (cheap, shares all backing state) also shares the active
/// marker, mirroring one cache handle used from two places. Use
/// [`FakeCache::handle`] instead to get an independent handle against the
/// same backing store, the way `RedisCache::connect` gives each poller
/// worker its own connection-local active marker.
#[derive(Clone)]
pub struct FakeCache {
    inner: Arc<Mutex<Inner>>,
    events_tx: broadcast::Sender<Event>,
    active: Arc<Mutex<Option<ActiveItem>>>,
}

impl Default for FakeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCache {
    pub fn new() -> Self {
        let (events_tx, _) = broadcast::channel(1024);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            events_tx,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// An independent handle sharing this cache's backing store but with
    /// its own active-item marker.
    pub fn handle(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            events_tx: self.events_tx.clone(),
            active: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait::async_trait]
impl StateCache for FakeCache {
    type Notifier = FakeNotifier;

    async fn ensure(&self, addr: Address) -> Result<bool, CacheError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.servers.insert(addr))
    }

    async fn get(&self, addr: Address) -> Result<Status, CacheError> {
        let inner = self.inner.lock().await;
        let fields = inner.fields.get(&addr).cloned().unwrap_or_default();
        let tags = inner.tags.get(&addr).cloned().unwrap_or_default();
        let interest = inner.interest.get(&addr).copied().unwrap_or(0).max(0) as u64;
        Ok(Status {
            address: addr,
            interest,
            name: fields.name,
            map: fields.map,
            application_id: fields.application_id,
            players: fields.players,
            tags,
        })
    }

    async fn set(&self, status: Status) -> Result<(), CacheError> {
        let addr = status.address;
        let newly_applied;
        let dropped;
        {
            let mut inner = self.inner.lock().await;
            inner.servers.insert(addr);

            let previous_tags = inner.tags.get(&addr).cloned().unwrap_or_default();
            dropped = previous_tags
                .difference(&status.tags)
                .cloned()
                .collect::<Vec<_>>();
            newly_applied = status
                .tags
                .difference(&previous_tags)
                .cloned()
                .collect::<Vec<_>>();

            inner.fields.insert(
                addr,
                StatusFields {
                    name: status.name.clone(),
                    map: status.map.clone(),
                    application_id: status.application_id,
                    players: status.players.clone(),
                },
            );
            inner.tags.insert(addr, status.tags.clone());

            for tag in &newly_applied {
                inner.tag_index.entry(tag.clone()).or_default().insert(addr);
            }
            for tag in &dropped {
                if let Some(set) = inner.tag_index.get_mut(tag) {
                    set.remove(&addr);
                }
            }
        }

        let _ = self.events_tx.send(Event {
            channel: Channel::Server(addr),
            addr,
        });
        for tag in &newly_applied {
            let _ = self.events_tx.send(Event {
                channel: Channel::Tag(tag.clone()),
                addr,
            });
        }

        Ok(())
    }

    async fn subscribe(&self, addr: Address) -> Result<u64, CacheError> {
        let mut inner = self.inner.lock().await;
        let entry = inner.interest.entry(addr).or_insert(0);
        *entry += 1;
        let new_interest = *entry;
        inner.queue.push_back((new_interest, addr));
        Ok(new_interest.max(0) as u64)
    }

    async fn interesting(&self) -> Result<Address, InterestingError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(CacheError::ActiveItemAlreadySet.into());
        }
        let (enqueued_interest, address) = {
            let mut inner = self.inner.lock().await;
            inner
                .queue
                .pop_front()
                .ok_or(InterestingError::EmptyQueue)?
        };
        *active = Some(ActiveItem {
            address,
            enqueued_interest,
        });
        Ok(address)
    }

    async fn update_interest_queue(&self) -> Result<(), CacheError> {
        let item = {
            let mut active = self.active.lock().await;
            active.take().ok_or(CacheError::NoActiveItem)?
        };
        let mut inner = self.inner.lock().await;
        let current = inner.interest.get(&item.address).copied().unwrap_or(0);
        if current >= item.enqueued_interest {
            inner.queue.push_back((current, item.address));
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<Address>, CacheError> {
        let inner = self.inner.lock().await;
        Ok(inner.servers.iter().copied().collect())
    }

    async fn search(
        &self,
        include: &[String],
        exclude: &[String],
    ) -> Result<BTreeSet<Address>, CacheError> {
        if include.is_empty() {
            return Ok(BTreeSet::new());
        }
        let inner = self.inner.lock().await;

        let mut result: Option<BTreeSet<Address>> = None;
        for tag in include {
            let members = inner.tag_index.get(tag).cloned().unwrap_or_default();
            result = Some(match result {
                None => members,
                Some(acc) => acc.intersection(&members).copied().collect(),
            });
        }
        let mut result = result.unwrap_or_default();

        for tag in exclude {
            if let Some(members) = inner.tag_index.get(tag) {
                for addr in members {
                    result.remove(addr);
                }
            }
        }

        Ok(result)
    }

    fn notifier(&self) -> Self::Notifier {
        FakeNotifier::new(self.events_tx.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn addr(last_octet: u8, port: u16) -> Address {
        Address::new(Ipv4Addr::new(192, 0, 2, last_octet), port).unwrap()
    }

    #[tokio::test]
    async fn get_on_unknown_address_is_all_null() {
        let cache = FakeCache::new();
        let status = cache.get(addr(1, 27015)).await.unwrap();
        assert_eq!(status.interest, 0);
        assert!(status.name.is_none());
        assert!(status.tags.is_empty());
    }

    #[tokio::test]
    async fn subscribe_then_interesting_round_trips() {
        let cache = FakeCache::new();
        let a = addr(1, 27015);
        cache.subscribe(a).await.unwrap();
        assert_eq!(cache.interesting().await.unwrap(), a);
        cache.update_interest_queue().await.unwrap();
    }

    #[tokio::test]
    async fn handles_share_backing_store_but_not_active_marker() {
        let base = FakeCache::new();
        let worker_a = base.handle();
        let worker_b = base.handle();

        base.subscribe(addr(1, 27015)).await.unwrap();
        base.subscribe(addr(2, 27015)).await.unwrap();

        // Each worker can have its own active item concurrently, since
        // the marker isn't shared across independent handles.
        worker_a.interesting().await.unwrap();
        worker_b.interesting().await.unwrap();
    }

    #[tokio::test]
    async fn interesting_twice_without_update_is_an_error() {
        let cache = FakeCache::new();
        cache.subscribe(addr(1, 27015)).await.unwrap();
        cache.subscribe(addr(2, 27015)).await.unwrap();
        cache.interesting().await.unwrap();
        assert!(matches!(
            cache.interesting().await,
            Err(InterestingError::Cache(CacheError::ActiveItemAlreadySet))
        ));
    }

    #[tokio::test]
    async fn search_set_algebra() {
        let cache = FakeCache::new();
        let a1 = addr(1, 1);
        let a2 = addr(2, 1);
        let a3 = addr(3, 1);

        for (a, tags) in [
            (a1, vec!["x", "y"]),
            (a2, vec!["x", "z"]),
            (a3, vec!["y", "z"]),
        ] {
            let mut status = Status::unknown(a);
            status.tags = tags.into_iter().map(str::to_owned).collect();
            cache.set(status).await.unwrap();
        }

        let include = |tags: &[&str]| tags.iter().map(|t| (*t).to_owned()).collect::<Vec<_>>();

        assert_eq!(
            cache.search(&include(&["x", "y"]), &[]).await.unwrap(),
            BTreeSet::from([a1])
        );
        assert_eq!(
            cache.search(&include(&["x"]), &include(&["y"])).await.unwrap(),
            BTreeSet::from([a2])
        );
        assert_eq!(
            cache.search(&[], &include(&["x"])).await.unwrap(),
            BTreeSet::new()
        );
    }

    #[tokio::test]
    async fn set_does_not_retract_removed_tags_from_existing_matches() {
        let cache = FakeCache::new();
        let a = addr(1, 1);

        let mut status = Status::unknown(a);
        status.tags = BTreeSet::from(["tf2".to_owned(), "mode:cp".to_owned()]);
        cache.set(status.clone()).await.unwrap();

        status.tags.insert("mode:koth".to_owned());
        cache.set(status.clone()).await.unwrap();
        assert!(cache.get(a).await.unwrap().tags.contains("mode:koth"));

        status.tags.remove("mode:koth");
        cache.set(status).await.unwrap();
        assert!(!cache.get(a).await.unwrap().tags.contains("mode:koth"));
    }
}
