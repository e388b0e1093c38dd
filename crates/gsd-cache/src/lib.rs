//! The Redis-backed state cache: server statuses, the tag reverse-index,
//! the interest queue, and the pub/sub notifier.
//!
//! [`StateCache`] is the contract every other crate programs against;
//! [`RedisCache`] is the only production implementation. Tests use
//! `gsd-test-utils::FakeCache` instead of standing up a Redis server.

mod error;
mod keys;
mod notifier;
mod redis_cache;

pub use error::{CacheError, InterestingError, NotifierError};
pub use notifier::{NotificationKind, Notifier};
pub use redis_cache::RedisCache;

use std::collections::BTreeSet;

use gsd_protocol::{Address, Status};

/// The watch/publish half of a cache handle, factored out as its own
/// trait so test doubles can supply an in-memory notifier instead of a
/// redis pub/sub connection.
///
/// `#[async_trait]` boxes each method's future as `Send`, since plain
/// async-fn-in-trait doesn't leak that auto-trait and `gsd_websocket`
/// spawns `watch()` on a generic `N: CacheNotifier` with `tokio::spawn`.
#[async_trait::async_trait]
pub trait CacheNotifier: Send {
    async fn notify_server(&mut self, addr: Address) -> Result<(), NotifierError>;
    async fn notify_tag(&mut self, tag: &str, addr: Address) -> Result<(), NotifierError>;
    async fn watch_server(&mut self, addr: Address) -> Result<(), NotifierError>;
    async fn unwatch_server(&mut self, addr: Address) -> Result<(), NotifierError>;
    async fn watch_tag(&mut self, tag: &str) -> Result<(), NotifierError>;
    async fn unwatch_tag(&mut self, tag: &str) -> Result<(), NotifierError>;
    async fn watch(&mut self) -> Result<(NotificationKind, Address), NotifierError>;
}

/// Asynchronous, concurrent-safe access to every known server's status,
/// the tag reverse-index, and the interest queue.
///
/// `interesting()` and `update_interest_queue()` are paired: a handle may
/// have at most one "active" popped item at a time. Calling `interesting`
/// twice without an intervening `update_interest_queue` is a programming
/// error ([`CacheError::ActiveItemAlreadySet`]).
///
/// `#[async_trait]` boxes each method's future as `Send`, for the same
/// reason as [`CacheNotifier`]: `gsd_poller::run` spawns `all()`/
/// `interesting()`/etc. on a generic `C: StateCache` with
/// `JoinSet::spawn`, which requires a provably-`Send` future.
#[async_trait::async_trait]
pub trait StateCache: Send + Sync {
    /// The notifier type this cache hands out from [`StateCache::notifier`].
    type Notifier: CacheNotifier;

    /// Add `addr` to the authoritative server set if absent. Returns
    /// `true` iff it was newly inserted. Idempotent.
    async fn ensure(&self, addr: Address) -> Result<bool, CacheError>;

    /// Read the hash, tag set and interest counter for `addr` in one
    /// logical operation. Never fails for an address that has never been
    /// observed — returns a [`Status`] with all-null fields instead.
    async fn get(&self, addr: Address) -> Result<Status, CacheError>;

    /// Atomically replace `addr`'s status and tag set, publishing
    /// notifications for the refreshed status and for each newly-applied
    /// tag. The `interest` field of `status` is ignored; interest is
    /// owned by [`StateCache::subscribe`].
    async fn set(&self, status: Status) -> Result<(), CacheError>;

    /// Atomically increment `addr`'s interest counter and enqueue
    /// `(new_interest, addr)`. Returns the new interest value.
    async fn subscribe(&self, addr: Address) -> Result<u64, CacheError>;

    /// Pop the head of the interest queue. Marks the popped item active
    /// on this handle until [`StateCache::update_interest_queue`] is
    /// called.
    async fn interesting(&self) -> Result<Address, InterestingError>;

    /// Re-enqueue the active item iff its address's current interest is
    /// still at least the interest it was enqueued with; otherwise drop
    /// it. Clears the active marker either way.
    async fn update_interest_queue(&self) -> Result<(), CacheError>;

    /// Every address in the authoritative set. Finite; safe to call
    /// concurrently with writers.
    async fn all(&self) -> Result<Vec<Address>, CacheError>;

    /// `(∩ tags/<t> for t in include) \ (∪ tags/<t> for t in exclude)`.
    /// An empty `include` always yields an empty result.
    async fn search(
        &self,
        include: &[String],
        exclude: &[String],
    ) -> Result<BTreeSet<Address>, CacheError>;

    /// A fresh, independent notifier backed by its own connection.
    fn notifier(&self) -> Self::Notifier;
}
