//! Test doubles shared across the workspace's test suites.
//!
//! [`FakeCache`] implements `gsd_cache::StateCache` entirely in memory so
//! integration tests exercise real interest-queue, tag-index and
//! notification semantics without a live Redis server.

mod event;
mod fake_cache;
mod fake_notifier;
mod gateway;
mod ws_client;

pub use fake_cache::FakeCache;
pub use fake_notifier::FakeNotifier;
pub use gateway::spawn_gateway;
pub use ws_client::WsClient;
