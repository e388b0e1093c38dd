//! A2S (Source-engine UDP query protocol) access for the poller.
//!
//! The protocol itself is an external library contract (the `a2s` crate);
//! this crate only adapts its blocking API onto `tokio` and reshapes its
//! responses into the tagged-struct-plus-overflow shape the rest of the
//! system expects.

mod error;
mod querier;
mod types;

pub use error::PollError;
pub use querier::{query, A2sQueryResult, QUERY_TIMEOUT};
pub use types::{A2sInfo, A2sPlayerEntry, A2sPlayers, A2sRules};
