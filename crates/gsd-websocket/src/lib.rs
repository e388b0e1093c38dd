//! The WebSocket fan-out gateway: one axum route accepting long-lived
//! client connections, each driven by the three-cooperative-task session
//! in [`client`].

mod client;
mod error;
mod filter;
mod router;

pub use error::WebSocketError;
pub use filter::Filter;
pub use router::{router, serve};
