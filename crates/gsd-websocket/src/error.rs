use thiserror::Error;

/// Failures starting or running the gateway itself, as opposed to a
/// per-client [`gsd_protocol::MessageError`] (which never reaches this far
/// — it's answered with one `error` frame and the connection continues).
#[derive(Debug, Error)]
pub enum WebSocketError {
    #[error("failed to bind the websocket gateway: {0}")]
    Io(#[from] std::io::Error),
    #[error("cache error: {0}")]
    Cache(#[from] gsd_cache::CacheError),
}
