//! Spin up a real `gsd_websocket` gateway on a loopback port, for
//! integration tests that drive it with a real [`crate::WsClient`] instead
//! of calling the per-connection state machine directly.

use std::net::SocketAddr;

use gsd_cache::StateCache;

/// Bind a random loopback port, serve `cache` over it, and return the
/// bound address plus a handle to the background accept task. Dropping or
/// aborting the handle tears the gateway down.
pub async fn spawn_gateway<C>(cache: C) -> (SocketAddr, tokio::task::JoinHandle<()>)
where
    C: StateCache + Clone + Send + Sync + 'static,
{
    let (app, _fatal) = gsd_websocket::router(cache);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("binding a loopback port never fails in tests");
    let addr = listener
        .local_addr()
        .expect("a just-bound listener always has a local address");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, handle)
}
