//! The gateway's axum app: a single `/` route, any other path dropped by
//! axum's default 404 fallback per the spec's "any other path: drop
//! immediately."

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::sync::{Mutex, Notify};

use gsd_cache::{CacheError, StateCache};

use crate::error::WebSocketError;

#[derive(Clone)]
struct AppState<C> {
    cache: C,
    fatal: Arc<Mutex<Option<CacheError>>>,
    notify: Arc<Notify>,
}

/// Observes the first fatal cache error raised by any client connection,
/// so [`serve`] can turn it into a process-ending error the way the spec's
/// `FatalError` propagation policy expects, instead of silently eating it
/// inside a background task.
pub struct FatalSignal {
    fatal: Arc<Mutex<Option<CacheError>>>,
    notify: Arc<Notify>,
}

impl FatalSignal {
    async fn wait(&self) {
        self.notify.notified().await;
    }

    async fn take(&self) -> Option<CacheError> {
        self.fatal.lock().await.take()
    }
}

/// Build the `/` websocket route over `cache`, plus a handle for
/// observing a fatal cache error raised by any connected client.
pub fn router<C>(cache: C) -> (Router, FatalSignal)
where
    C: StateCache + Clone + Send + Sync + 'static,
{
    let fatal = Arc::new(Mutex::new(None));
    let notify = Arc::new(Notify::new());
    let state = AppState {
        cache,
        fatal: fatal.clone(),
        notify: notify.clone(),
    };
    let app = Router::new()
        .route("/", get(ws_handler::<C>))
        .with_state(state);
    (app, FatalSignal { fatal, notify })
}

async fn ws_handler<C>(ws: WebSocketUpgrade, State(state): State<AppState<C>>) -> Response
where
    C: StateCache + Clone + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| async move {
        if let Err(error) = crate::client::run(socket, state.cache).await {
            tracing::error!(%error, "client connection ended with a fatal cache error");
            let mut slot = state.fatal.lock().await;
            if slot.is_none() {
                *slot = Some(error);
            }
            drop(slot);
            state.notify.notify_one();
        }
    })
}

/// Bind `addr` and serve the gateway until a shutdown signal (Ctrl-C or
/// SIGTERM) or a fatal cache error from any client connection — whichever
/// comes first.
pub async fn serve<C>(addr: SocketAddr, cache: C) -> Result<(), WebSocketError>
where
    C: StateCache + Clone + Send + Sync + 'static,
{
    let (app, fatal) = router(cache);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "websocket gateway listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(&fatal))
        .await?;

    match fatal.take().await {
        Some(error) => Err(WebSocketError::Cache(error)),
        None => Ok(()),
    }
}

async fn shutdown_signal(fatal: &FatalSignal) {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received Ctrl+C, shutting down"); }
        () = terminate => { tracing::info!("received SIGTERM, shutting down"); }
        () = fatal.wait() => { tracing::error!("fatal cache error from a client connection, shutting down"); }
    }
}
