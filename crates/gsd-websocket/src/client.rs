//! The per-connection state machine: three cooperative tasks sharing one
//! client's subscriptions — a reader (dispatches incoming frames), a
//! writer (flushes outgoing messages to the socket), and a notifier-drain
//! (blocks on the client's dedicated `Notifier`, translating cache
//! notifications into outgoing messages). The three terminate together:
//! whichever exits first aborts the other two.

use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};

use gsd_cache::{CacheNotifier, NotificationKind, StateCache};
use gsd_protocol::{Address, MatchEntity, StatusEntity, WsMessage};

use crate::filter::Filter;

/// A request from the reader task to the notifier task to add or drop a
/// watched channel. The notifier task is the sole owner of the `Notifier`,
/// since a redis pub/sub connection can't be driven from two tasks at
/// once; this is how the reader still gets to change what's watched.
enum WatchCommand {
    WatchServer(Address),
    UnwatchServer(Address),
    WatchTag(String),
    UnwatchTag(String),
}

/// Drive one WebSocket connection until the client disconnects or a
/// fatal cache error surfaces. A fatal error is returned so the caller
/// can decide whether it should bring down the whole gateway (per the
/// spec's "cache errors propagate upward and kill the enclosing
/// subcommand" policy) — a malformed client message never reaches this
/// far, it's absorbed and answered with one `error` frame instead.
pub async fn run<C>(socket: WebSocket, cache: C) -> Result<(), gsd_cache::CacheError>
where
    C: StateCache + Clone + Send + Sync + 'static,
{
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<WsMessage>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<WatchCommand>();
    let filter = Arc::new(Mutex::new(Filter::default()));
    let subscribed: Arc<Mutex<HashSet<Address>>> = Arc::new(Mutex::new(HashSet::new()));

    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if ws_tx.send(Message::Text(msg.to_json_string())).await.is_err() {
                break;
            }
        }
    });

    let notifier_cache = cache.clone();
    let notifier_out_tx = out_tx.clone();
    let notifier_filter = filter.clone();
    let notifier = tokio::spawn(drain_notifier(
        cache.notifier(),
        cmd_rx,
        notifier_cache,
        notifier_out_tx,
        notifier_filter,
    ));

    let reader_result = read_loop(
        &mut ws_rx,
        &cache,
        &out_tx,
        &cmd_tx,
        &filter,
        &subscribed,
    )
    .await;

    writer.abort();
    notifier.abort();
    reader_result
}

async fn read_loop<C>(
    ws_rx: &mut (impl futures_util::Stream<Item = Result<Message, axum::Error>> + Unpin),
    cache: &C,
    out_tx: &mpsc::UnboundedSender<WsMessage>,
    cmd_tx: &mpsc::UnboundedSender<WatchCommand>,
    filter: &Arc<Mutex<Filter>>,
    subscribed: &Arc<Mutex<HashSet<Address>>>,
) -> Result<(), gsd_cache::CacheError>
where
    C: StateCache + Send + Sync,
{
    while let Some(frame) = ws_rx.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(error) => {
                tracing::debug!(%error, "websocket receive error, ending connection");
                break;
            }
        };
        match frame {
            Message::Text(text) => {
                handle_text(&text, cache, out_tx, cmd_tx, filter, subscribed).await?;
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }
    Ok(())
}

async fn handle_text<C>(
    text: &str,
    cache: &C,
    out_tx: &mpsc::UnboundedSender<WsMessage>,
    cmd_tx: &mpsc::UnboundedSender<WatchCommand>,
    filter: &Arc<Mutex<Filter>>,
    subscribed: &Arc<Mutex<HashSet<Address>>>,
) -> Result<(), gsd_cache::CacheError>
where
    C: StateCache + Send + Sync,
{
    let message = match WsMessage::parse(text) {
        Ok(message) => message,
        Err(error) => {
            let _ = out_tx.send(WsMessage::error(error.to_string()));
            return Ok(());
        }
    };

    match message {
        WsMessage::Subscribe(entity) => {
            let addr = match entity.to_address() {
                Ok(addr) => addr,
                Err(error) => {
                    let _ = out_tx.send(WsMessage::error(error.to_string()));
                    return Ok(());
                }
            };
            cache.subscribe(addr).await?;
            subscribed.lock().await.insert(addr);
            let _ = cmd_tx.send(WatchCommand::WatchServer(addr));
            let status = cache.get(addr).await?;
            let _ = out_tx.send(WsMessage::Status(StatusEntity::from_status(&status)));
        }
        WsMessage::Unsubscribe(entity) => {
            let addr = match entity.to_address() {
                Ok(addr) => addr,
                Err(error) => {
                    let _ = out_tx.send(WsMessage::error(error.to_string()));
                    return Ok(());
                }
            };
            if subscribed.lock().await.remove(&addr) {
                let _ = cmd_tx.send(WatchCommand::UnwatchServer(addr));
            }
        }
        WsMessage::Query(entity) => {
            let new_include: HashSet<String> = entity.include.iter().cloned().collect();
            let new_exclude: HashSet<String> = entity.exclude.iter().cloned().collect();

            let mut current = filter.lock().await;
            for tag in current.include.iter().filter(|t| !new_include.contains(*t)) {
                let _ = cmd_tx.send(WatchCommand::UnwatchTag(tag.clone()));
            }
            for tag in &new_include {
                if !current.include.contains(tag) {
                    let _ = cmd_tx.send(WatchCommand::WatchTag(tag.clone()));
                }
            }
            current.include = new_include;
            current.exclude = new_exclude;
            drop(current);

            let results = cache.search(&entity.include, &entity.exclude).await?;
            for addr in results {
                let _ = out_tx.send(WsMessage::Match(MatchEntity::from(addr)));
            }
        }
        WsMessage::Status(_) | WsMessage::Match(_) | WsMessage::Error(_) => {
            let _ = out_tx.send(WsMessage::error(
                "this message type is server-to-client only",
            ));
        }
    }
    Ok(())
}

async fn drain_notifier<C, N>(
    mut notifier: N,
    mut cmd_rx: mpsc::UnboundedReceiver<WatchCommand>,
    cache: C,
    out_tx: mpsc::UnboundedSender<WsMessage>,
    filter: Arc<Mutex<Filter>>,
) where
    C: StateCache,
    N: CacheNotifier,
{
    // `notifier.watch()` errors with `NotWatching` until the first
    // `watch_server`/`watch_tag` call commits the notifier to watch mode
    // (see `gsd_cache::Notifier`); track that locally so this loop doesn't
    // poll it — and tear itself down — before the client has subscribed
    // to anything.
    let mut watching = false;
    loop {
        tokio::select! {
            command = cmd_rx.recv() => {
                let Some(command) = command else { break };
                let result = match command {
                    WatchCommand::WatchServer(addr) => notifier.watch_server(addr).await,
                    WatchCommand::UnwatchServer(addr) => notifier.unwatch_server(addr).await,
                    WatchCommand::WatchTag(tag) => notifier.watch_tag(&tag).await,
                    WatchCommand::UnwatchTag(tag) => notifier.unwatch_tag(&tag).await,
                };
                match result {
                    Ok(()) => watching = true,
                    Err(error) => tracing::warn!(%error, "notifier watch command failed"),
                }
            }
            notification = notifier.watch(), if watching => {
                let (kind, addr) = match notification {
                    Ok(pair) => pair,
                    Err(error) => {
                        tracing::debug!(%error, "notifier closed, ending drain task");
                        break;
                    }
                };
                let Ok(status) = cache.get(addr).await else { continue };
                match kind {
                    NotificationKind::Server => {
                        let _ = out_tx.send(WsMessage::Status(StatusEntity::from_status(&status)));
                    }
                    NotificationKind::Tag => {
                        if filter.lock().await.matches(&status) {
                            let _ = out_tx.send(WsMessage::Match(MatchEntity::from(addr)));
                        }
                    }
                }
            }
        }
    }
}
