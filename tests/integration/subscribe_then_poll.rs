//! Spec §8 "subscribe then poll": a client subscribes to an address it
//! doesn't yet know anything about, the poller picks it up off the
//! interest queue and writes a fresh status, and the client's existing
//! connection receives that status over the socket with no further
//! action on its part.

use std::net::Ipv4Addr;
use std::time::Duration;

use gsd_cache::StateCache;
use gsd_protocol::{Address, AddressEntity, Status, WsMessage};
use gsd_test_utils::{spawn_gateway, FakeCache, WsClient};

#[tokio::test]
async fn subscribing_then_polling_delivers_the_fresh_status() {
    let cache = FakeCache::new();
    let (addr, _gateway) = spawn_gateway(cache.handle()).await;

    let server = Address::new(Ipv4Addr::new(192, 0, 2, 10), 27015).unwrap();
    let mut client = WsClient::connect(&format!("ws://{addr}/"))
        .await
        .expect("the gateway accepts a websocket upgrade");

    client
        .send(&WsMessage::Subscribe(AddressEntity::from(server)))
        .await
        .expect("subscribe frame sends");

    let initial = tokio::time::timeout(Duration::from_secs(2), client.recv())
        .await
        .expect("the gateway replies to subscribe before any poll happens")
        .expect("the reply parses as a WsMessage");
    match initial {
        WsMessage::Status(status) => assert_eq!(status.name, ""),
        other => panic!("expected an initial Status, got {other:?}"),
    }

    // Give the notifier-drain task a moment to process the WatchServer
    // command before the poll result lands, so the notification isn't
    // missed.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut polled = Status::unknown(server);
    polled.name = Some("A Capture the Flag Server".to_owned());
    polled.map = Some("cp_dustbowl".to_owned());
    cache.set(polled).await.expect("a fake cache set never fails");

    let notified = tokio::time::timeout(Duration::from_secs(2), client.recv())
        .await
        .expect("the poll result is pushed to the subscribed client")
        .expect("the reply parses as a WsMessage");
    match notified {
        WsMessage::Status(status) => {
            assert_eq!(status.name, "A Capture the Flag Server");
            assert_eq!(status.map, "cp_dustbowl");
        }
        other => panic!("expected the polled Status, got {other:?}"),
    }
}
