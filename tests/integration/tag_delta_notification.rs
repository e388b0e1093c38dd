//! Spec §8 "tag delta notification": a client watching a tag is notified
//! when a server gains it, but a later status update that merely drops an
//! unrelated or previously-held tag from a *different* update never
//! retroactively un-notifies the client — tag notifications only ever
//! fire forward, for tags newly applied in that `set`.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::time::Duration;

use gsd_cache::StateCache;
use gsd_protocol::{Address, QueryEntity, Status, WsMessage};
use gsd_test_utils::{spawn_gateway, FakeCache, WsClient};

#[tokio::test]
async fn gaining_a_watched_tag_notifies_and_losing_it_does_not() {
    let cache = FakeCache::new();
    let (addr, _gateway) = spawn_gateway(cache.handle()).await;

    let server = Address::new(Ipv4Addr::new(192, 0, 2, 20), 27015).unwrap();
    let mut client = WsClient::connect(&format!("ws://{addr}/"))
        .await
        .expect("the gateway accepts a websocket upgrade");

    client
        .send(&WsMessage::Query(QueryEntity {
            include: vec!["mode:koth".to_owned()],
            exclude: vec![],
        }))
        .await
        .expect("query frame sends");

    // No results yet, and no reply for an empty search: give the
    // notifier-drain task time to register the watch before the tag is
    // applied.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut status = Status::unknown(server);
    status.tags = BTreeSet::from(["tf2".to_owned(), "mode:koth".to_owned()]);
    cache.set(status.clone()).await.expect("a fake cache set never fails");

    let matched = tokio::time::timeout(Duration::from_secs(2), client.recv())
        .await
        .expect("gaining the watched tag produces a match notification")
        .expect("the reply parses as a WsMessage");
    match matched {
        WsMessage::Match(entity) => {
            assert_eq!(entity.ip, "192.0.2.20");
            assert_eq!(entity.port, 27015);
        }
        other => panic!("expected a Match, got {other:?}"),
    }

    // Drop the watched tag. This must not produce a second notification.
    status.tags.remove("mode:koth");
    cache.set(status).await.expect("a fake cache set never fails");

    let second = tokio::time::timeout(Duration::from_millis(300), client.recv()).await;
    assert!(
        second.is_err(),
        "dropping the tag must not retroactively notify the client"
    );
}
