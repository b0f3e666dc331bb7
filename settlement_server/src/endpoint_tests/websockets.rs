use std::{fmt::Debug, time::Duration};

use actix_web::{http::StatusCode, test::TestRequest};
use awc::ws;
use futures::{SinkExt, Stream, StreamExt};
use serde_json::{json, Value};
use settlement_engine::{events::Channel, NotificationHub};

use super::helpers::TestServer;

fn upgrade_request(uri: &str) -> TestRequest {
    TestRequest::get()
        .uri(uri)
        .insert_header(("upgrade", "websocket"))
        .insert_header(("connection", "Upgrade"))
        .insert_header(("sec-websocket-version", "13"))
        .insert_header(("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ=="))
}

/// Waits for the next text frame on the feed.
async fn next_text<S, E>(feed: &mut S) -> Value
where
    S: Stream<Item = Result<ws::Frame, E>> + Unpin,
    E: Debug,
{
    let frame = tokio::time::timeout(Duration::from_secs(5), feed.next())
        .await
        .expect("Timed out waiting for a notification")
        .expect("Feed closed")
        .expect("WebSocket protocol error");
    match frame {
        ws::Frame::Text(bytes) => serde_json::from_slice(&bytes).expect("Notification was not JSON"),
        other => panic!("Expected a text frame, got {other:?}"),
    }
}

/// Disconnects are handled on the server's own thread, so give it a moment to deregister the subscriber.
async fn wait_for_subscribers(hub: &NotificationHub, channel: Channel, expected: usize) {
    for _ in 0..250 {
        if hub.subscriber_count(channel).await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{channel} still has {} subscribers, expected {expected}", hub.subscriber_count(channel).await);
}

#[actix_web::test]
async fn feeds_accept_websocket_upgrades() {
    let server = TestServer::new().await;
    let status = server.request_status(upgrade_request("/ws/general")).await;
    assert_eq!(status, StatusCode::SWITCHING_PROTOCOLS);
    let status = server.request_status(upgrade_request("/ws/12")).await;
    assert_eq!(status, StatusCode::SWITCHING_PROTOCOLS);
    server.tear_down().await;
}

#[actix_web::test]
async fn plain_requests_to_feeds_are_rejected() {
    let server = TestServer::new().await;
    let (status, body) = server.request(TestRequest::get().uri("/ws/general")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("WebSocket handshake failed"));
    let status = server.request_status(upgrade_request("/ws/not-a-number")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}

#[actix_web::test]
async fn general_feed_relays_responses_until_closed() {
    let _ = env_logger::try_init();
    let server = TestServer::new().await;
    let mut live = server.start_live();
    let mut res = live.post("/settlements").send_json(&json!({ "amount": 100 })).await.expect("Create failed");
    assert_eq!(res.status(), StatusCode::OK);
    let id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let mut feed = live.ws_at("/ws/general").await.expect("Could not connect to /ws/general");
    assert_eq!(server.hub().subscriber_count(Channel::General).await, 1);

    let mut res = live
        .post(format!("/settlements/{id}/respond"))
        .send_json(&json!({ "accepted": false, "new_amount": 80.5 }))
        .await
        .expect("Respond failed");
    assert_eq!(res.status(), StatusCode::OK);
    let snapshot = res.json::<Value>().await.unwrap();
    assert_eq!(snapshot, json!({ "id": id, "amount": 80.5, "status": "disputed", "counter_offered": true }));
    assert_eq!(next_text(&mut feed).await, snapshot);

    let res = live.post(format!("/settlements/{id}/respond")).send_json(&json!({ "accepted": true })).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(next_text(&mut feed).await["status"], "agreed");

    feed.send(ws::Message::Close(None)).await.expect("Could not send close frame");
    wait_for_subscribers(server.hub(), Channel::General, 0).await;
    drop(live);
    server.tear_down().await;
}

#[actix_web::test]
async fn settlement_feed_relays_revisions_until_dropped() {
    let _ = env_logger::try_init();
    let server = TestServer::new().await;
    let mut live = server.start_live();
    let mut res = live.post("/settlements").send_json(&json!({ "amount": 50 })).await.expect("Create failed");
    let id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let mut feed = live.ws_at(&format!("/ws/{id}")).await.expect("Could not connect to the settlement feed");
    assert_eq!(server.hub().subscriber_count(Channel::Settlement(id)).await, 1);
    assert_eq!(server.hub().active_settlement_channels().await, 1);

    let mut res = live
        .put(format!("/settlements/{id}"))
        .send_json(&json!({ "amount": 60.25, "last_seen": "2000-01-01T00:00:00.000Z" }))
        .await
        .expect("Update failed");
    assert_eq!(res.status(), StatusCode::OK);
    let summary = res.json::<Value>().await.unwrap();
    assert_eq!(summary, json!({ "id": id, "amount": 60.25, "status": "pending" }));
    assert_eq!(next_text(&mut feed).await, summary);

    // Dropping the connection without a close frame also deregisters the subscriber
    drop(feed);
    wait_for_subscribers(server.hub(), Channel::Settlement(id), 0).await;
    assert_eq!(server.hub().active_settlement_channels().await, 0);
    drop(live);
    server.tear_down().await;
}
