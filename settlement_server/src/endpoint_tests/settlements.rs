use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{json, Value};
use settlement_engine::{
    db_types::{Amount, Settlement, SettlementSnapshot, SettlementStatus},
    events::Channel,
    NegotiationApi,
    NotificationHub,
    SettlementStoreError,
};

use super::{
    helpers::{json, send, TestServer},
    mocks::MockSettlementStore,
};

fn fresh_last_seen() -> String {
    (Utc::now() + Duration::seconds(1)).format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

async fn propose(server: &TestServer, amount: f64) -> i64 {
    let req = TestRequest::post().uri("/settlements").set_json(json!({ "amount": amount }));
    let (status, body) = server.request_json(req).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_i64().expect("No id in response")
}

async fn respond(server: &TestServer, id: i64, body: Value) -> (StatusCode, Value) {
    let req = TestRequest::post().uri(&format!("/settlements/{id}/respond")).set_json(body);
    server.request_json(req).await
}

async fn update(server: &TestServer, id: i64, amount: f64, last_seen: &str) -> (StatusCode, Value) {
    let req = TestRequest::put()
        .uri(&format!("/settlements/{id}"))
        .set_json(json!({ "amount": amount, "last_seen": last_seen }));
    server.request_json(req).await
}

#[actix_web::test]
async fn health_check() {
    let server = TestServer::new().await;
    let (status, body) = server.request(TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
    server.tear_down().await;
}

#[actix_web::test]
async fn create_and_fetch() {
    let server = TestServer::new().await;
    let req = TestRequest::post().uri("/settlements").set_json(json!({ "amount": 100 }));
    let (status, body) = server.request_json(req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 1, "amount": 100.0, "status": "pending" }));

    let (status, body) = server.request_json(TestRequest::get().uri("/settlements/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 1, "amount": 100.0, "status": "pending", "counter_offered": false }));

    // Trailing slashes are tolerated
    let (status, body) = server.request_json(TestRequest::get().uri("/settlements/1/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 1);
    server.tear_down().await;
}

#[actix_web::test]
async fn any_finite_amount_is_accepted() {
    let server = TestServer::new().await;
    for amount in [33.333, 10.001, 1e17, 100_000_000_000.004, -0.5] {
        let req = TestRequest::post().uri("/settlements").set_json(json!({ "amount": amount }));
        let (status, body) = server.request_json(req).await;
        assert_eq!(status, StatusCode::OK, "{amount} was rejected: {body}");
        assert_eq!(body["amount"].as_f64(), Some(amount));
        let id = body["id"].as_i64().unwrap();

        let (status, body) = respond(&server, id, json!({ "accepted": false, "new_amount": amount / 3.0 })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount"].as_f64(), Some(amount / 3.0));

        let (status, body) = update(&server, id, 0.125, &fresh_last_seen()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount"].as_f64(), Some(0.125));
    }
    server.tear_down().await;
}

#[actix_web::test]
async fn list_settlements_in_creation_order() {
    let server = TestServer::new().await;
    let (status, body) = server.request_json(TestRequest::get().uri("/settlements")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let a = propose(&server, 10.0).await;
    let b = propose(&server, 20.5).await;
    respond(&server, b, json!({ "accepted": false, "new_amount": 15.25 })).await;
    let (status, body) = server.request_json(TestRequest::get().uri("/settlements/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "id": a, "amount": 10.0, "status": "pending", "counter_offered": false },
            { "id": b, "amount": 15.25, "status": "disputed", "counter_offered": true },
        ])
    );
    server.tear_down().await;
}

#[actix_web::test]
async fn counter_offer_then_accept() {
    let server = TestServer::new().await;
    let id = propose(&server, 100.0).await;
    let mut general = server.hub().subscribe(Channel::General).await;

    let (status, body) = respond(&server, id, json!({ "accepted": false, "new_amount": 80 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": id, "amount": 80.0, "status": "disputed", "counter_offered": true }));
    let notification: Value = serde_json::from_str(&general.try_recv().expect("No notification")).unwrap();
    assert_eq!(notification, body);

    // The amount sent with an acceptance is ignored
    let (status, body) = respond(&server, id, json!({ "accepted": true, "new_amount": 5 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": id, "amount": 80.0, "status": "agreed", "counter_offered": false }));
    let notification: Value = serde_json::from_str(&general.try_recv().expect("No notification")).unwrap();
    assert_eq!(notification, body);

    let (status, body) = respond(&server, id, json!({ "accepted": true })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["error"],
        format!("Forbidden. Settlement #{id} has already been agreed upon and cannot be modified")
    );
    let (status, _) = update(&server, id, 50.0, &fresh_last_seen()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(general.try_recv().is_none());
    server.tear_down().await;
}

#[actix_web::test]
async fn counter_offer_requires_an_amount() {
    let server = TestServer::new().await;
    let id = propose(&server, 100.0).await;
    let (status, body) = respond(&server, id, json!({ "accepted": false })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request. A counter-offer must include a new amount");
    let (status, _) = respond(&server, id, json!({ "accepted": false, "new_amount": null })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = server.request_json(TestRequest::get().uri(&format!("/settlements/{id}"))).await;
    assert_eq!(body["status"], "pending");
    server.tear_down().await;
}

#[actix_web::test]
async fn revise_notifies_the_settlement_channel() {
    let server = TestServer::new().await;
    let other = propose(&server, 1.0).await;
    let id = propose(&server, 50.0).await;
    let mut own = server.hub().subscribe(Channel::Settlement(id)).await;
    let mut others = server.hub().subscribe(Channel::Settlement(other)).await;
    let mut general = server.hub().subscribe(Channel::General).await;

    let (status, body) = update(&server, id, 60.0, "2000-01-01T00:00:00.000Z").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": id, "amount": 60.0, "status": "pending" }));
    let notification: Value = serde_json::from_str(&own.try_recv().expect("No notification")).unwrap();
    assert_eq!(notification, body);
    assert!(others.try_recv().is_none());
    assert!(general.try_recv().is_none());
    server.tear_down().await;
}

#[actix_web::test]
async fn stale_revision_is_a_conflict() {
    let server = TestServer::new().await;
    let id = propose(&server, 100.0).await;
    respond(&server, id, json!({ "accepted": false, "new_amount": 80 })).await;

    let (status, body) = update(&server, id, 90.0, "2000-01-01T00:00:00.000Z").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        format!(
            "Conflict. Settlement #{id} has received new responses since you last fetched it. Please refresh to see \
             the new status."
        )
    );
    let (_, body) = server.request_json(TestRequest::get().uri(&format!("/settlements/{id}"))).await;
    assert_eq!(body, json!({ "id": id, "amount": 80.0, "status": "disputed", "counter_offered": true }));

    let (status, body) = update(&server, id, 90.0, &fresh_last_seen()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": id, "amount": 90.0, "status": "pending" }));
    server.tear_down().await;
}

#[actix_web::test]
async fn unknown_settlements_are_not_found() {
    let server = TestServer::new().await;
    let (status, body) = server.request_json(TestRequest::get().uri("/settlements/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "The data was not found. Settlement #42 does not exist");
    let (status, _) = respond(&server, 42, json!({ "accepted": true })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = update(&server, 42, 1.0, &fresh_last_seen()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    server.tear_down().await;
}

#[actix_web::test]
async fn malformed_requests() {
    let server = TestServer::new().await;
    let id = propose(&server, 100.0).await;

    let (status, body) = server.request_json(TestRequest::get().uri("/settlements/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Could not read request path"));

    let req = TestRequest::post().uri("/settlements").set_json(json!({ "amount": "lots" }));
    let (status, body) = server.request_json(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Could not read request body"));

    let (status, body) = update(&server, id, 90.0, "2024-06-01 12:00:00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("last_seen must be a UTC timestamp"));

    let (_, body) = server.request_json(TestRequest::get().uri(&format!("/settlements/{id}"))).await;
    assert_eq!(body["amount"], 100.0);
    server.tear_down().await;
}

#[actix_web::test]
async fn backend_errors_are_server_errors() {
    let _ = env_logger::try_init();
    let mut store = MockSettlementStore::new();
    store.expect_fetch_settlements().returning(|| Err(SettlementStoreError::DatabaseError("disk on fire".into())));
    let hub = NotificationHub::default();
    let api = NegotiationApi::new(store, hub.clone());
    let (status, body) = send(api, hub, TestRequest::get().uri("/settlements")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json(&body),
        json!({ "error": "An error occurred on the backend of the server. Database error: disk on fire" })
    );
}

#[actix_web::test]
async fn persistent_write_contention_is_a_conflict() {
    let _ = env_logger::try_init();
    let created = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let settlement = Settlement {
        id: 7,
        amount: Amount::from(100),
        status: SettlementStatus::Pending,
        counter_offered: false,
        last_responded_at: None,
        revision: 3,
        created_at: created,
        updated_at: created,
    };
    let mut store = MockSettlementStore::new();
    store.expect_fetch_settlement().times(5).returning(move |_| Ok(Some(settlement.clone())));
    store.expect_update_settlement().times(5).returning(|_, revision, _| {
        assert_eq!(revision, 3);
        Ok(None)
    });
    let hub = NotificationHub::default();
    let mut general = hub.subscribe(Channel::General).await;
    let api = NegotiationApi::new(store, hub.clone());
    let req = TestRequest::post().uri("/settlements/7/respond").set_json(json!({ "accepted": true }));
    let (status, body) = send(api, hub, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json(&body)["error"].as_str().unwrap().contains("too many concurrent requests"));
    assert!(general.try_recv().is_none());
}

#[test]
fn snapshot_shape() {
    let snapshot = SettlementSnapshot {
        id: 3,
        amount: Amount::try_from(19.99).unwrap(),
        status: SettlementStatus::Disputed,
        counter_offered: true,
    };
    assert_eq!(
        serde_json::to_value(snapshot).unwrap(),
        json!({ "id": 3, "amount": 19.99, "status": "disputed", "counter_offered": true })
    );
}
