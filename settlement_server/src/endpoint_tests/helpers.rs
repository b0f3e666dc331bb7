use actix_web::{http::StatusCode, middleware::NormalizePath, test, test::TestRequest, App};
use log::debug;
use serde_json::Value;
use settlement_engine::{
    test_utils::prepare_env::{prepare_test_env, random_db_path, tear_down},
    NegotiationApi,
    NotificationHub,
    SettlementManagement,
    SqliteDatabase,
};

use crate::server::configure_app;

/// Runs a single request through a freshly configured app backed by `api`.
pub async fn send<B>(api: NegotiationApi<B>, hub: NotificationHub, req: TestRequest) -> (StatusCode, String)
where B: SettlementManagement + 'static {
    let app = App::new().wrap(NormalizePath::trim()).configure(configure_app(api, hub));
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let body = String::from_utf8_lossy(&body).into_owned();
    debug!("Response: {status} {body}");
    (status, body)
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response was not JSON ({e}): {body}"))
}

/// A server backed by a throwaway SQLite database. State persists between requests.
pub struct TestServer {
    db: SqliteDatabase,
    hub: NotificationHub,
}

impl TestServer {
    pub async fn new() -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        Self { db, hub: NotificationHub::default() }
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    pub async fn request(&self, req: TestRequest) -> (StatusCode, String) {
        let api = NegotiationApi::new(self.db.clone(), self.hub.clone());
        send(api, self.hub.clone(), req).await
    }

    /// Like [`Self::request`], but leaves the body unread. Upgraded connections stream their body indefinitely.
    pub async fn request_status(&self, req: TestRequest) -> StatusCode {
        let api = NegotiationApi::new(self.db.clone(), self.hub.clone());
        let app = App::new().wrap(NormalizePath::trim()).configure(configure_app(api, self.hub.clone()));
        let service = test::init_service(app).await;
        test::call_service(&service, req.to_request()).await.status()
    }

    /// Serves the app on a real socket, sharing this server's database and hub. Needed for WebSocket clients.
    pub fn start_live(&self) -> actix_test::TestServer {
        let db = self.db.clone();
        let hub = self.hub.clone();
        actix_test::start(move || {
            let api = NegotiationApi::new(db.clone(), hub.clone());
            App::new().wrap(NormalizePath::trim()).configure(configure_app(api, hub.clone()))
        })
    }

    pub async fn request_json(&self, req: TestRequest) -> (StatusCode, Value) {
        let (status, body) = self.request(req).await;
        (status, json(&body))
    }

    pub async fn tear_down(self) {
        tear_down(self.db).await;
    }
}
