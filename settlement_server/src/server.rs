use std::time::Duration;

use actix_cors::Cors;
use actix_web::{
    dev::Server,
    error::{JsonPayloadError, PathError},
    http::KeepAlive,
    middleware::{Logger, NormalizePath},
    web,
    web::ServiceConfig,
    App,
    HttpRequest,
    HttpServer,
};
use log::*;
use settlement_engine::{NegotiationApi, NotificationHub, SettlementManagement, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        CreateSettlementRoute,
        ListSettlementsRoute,
        RespondToSettlementRoute,
        SettlementByIdRoute,
        UpdateSettlementRoute,
    },
    ws::{general_feed, settlement_feed},
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::create_and_migrate(&config.database_url, config.max_db_connections).await?;
    info!("🚀️ Connected to {}", db.url());
    let hub = NotificationHub::new(config.subscriber_buffer);
    let srv = create_server_instance(config, db, hub)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Builds the HTTP server. Every worker gets its own [`NegotiationApi`], but they all share the database pool and the
/// notification hub, so a subscriber connected to one worker hears about writes made on any other.
pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    hub: NotificationHub,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let api = NegotiationApi::new(db.clone(), hub.clone());
        let cors = if config.cors_permissive { Cors::permissive() } else { Cors::default() };
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("settlement::access_log"))
            .wrap(cors)
            .wrap(NormalizePath::trim())
            .configure(configure_app(api, hub.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the shared state and every route of the service.
pub fn configure_app<B>(api: NegotiationApi<B>, hub: NotificationHub) -> impl FnOnce(&mut ServiceConfig)
where B: SettlementManagement + 'static {
    move |cfg| {
        cfg.app_data(web::Data::new(api))
            .app_data(web::Data::new(hub))
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::PathConfig::default().error_handler(path_error))
            .service(health)
            .service(general_feed)
            .service(settlement_feed)
            .service(CreateSettlementRoute::<B>::new())
            .service(ListSettlementsRoute::<B>::new())
            .service(SettlementByIdRoute::<B>::new())
            .service(UpdateSettlementRoute::<B>::new())
            .service(RespondToSettlementRoute::<B>::new());
    }
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting request body. {err}");
    ServerError::InvalidRequestBody(err.to_string()).into()
}

fn path_error(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting request path. {err}");
    ServerError::InvalidRequestPath(err.to_string()).into()
}
