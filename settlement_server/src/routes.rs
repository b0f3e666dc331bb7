//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a few lines long belong in a separate module.
//!
//! Each worker thread processes its requests sequentially, so handlers must never block the thread. Database access
//! goes through the async [`NegotiationApi`], which yields to the worker while it waits.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use settlement_engine::{
    db_types::{Amount, SettlementSnapshot},
    negotiation_objects::{AmountRevision, SettlementResponse},
    NegotiationApi,
    SettlementManagement,
    ValidationError,
};

use crate::{
    data_objects::{NewSettlementParams, RespondParams, UpdateSettlementParams},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $bound:ident) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $bound + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Settlements  ----------------------------------------------------
route!(create_settlement => Post "/settlements" impl SettlementManagement);
/// Opens a new negotiation. The response is the settlement summary, including the id assigned to it.
pub async fn create_settlement<B: SettlementManagement>(
    body: web::Json<NewSettlementParams>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received new settlement request for {}", body.amount);
    let amount = Amount::try_from(body.amount).map_err(ValidationError::from)?;
    let settlement = api.propose(amount).await?;
    Ok(HttpResponse::Ok().json(settlement.summary()))
}

route!(list_settlements => Get "/settlements" impl SettlementManagement);
pub async fn list_settlements<B: SettlementManagement>(
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received settlement list request");
    let settlements = api.settlements().await?;
    let snapshots = settlements.iter().map(|s| s.snapshot()).collect::<Vec<SettlementSnapshot>>();
    Ok(HttpResponse::Ok().json(snapshots))
}

route!(settlement_by_id => Get "/settlements/{id}" impl SettlementManagement);
pub async fn settlement_by_id<B: SettlementManagement>(
    path: web::Path<i64>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ Received request for settlement #{id}");
    let settlement = api.settlement(id).await?;
    Ok(HttpResponse::Ok().json(settlement.snapshot()))
}

route!(respond_to_settlement => Post "/settlements/{id}/respond" impl SettlementManagement);
/// Records the counterparty's response. Connected general subscribers receive the resulting snapshot.
pub async fn respond_to_settlement<B: SettlementManagement>(
    path: web::Path<i64>,
    body: web::Json<RespondParams>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let params = body.into_inner();
    trace!("💻️ Received response for settlement #{id}: {params:?}");
    let response = SettlementResponse::new(params.accepted, params.new_amount)?;
    let settlement = api.respond(id, response).await.map_err(|e| {
        debug!("💻️ Could not record response for settlement #{id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(settlement.snapshot()))
}

route!(update_settlement => Put "/settlements/{id}" impl SettlementManagement);
/// Revises the amount on the table. Subscribers of the settlement's own channel receive the resulting summary.
///
/// The request is rejected with `409 Conflict` if the counterparty responded after `last_seen`.
pub async fn update_settlement<B: SettlementManagement>(
    path: web::Path<i64>,
    body: web::Json<UpdateSettlementParams>,
    api: web::Data<NegotiationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    let params = body.into_inner();
    trace!("💻️ Received revision for settlement #{id}: {params:?}");
    let revision = AmountRevision::from_wire(params.amount, &params.last_seen)?;
    let settlement = api.revise(id, revision).await.map_err(|e| {
        debug!("💻️ Could not revise settlement #{id}. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(settlement.summary()))
}
