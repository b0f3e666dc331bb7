//! WebSocket notification feeds
//!
//! * `/ws/general` receives a settlement snapshot every time any settlement is responded to.
//! * `/ws/{id}` receives a settlement summary every time settlement `id` is revised.
//!
//! Feeds are one-way. Anything a client sends, besides pings and close frames, is ignored. The subscription is removed
//! from the hub as soon as the connection closes or a send fails.
use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use futures::StreamExt;
use log::*;
use settlement_engine::{
    events::{Channel, Subscription},
    NotificationHub,
};

use crate::errors::ServerError;

#[get("/ws/general")]
pub async fn general_feed(
    req: HttpRequest,
    body: web::Payload,
    hub: web::Data<NotificationHub>,
) -> Result<HttpResponse, ServerError> {
    open_feed(req, body, hub.get_ref().clone(), Channel::General).await
}

#[get("/ws/{id:\\d+}")]
pub async fn settlement_feed(
    req: HttpRequest,
    body: web::Payload,
    path: web::Path<i64>,
    hub: web::Data<NotificationHub>,
) -> Result<HttpResponse, ServerError> {
    open_feed(req, body, hub.get_ref().clone(), Channel::Settlement(path.into_inner())).await
}

async fn open_feed(
    req: HttpRequest,
    body: web::Payload,
    hub: NotificationHub,
    channel: Channel,
) -> Result<HttpResponse, ServerError> {
    let (response, session, messages) = actix_ws::handle(&req, body).map_err(|e| {
        debug!("🔌️ WebSocket upgrade for {channel} failed. {e}");
        ServerError::WebSocketError(e.to_string())
    })?;
    let subscription = hub.subscribe(channel).await;
    info!("🔌️ Subscriber {} connected to {channel}", subscription.id());
    actix_web::rt::spawn(relay(session, messages, subscription, hub));
    Ok(response)
}

/// Forwards notifications to the client until either side goes away.
async fn relay(
    mut session: Session,
    mut messages: MessageStream,
    mut subscription: Subscription,
    hub: NotificationHub,
) {
    let id = subscription.id();
    let reason = loop {
        tokio::select! {
            payload = subscription.recv() => match payload {
                Some(text) => {
                    if session.text(text.to_string()).await.is_err() {
                        debug!("🔌️ Subscriber {id} went away mid-send");
                        break None;
                    }
                },
                None => break None,
            },
            msg = messages.next() => match msg {
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break None;
                    }
                },
                Some(Ok(Message::Close(reason))) => break reason,
                Some(Ok(_)) => trace!("🔌️ Ignoring message from subscriber {id}"),
                Some(Err(e)) => {
                    warn!("🔌️ Protocol error on subscriber {id}'s connection. {e}");
                    break None;
                },
                None => break None,
            },
        }
    };
    hub.unsubscribe(&subscription).await;
    info!("🔌️ Subscriber {id} disconnected from {}", subscription.channel());
    let _ = session.close(reason).await;
}
