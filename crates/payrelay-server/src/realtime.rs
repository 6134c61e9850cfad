//! WebSocket channel for real-time status pushes.
//!
//! A browser opens `/ws`, sends
//! `{"event":"registerTransaction","transactionId":"..."}` for the payment it
//! is waiting on, and receives `{"event":"paymentStatus",...}` frames when
//! callbacks arrive. Closing the socket unregisters it.

use std::sync::Arc;

use actix_web::{get, web, HttpRequest, HttpResponse};
use actix_ws::{Message, MessageStream, Session};
use payrelay::{ChannelHandle, ConnectionRegistry, StatusPush};
use serde::Deserialize;

use crate::metrics;
use crate::state::AppState;

/// Inbound client events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    RegisterTransaction { transaction_id: String },
}

/// Parse a text frame. Unknown events and malformed JSON yield `None`.
pub fn parse_client_event(text: &str) -> Option<ClientEvent> {
    match serde_json::from_str::<ClientEvent>(text) {
        Ok(ClientEvent::RegisterTransaction { transaction_id })
            if transaction_id.trim().is_empty() =>
        {
            None
        }
        Ok(event) => Some(event),
        Err(_) => None,
    }
}

/// Apply an inbound event for the connection owning `channel`.
pub fn apply_client_event(
    registry: &ConnectionRegistry,
    channel: &ChannelHandle,
    event: ClientEvent,
) {
    match event {
        ClientEvent::RegisterTransaction { transaction_id } => {
            registry.register(transaction_id.trim(), channel.clone());
        }
    }
}

#[get("/ws")]
pub async fn ws(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let (response, session, msg_stream) = actix_ws::handle(&req, body)?;
    let registry = Arc::clone(&state.registry);
    actix_web::rt::spawn(run_session(registry, session, msg_stream));
    Ok(response)
}

async fn run_session(
    registry: Arc<ConnectionRegistry>,
    mut session: Session,
    mut msg_stream: MessageStream,
) {
    let (channel, mut pushes) = ChannelHandle::channel();
    let channel_id = channel.id();
    metrics::LIVE_CHANNELS.inc();
    tracing::info!(channel = %channel_id, "client connected");

    let close_reason = loop {
        tokio::select! {
            msg = msg_stream.recv() => match msg {
                Some(Ok(Message::Text(text))) => match parse_client_event(&text) {
                    Some(event) => apply_client_event(&registry, &channel, event),
                    None => tracing::debug!(
                        channel = %channel_id,
                        frame = %text,
                        "ignoring unrecognized client frame"
                    ),
                },
                Some(Ok(Message::Ping(bytes))) => {
                    if session.pong(&bytes).await.is_err() {
                        break None;
                    }
                }
                Some(Ok(Message::Close(reason))) => break reason,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(channel = %channel_id, error = %e, "websocket protocol error");
                    break None;
                }
                None => break None,
            },
            Some(push) = pushes.recv() => {
                if send_push(&mut session, &push).await.is_err() {
                    break None;
                }
            }
        }
    };

    // One registration is released per disconnect; any other id this
    // channel held is dropped lazily on its next notify.
    let released = registry.unregister(channel_id);
    drop(pushes);
    metrics::LIVE_CHANNELS.dec();
    tracing::info!(
        channel = %channel_id,
        transaction_id = released.as_deref().unwrap_or("<none>"),
        "client disconnected"
    );
    let _ = session.close(close_reason).await;
}

async fn send_push(session: &mut Session, push: &StatusPush) -> Result<(), actix_ws::Closed> {
    let frame = match serde_json::to_string(push) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize status push");
            return Ok(());
        }
    };
    session.text(frame).await
}
