//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::api::dto::{ProductDetailResponse, RefreshResponse};
use crate::domain::{MonitorEvent, ProductId};
use crate::service::MonitorService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and answers each one.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<MonitorEvent>,
    monitor: MonitorService,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_text_message(&text, &mut subs, &monitor).await;
                        if let Some(resp_json) = response
                            && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(event.product_id()) {
                            continue;
                        }
                        let Some(json) = event_message(&event, monitor.clock().now()) else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

fn event_message(event: &MonitorEvent, now: chrono::DateTime<chrono::Utc>) -> Option<String> {
    let payload = serde_json::to_value(event).ok()?;
    let msg = WsMessage::new(
        uuid::Uuid::new_v4().to_string(),
        WsMessageType::Event,
        now,
        payload,
    );
    serde_json::to_string(&msg).ok()
}

/// Handles a text message from the client, returning an optional JSON
/// response.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    monitor: &MonitorService,
) -> Option<String> {
    let now = monitor.clock().now();

    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return serde_json::to_string(&WsMessage::error("", now, 400, "malformed JSON")).ok();
    };
    if msg.msg_type != WsMessageType::Command {
        return serde_json::to_string(&WsMessage::error(msg.id, now, 400, "expected a command"))
            .ok();
    }
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return serde_json::to_string(&WsMessage::error(msg.id, now, 404, "unknown command")).ok();
    };

    let reply = match command {
        WsCommand::Subscribe { product_ids } => {
            let (ids, wildcard) = parse_ids(&product_ids);
            subs.subscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                now,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { product_ids } => {
            let (ids, wildcard) = parse_ids(&product_ids);
            subs.unsubscribe(&ids, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                now,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Refresh { product_id } => {
            let Ok(id) = product_id.parse::<ProductId>() else {
                return serde_json::to_string(&WsMessage::error(msg.id, now, 400, "invalid product id"))
                    .ok();
            };
            match monitor.refresh_now(id).await {
                Ok(report) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    now,
                    serde_json::to_value(RefreshResponse::from(&report)).ok()?,
                ),
                Err(e) => WsMessage::error(msg.id, now, e.error_code(), &e.to_string()),
            }
        }
        WsCommand::GetProduct { product_id } => {
            let Ok(id) = product_id.parse::<ProductId>() else {
                return serde_json::to_string(&WsMessage::error(msg.id, now, 400, "invalid product id"))
                    .ok();
            };
            match monitor.get(id).await {
                Ok(product) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    now,
                    serde_json::to_value(ProductDetailResponse::from(&product)).ok()?,
                ),
                Err(e) => WsMessage::error(msg.id, now, e.error_code(), &e.to_string()),
            }
        }
        WsCommand::GetActivity => WsMessage::new(
            msg.id,
            WsMessageType::Response,
            now,
            serde_json::to_value(monitor.activity()).ok()?,
        ),
    };

    serde_json::to_string(&reply).ok()
}

/// Splits raw ids into parsed product ids and the wildcard flag. Invalid
/// ids are ignored.
fn parse_ids(raw: &[String]) -> (Vec<ProductId>, bool) {
    let wildcard = raw.iter().any(|s| s == "*");
    let ids = raw
        .iter()
        .filter_map(|s| s.parse::<ProductId>().ok())
        .collect();
    (ids, wildcard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ids_separates_wildcard_and_skips_garbage() {
        let id = ProductId::new();
        let (ids, wildcard) =
            parse_ids(&["*".to_string(), id.to_string(), "nope".to_string()]);
        assert!(wildcard);
        assert_eq!(ids, vec![id]);
    }
}
