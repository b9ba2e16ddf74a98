//! WebSocket tests against a live server on an ephemeral port.

#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use common::Harness;
use price_sentinel::app_state::AppState;
use price_sentinel::build_app;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(h: &Harness) -> String {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind ephemeral port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener address");
    };
    let app = build_app(AppState::new(h.service.clone()));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("ws://{addr}/ws")
}

async fn connect(url: &str) -> Client {
    let Ok((client, _)) = connect_async(url).await else {
        panic!("websocket handshake");
    };
    client
}

async fn command(client: &mut Client, id: &str, payload: Value) {
    let msg = json!({ "id": id, "type": "command", "payload": payload });
    if client.send(Message::text(msg.to_string())).await.is_err() {
        panic!("send command");
    }
}

/// Next JSON text frame, failing the test after two seconds of silence.
async fn next_json(client: &mut Client) -> Value {
    loop {
        let Ok(frame) = tokio::time::timeout(Duration::from_secs(2), client.next()).await else {
            panic!("timed out waiting for a frame");
        };
        let Some(Ok(frame)) = frame else {
            panic!("connection closed");
        };
        if let Message::Text(text) = frame {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("frame should be JSON");
            };
            return value;
        }
    }
}

/// Skips frames until an event with the given `event_type` arrives.
async fn next_event(client: &mut Client, event_type: &str) -> Value {
    loop {
        let msg = next_json(client).await;
        if msg["type"] == "event" && msg["payload"]["event_type"] == event_type {
            return msg;
        }
    }
}

#[tokio::test]
async fn wildcard_subscriber_sees_new_products() {
    let h = Harness::new();
    let url = serve(&h).await;
    let mut client = connect(&url).await;

    command(&mut client, "sub-1", json!({ "command": "subscribe", "product_ids": ["*"] })).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["id"], "sub-1");
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["wildcard"], true);

    let product = h.add("Electric Toothbrush", 60.0, 45.0).await;

    let event = next_event(&mut client, "product_added").await;
    assert_eq!(event["payload"]["product_id"], product.id.to_string());
    assert_eq!(event["payload"]["name"], "Electric Toothbrush");
}

#[tokio::test]
async fn unsubscribed_client_receives_no_events() {
    let h = Harness::new();
    let url = serve(&h).await;
    let mut client = connect(&url).await;

    h.add("Hair Dryer", 55.0, 40.0).await;

    command(&mut client, "act-1", json!({ "command": "get_activity" })).await;
    // The command reply must be the first frame: nothing was pushed before it.
    let reply = next_json(&mut client).await;
    assert_eq!(reply["id"], "act-1");
    assert_eq!(reply["payload"][0]["message"], "Now tracking Hair Dryer");
}

#[tokio::test]
async fn get_product_and_errors_over_websocket() {
    let h = Harness::new();
    let product = h.add("Cast Iron Pan", 45.0, 35.0).await;
    let url = serve(&h).await;
    let mut client = connect(&url).await;

    command(
        &mut client,
        "get-1",
        json!({ "command": "get_product", "product_id": product.id.to_string() }),
    )
    .await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["name"], "Cast Iron Pan");

    command(
        &mut client,
        "get-2",
        json!({ "command": "get_product", "product_id": uuid::Uuid::new_v4().to_string() }),
    )
    .await;
    let missing = next_json(&mut client).await;
    assert_eq!(missing["type"], "error");
    assert_eq!(missing["payload"]["code"], 2001);

    if client.send(Message::text("not json")).await.is_err() {
        panic!("send garbage");
    }
    let malformed = next_json(&mut client).await;
    assert_eq!(malformed["type"], "error");
    assert_eq!(malformed["payload"]["code"], 400);
}

#[tokio::test]
async fn refresh_command_streams_price_event_to_product_subscriber() {
    let h = Harness::new();
    let product = h.add("Trail Camera", 130.0, 100.0).await;
    let url = serve(&h).await;
    let mut client = connect(&url).await;

    command(
        &mut client,
        "sub-1",
        json!({ "command": "subscribe", "product_ids": [product.id.to_string()] }),
    )
    .await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["payload"]["count"], 1);

    h.gateway.push_price(95.0);
    command(
        &mut client,
        "ref-1",
        json!({ "command": "refresh", "product_id": product.id.to_string() }),
    )
    .await;

    let event = next_event(&mut client, "price_checked").await;
    assert_eq!(event["payload"]["new_price"], 95.0);
    assert_eq!(event["payload"]["is_deal"], true);
}
