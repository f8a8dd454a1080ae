//! The live update stream: a WebSocket forwarding each broadcast message
//! as a text frame.
//!
//! Wire protocol: server frames are `{"type": "location_update", ...}`;
//! the only client frame understood is `{"type": "ping"}`, answered with
//! `{"type": "pong", "timestamp": <ms>}`. Everything else from the client
//! is ignored. Closing the socket deregisters the feed subscription.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use domain::models::BroadcastMessage;

use crate::app::AppState;
use crate::middleware::metrics::record_live_subscribers;
use crate::services::feed::FeedSubscription;

/// Server-to-client frames.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame<'a> {
    LocationUpdate(&'a BroadcastMessage),
    Pong { timestamp: i64 },
}

/// Client-to-server frames.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Ping,
}

/// GET /ws/fleet
pub async fn fleet_stream(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let subscription = state.feed.subscribe();
    let feed = state.feed.clone();
    ws.on_upgrade(move |socket| async move {
        record_live_subscribers(feed.subscriber_count());
        stream_loop(socket, subscription).await;
        record_live_subscribers(feed.subscriber_count());
    })
}

async fn stream_loop(mut socket: WebSocket, mut subscription: FeedSubscription) {
    info!("Live stream client connected");

    loop {
        tokio::select! {
            update = subscription.next() => {
                let Some(message) = update else { break };
                let frame = match serde_json::to_string(&ServerFrame::LocationUpdate(&message)) {
                    Ok(frame) => frame,
                    Err(_) => continue,
                };
                if socket.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = client_reply(&text) {
                            if socket.send(Message::Text(reply)).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    subscription.close();
    info!("Live stream client disconnected");
}

/// Reply for a client text frame, if it warrants one.
fn client_reply(text: &str) -> Option<String> {
    match serde_json::from_str::<ClientFrame>(text) {
        Ok(ClientFrame::Ping) => serde_json::to_string(&ServerFrame::Pong {
            timestamp: Utc::now().timestamp_millis(),
        })
        .ok(),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_elicits_pong() {
        let reply = client_reply(r#"{"type":"ping"}"#).unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["type"], "pong");
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn test_unknown_frame_is_ignored() {
        assert!(client_reply(r#"{"type":"subscribe"}"#).is_none());
        assert!(client_reply("not json at all").is_none());
        assert!(client_reply("{}").is_none());
    }

    #[test]
    fn test_location_update_frame_shape() {
        let message = BroadcastMessage {
            device_id: 4,
            bus_id: Some(7),
            latitude: 45.46,
            longitude: 9.19,
            speed: Some(11.0),
            heading: Some(90.0),
            battery_level: Some(55),
            timestamp: Utc::now(),
        };
        let frame = serde_json::to_string(&ServerFrame::LocationUpdate(&message)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "location_update");
        assert_eq!(value["bus_id"], 7);
        assert_eq!(value["latitude"], 45.46);
    }
}
