//! Realtime insert feed over the backend's Phoenix-channel websocket.
//!
//! PROTOCOL
//! ========
//! JSON serializer `vsn=1.0.0`: every frame is an object with `topic`,
//! `event`, `payload`, and `ref`. The client joins
//! `realtime:{schema}:{table}` asking for `postgres_changes` INSERT events,
//! heartbeats on the `phoenix` topic, and leaves with `phx_leave`. Insert
//! notifications carry the full row under `payload.data.record`.
//!
//! Frame building/decoding is plain data and tested natively; the socket loop
//! is gated behind `#[cfg(feature = "hydrate")]`.
//!
//! ERROR HANDLING
//! ==============
//! Undecodable frames and malformed rows are logged and skipped. A rejected
//! join or a dropped socket ends the feed with `StoreEvent::Closed`; there is
//! no reconnect.

#[cfg(test)]
#[path = "realtime_test.rs"]
mod realtime_test;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::net::types::{BackendConfig, RowError, parse_message_row};
use crate::state::chat::ChatMessage;

/// Interval between heartbeats; the server drops sockets silent for ~60s.
pub const HEARTBEAT_INTERVAL_MS: u32 = 25_000;

const PHOENIX_TOPIC: &str = "phoenix";

/// One Phoenix channel frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhoenixFrame {
    pub topic: String,
    pub event: String,
    pub payload: Value,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
}

/// What an incoming frame means to the insert feed.
#[derive(Debug)]
pub enum Incoming {
    /// The channel join was accepted.
    Joined,
    /// The channel join was refused.
    JoinRejected(String),
    /// A row was inserted.
    Insert(Result<ChatMessage, RowError>),
    /// The server closed or errored the channel.
    ChannelClosed(String),
    /// Heartbeat replies, presence, system notices.
    Ignored,
}

/// Websocket endpoint derived from the project URL.
pub fn socket_url(config: &BackendConfig) -> String {
    let base = config.url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_owned()
    };
    format!("{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0", config.anon_key)
}

/// Channel topic for the message table.
pub fn channel_topic(config: &BackendConfig) -> String {
    format!("realtime:{}:{}", config.schema, config.table)
}

/// Join request subscribing to INSERTs on the table only.
pub fn join_frame(config: &BackendConfig, reference: u64) -> PhoenixFrame {
    PhoenixFrame {
        topic: channel_topic(config),
        event: "phx_join".to_owned(),
        payload: json!({
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "INSERT", "schema": config.schema, "table": config.table }
                ],
                "private": false
            },
            "access_token": config.anon_key,
        }),
        reference: Some(reference.to_string()),
    }
}

pub fn heartbeat_frame(reference: u64) -> PhoenixFrame {
    PhoenixFrame {
        topic: PHOENIX_TOPIC.to_owned(),
        event: "heartbeat".to_owned(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

pub fn leave_frame(config: &BackendConfig, reference: u64) -> PhoenixFrame {
    PhoenixFrame {
        topic: channel_topic(config),
        event: "phx_leave".to_owned(),
        payload: json!({}),
        reference: Some(reference.to_string()),
    }
}

/// Classify a frame received on the socket.
///
/// `join_ref` is the reference of our join request; other replies are
/// heartbeat acks and are ignored.
pub fn classify(frame: &PhoenixFrame, topic: &str, join_ref: &str) -> Incoming {
    if frame.topic != topic {
        return Incoming::Ignored;
    }
    match frame.event.as_str() {
        "phx_reply" if frame.reference.as_deref() == Some(join_ref) => {
            let status = frame.payload.get("status").and_then(Value::as_str).unwrap_or_default();
            if status == "ok" {
                Incoming::Joined
            } else {
                Incoming::JoinRejected(reply_reason(&frame.payload))
            }
        }
        "postgres_changes" => {
            let data = frame.payload.get("data");
            let kind = data.and_then(|d| d.get("type")).and_then(Value::as_str);
            match (kind, data.and_then(|d| d.get("record"))) {
                (Some("INSERT"), Some(record)) => Incoming::Insert(parse_message_row(record)),
                _ => Incoming::Ignored,
            }
        }
        // Legacy servers push the change event name directly.
        "INSERT" => match frame.payload.get("record") {
            Some(record) => Incoming::Insert(parse_message_row(record)),
            None => Incoming::Ignored,
        },
        "phx_close" => Incoming::ChannelClosed("channel closed by server".to_owned()),
        "phx_error" => Incoming::ChannelClosed(reply_reason(&frame.payload)),
        _ => Incoming::Ignored,
    }
}

fn reply_reason(payload: &Value) -> String {
    payload
        .get("response")
        .and_then(|r| r.get("reason"))
        .and_then(Value::as_str)
        .or_else(|| payload.get("reason").and_then(Value::as_str))
        .unwrap_or("unknown reason")
        .to_owned()
}

/// Encode a frame for the socket.
///
/// # Errors
///
/// Propagates `serde_json` serialization failures.
pub fn encode(frame: &PhoenixFrame) -> Result<String, serde_json::Error> {
    serde_json::to_string(frame)
}

/// Decode a text frame from the socket.
///
/// # Errors
///
/// Returns the `serde_json` error when the text is not a Phoenix frame.
pub fn decode(text: &str) -> Result<PhoenixFrame, serde_json::Error> {
    serde_json::from_str(text)
}

// =============================================================================
// SOCKET LOOP (browser only)
// =============================================================================

/// Open the websocket, join the table channel, and forward inserts until
/// `stop` fires or the socket ends.
///
/// Resolves once the join is acknowledged; the forwarding loop keeps running
/// as a local task.
#[cfg(feature = "hydrate")]
pub async fn open_insert_feed(
    config: BackendConfig,
    events: futures::channel::mpsc::UnboundedSender<crate::net::store::StoreEvent>,
    stop: futures::channel::oneshot::Receiver<()>,
) -> Result<(), crate::net::store::StoreError> {
    use futures::{FutureExt, SinkExt, StreamExt};
    use gloo_net::websocket::Message;
    use gloo_net::websocket::futures::WebSocket;

    use crate::net::store::{StoreError, StoreEvent};

    let ws = WebSocket::open(&socket_url(&config)).map_err(|e| StoreError::Realtime(e.to_string()))?;
    let (mut write, mut read) = ws.split();

    let topic = channel_topic(&config);
    let mut next_ref: u64 = 1;
    let join_ref = next_ref.to_string();
    let join = encode(&join_frame(&config, next_ref)).map_err(|e| StoreError::Realtime(e.to_string()))?;
    write.send(Message::Text(join)).await.map_err(|e| StoreError::Realtime(e.to_string()))?;

    // Wait for the join reply before reporting the subscription as live.
    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                let Ok(frame) = decode(&text) else { continue };
                match classify(&frame, &topic, &join_ref) {
                    Incoming::Joined => break,
                    Incoming::JoinRejected(reason) | Incoming::ChannelClosed(reason) => {
                        return Err(StoreError::Realtime(reason));
                    }
                    _ => {}
                }
            }
            Some(Ok(Message::Bytes(_))) => {}
            Some(Err(e)) => return Err(StoreError::Realtime(e.to_string())),
            None => return Err(StoreError::Realtime("socket closed during join".to_owned())),
        }
    }

    wasm_bindgen_futures::spawn_local(async move {
        let mut stop = stop.fuse();
        let mut beats = gloo_timers::future::IntervalStream::new(HEARTBEAT_INTERVAL_MS).fuse();
        loop {
            futures::select! {
                _ = stop => {
                    next_ref += 1;
                    if let Ok(leave) = encode(&leave_frame(&config, next_ref)) {
                        let _ = write.send(Message::Text(leave)).await;
                    }
                    let _ = write.close().await;
                    return;
                }
                _ = beats.next() => {
                    next_ref += 1;
                    let Ok(beat) = encode(&heartbeat_frame(next_ref)) else { continue };
                    if write.send(Message::Text(beat)).await.is_err() {
                        let _ = events.unbounded_send(StoreEvent::Closed);
                        return;
                    }
                }
                msg = read.next().fuse() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        let frame = match decode(&text) {
                            Ok(frame) => frame,
                            Err(e) => {
                                leptos::logging::warn!("realtime: undecodable frame: {e}");
                                continue;
                            }
                        };
                        match classify(&frame, &topic, &join_ref) {
                            Incoming::Insert(Ok(msg)) => {
                                if events.unbounded_send(StoreEvent::Inserted(msg)).is_err() {
                                    return;
                                }
                            }
                            Incoming::Insert(Err(e)) => leptos::logging::warn!("realtime: dropping row: {e}"),
                            Incoming::ChannelClosed(reason) => {
                                leptos::logging::warn!("realtime: {reason}");
                                let _ = events.unbounded_send(StoreEvent::Closed);
                                return;
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(Message::Bytes(_))) => {}
                    Some(Err(e)) => {
                        leptos::logging::warn!("realtime: socket error: {e}");
                        let _ = events.unbounded_send(StoreEvent::Closed);
                        return;
                    }
                    None => {
                        let _ = events.unbounded_send(StoreEvent::Closed);
                        return;
                    }
                },
            }
        }
    });

    Ok(())
}
