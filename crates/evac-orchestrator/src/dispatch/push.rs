use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::Utc;
use evac_models::{Envelope, PushEvent, RegistrationConfirmed, RegistrationError};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{instrument, trace, warn};

use crate::state::presence::SubscriberId;
use crate::state::AppState;

const CHANNEL_CAPACITY: usize = 4096;

/// Room-based pub/sub abstraction over a `tokio::sync::broadcast` channel.
/// True per-room delivery isn't native to broadcast, so every connection
/// filters incoming `FloorRoutes` events against the floor it joined;
/// `RouteUpdate` (the legacy global event) is forwarded unconditionally.
pub struct EventBus {
    sender: broadcast::Sender<PushEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        EventBus { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PushEvent> {
        self.sender.subscribe()
    }

    /// Targeted emission under event name `floor-routes`.
    pub fn emit_to_floor(&self, envelope: Envelope) {
        self.dispatch(PushEvent::FloorRoutes(envelope));
    }

    /// Global emission under the legacy `route_update` event name. Kept
    /// for compatibility; new clients should ignore it.
    pub fn emit_global(&self, envelope: Envelope) {
        self.dispatch(PushEvent::RouteUpdate(envelope));
    }

    fn dispatch(&self, event: PushEvent) {
        match self.sender.send(event) {
            Ok(subscriber_count) => trace!(subscriber_count, "event dispatched"),
            Err(_) => trace!("event dispatched with zero subscribers"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct JoinRequest {
    #[serde(rename = "floorId")]
    floor_id: String,
}

pub async fn establish_uplink(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

#[instrument(skip(socket, state))]
async fn handle_connection(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let subscriber = SubscriberId::new();

    // First message must be a join request; anything else disconnects.
    let Some(Ok(Message::Text(raw))) = stream.next().await else {
        return;
    };

    let joined_floor_id = match serde_json::from_str::<JoinRequest>(&raw) {
        Ok(req) => req.floor_id,
        Err(_) => {
            send_registration_error(&mut sink, "malformed join request").await;
            return;
        }
    };

    let floor = match state.floors.get(&joined_floor_id).await {
        Ok(Some(floor)) => floor,
        Ok(None) => {
            warn!(floor_id = %joined_floor_id, "join rejected: unknown floor");
            send_registration_error(&mut sink, "unknown floorId").await;
            return;
        }
        Err(e) => {
            warn!(error = %e, "join rejected: store unavailable");
            send_registration_error(&mut sink, "store unavailable").await;
            return;
        }
    };

    state
        .presence
        .join(subscriber, floor.floor_id.clone(), floor.name.clone())
        .await;

    let confirmation = PushEvent::RegistrationConfirmed(RegistrationConfirmed {
        floor_id: floor.floor_id.clone(),
        floor_name: floor.name.clone(),
        start_points: floor.active_screen_node_ids(),
        exit_points: floor.exit_points.clone(),
        ts: Utc::now(),
    });
    send_event(&mut sink, &confirmation).await;

    let mut receiver = state.event_bus.subscribe();
    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => continue,
                }
            }
            event = receiver.recv() => {
                match event {
                    Ok(event @ PushEvent::FloorRoutes(ref envelope)) if envelope.floor_id == joined_floor_id => {
                        send_event(&mut sink, &event).await;
                    }
                    Ok(event @ PushEvent::RouteUpdate(_)) => {
                        send_event(&mut sink, &event).await;
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber lagged behind event bus; dropping backlog");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    state.presence.leave(subscriber).await;
}

async fn send_event(sink: &mut futures_util::stream::SplitSink<WebSocket, Message>, event: &PushEvent) {
    if let Ok(text) = serde_json::to_string(event) {
        let _ = sink.send(Message::Text(text)).await;
    }
}

async fn send_registration_error(sink: &mut futures_util::stream::SplitSink<WebSocket, Message>, message: &str) {
    let event = PushEvent::RegistrationError(RegistrationError {
        message: message.to_string(),
        ts: Utc::now(),
    });
    send_event(sink, &event).await;
}
