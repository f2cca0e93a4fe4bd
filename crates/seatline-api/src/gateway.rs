// WebSocket gateway: bridges bus rooms onto client connections
//
// The gateway owns connection-to-room membership. Each connection holds one
// broadcast receiver per joined room, merged into a single StreamMap; the
// bus itself never learns which connection is in which room. A connection
// that falls behind a room's buffer loses the oldest envelopes for that
// room only, and the gap is logged.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{StreamExt, StreamMap};

use seatline_core::{Envelope, NotificationBus, Room};

use crate::auth::claims_from_headers;

/// App state for the gateway
#[derive(Clone)]
pub struct AppState {
    pub bus: NotificationBus,
}

impl AppState {
    pub fn new(bus: NotificationBus) -> Self {
        Self { bus }
    }
}

/// Create gateway routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/ws", get(ws_upgrade))
        .with_state(state)
}

/// Control frames sent by the client
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
enum ClientFrame {
    JoinRoom { room: Room },
    LeaveRoom { room: Room },
    Ping,
}

/// Frames sent to the client
#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
enum ServerFrame {
    Joined {
        room: Room,
    },
    Left {
        room: Room,
    },
    Pong,
    Error {
        message: String,
    },
    Envelope {
        room: Room,
        #[serde(flatten)]
        envelope: Envelope,
    },
}

/// GET /v1/ws - Upgrade to a notification WebSocket
///
/// If the trusted identity headers are present the connection starts out
/// subscribed to the caller's own user room; event rooms are joined
/// explicitly with `join-room` frames.
#[utoipa::path(
    get,
    path = "/v1/ws",
    responses(
        (status = 101, description = "Switching to WebSocket")
    ),
    tag = "gateway"
)]
pub async fn ws_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let user_room = claims_from_headers(&headers).map(|c| Room::User(c.user_id));
    ws.on_upgrade(move |socket| handle_socket(socket, state.bus, user_room))
}

async fn handle_socket(mut socket: WebSocket, bus: NotificationBus, user_room: Option<Room>) {
    let mut rooms: StreamMap<Room, BroadcastStream<Envelope>> = StreamMap::new();

    if let Some(room) = user_room {
        let rx = bus.subscribe(room).await;
        rooms.insert(room, BroadcastStream::new(rx));
        tracing::debug!(room = %room, "connection auto-joined its user room");
    }

    loop {
        tokio::select! {
            inbound = socket.recv() => {
                let msg = match inbound {
                    Some(Ok(msg)) => msg,
                    // Read error or clean close; either way the connection is done
                    _ => break,
                };
                match msg {
                    Message::Text(text) => {
                        if handle_frame(&mut socket, &bus, &mut rooms, &text).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    // Axum answers Ping frames itself
                    _ => {}
                }
            }
            outbound = rooms.next(), if !rooms.is_empty() => {
                match outbound {
                    Some((room, Ok(envelope))) => {
                        let frame = ServerFrame::Envelope { room, envelope };
                        if send_frame(&mut socket, &frame).await.is_err() {
                            break;
                        }
                    }
                    Some((room, Err(BroadcastStreamRecvError::Lagged(missed)))) => {
                        tracing::warn!(room = %room, missed, "connection lagged, envelopes dropped");
                    }
                    None => {}
                }
            }
        }
    }

    tracing::debug!("websocket connection closed");
}

async fn handle_frame(
    socket: &mut WebSocket,
    bus: &NotificationBus,
    rooms: &mut StreamMap<Room, BroadcastStream<Envelope>>,
    text: &str,
) -> Result<(), axum::Error> {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(err) => {
            return send_frame(
                socket,
                &ServerFrame::Error {
                    message: format!("unrecognized frame: {err}"),
                },
            )
            .await;
        }
    };

    match frame {
        ClientFrame::JoinRoom { room } => {
            if !rooms.contains_key(&room) {
                let rx = bus.subscribe(room).await;
                rooms.insert(room, BroadcastStream::new(rx));
            }
            send_frame(socket, &ServerFrame::Joined { room }).await
        }
        ClientFrame::LeaveRoom { room } => {
            rooms.remove(&room);
            send_frame(socket, &ServerFrame::Left { room }).await
        }
        ClientFrame::Ping => send_frame(socket, &ServerFrame::Pong).await,
    }
}

async fn send_frame(socket: &mut WebSocket, frame: &ServerFrame) -> Result<(), axum::Error> {
    // Serialization of our own frames cannot fail
    let text = serde_json::to_string(frame).unwrap_or_default();
    socket.send(Message::Text(text)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use seatline_core::DomainEvent;
    use uuid::Uuid;

    #[test]
    fn client_frames_parse() {
        let id = Uuid::now_v7();
        let frame: ClientFrame =
            serde_json::from_str(&format!(r#"{{"op":"join-room","room":"event:{id}"}}"#)).unwrap();
        assert!(matches!(frame, ClientFrame::JoinRoom { room: Room::Event(got) } if got == id));

        let frame: ClientFrame = serde_json::from_str(r#"{"op":"ping"}"#).unwrap();
        assert!(matches!(frame, ClientFrame::Ping));

        assert!(serde_json::from_str::<ClientFrame>(r#"{"op":"shout"}"#).is_err());
    }

    #[test]
    fn envelope_frame_flattens_payload() {
        let event_id = Uuid::now_v7();
        let frame = ServerFrame::Envelope {
            room: Room::Event(event_id),
            envelope: Envelope::event_update(DomainEvent::TicketCheckedIn {
                event_id,
                ticket_id: Uuid::now_v7(),
            }),
        };

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["op"], "envelope");
        assert_eq!(json["room"], format!("event:{event_id}"));
        assert_eq!(json["kind"], "event-update");
    }
}
