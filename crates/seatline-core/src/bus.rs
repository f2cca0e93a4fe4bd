// In-process notification bus with room-scoped fan-out
//
// One bounded broadcast channel per room, created lazily on first publish or
// subscribe. Delivery is at-most-once with no replay: a subscriber that
// connects after an envelope was published never sees it; the ticket store
// stays the durable source of truth. Within a room, subscribers see
// envelopes in publish order. A slow subscriber falls behind on its own
// receiver (drop-oldest) and never blocks the publisher or its peers.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::events::Envelope;

/// Buffered envelopes per subscriber before drop-oldest kicks in
const ROOM_BUFFER: usize = 256;

/// A named subscription scope: per-user or per-event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Room {
    User(Uuid),
    Event(Uuid),
}

impl std::fmt::Display for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Room::User(id) => write!(f, "user:{id}"),
            Room::Event(id) => write!(f, "event:{id}"),
        }
    }
}

impl FromStr for Room {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, id) = s
            .split_once(':')
            .ok_or_else(|| format!("invalid room: {s}"))?;
        let id = Uuid::parse_str(id).map_err(|_| format!("invalid room id: {s}"))?;
        match scope {
            "user" => Ok(Room::User(id)),
            "event" => Ok(Room::Event(id)),
            _ => Err(format!("unknown room scope: {s}")),
        }
    }
}

impl Serialize for Room {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Room {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Room-scoped publish/subscribe bus
///
/// The bus is the only seam between producers (services) and consumers (the
/// WebSocket gateway); connection-to-room membership lives with the gateway
/// and is never visible here.
pub struct NotificationBus {
    channels: Arc<RwLock<HashMap<Room, broadcast::Sender<Envelope>>>>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Publish an envelope to one room
    ///
    /// Returns the number of subscribers the envelope was handed to. A room
    /// with no subscribers simply drops the envelope; publishing never
    /// blocks on consumer I/O and never fails the caller.
    pub async fn publish(&self, room: Room, envelope: Envelope) -> usize {
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(room)
            .or_insert_with(|| broadcast::channel(ROOM_BUFFER).0);

        match sender.send(envelope) {
            Ok(receivers) => receivers,
            Err(_) => {
                // No live subscribers; at-most-once means this is fine
                tracing::trace!(room = %room, "dropped envelope for empty room");
                0
            }
        }
    }

    /// Subscribe to a room, receiving every envelope published from now on
    ///
    /// Dropping the receiver is the unsubscribe; the channel itself is
    /// reused for later subscribers of the same room.
    pub async fn subscribe(&self, room: Room) -> broadcast::Receiver<Envelope> {
        let mut channels = self.channels.write().await;
        channels
            .entry(room)
            .or_insert_with(|| broadcast::channel(ROOM_BUFFER).0)
            .subscribe()
    }

    /// Number of live subscribers in a room
    pub async fn subscriber_count(&self, room: Room) -> usize {
        self.channels
            .read()
            .await
            .get(&room)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for NotificationBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}
