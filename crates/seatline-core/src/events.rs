// Domain events for real-time delivery
//
// DomainEvent describes a committed state change; Envelope is the immutable
// wire record handed to the notification bus. One domain occurrence is
// published once per audience room (buyer's user room, organizer's event
// room) as independent envelopes rather than a single multicast, so payload
// shapes may diverge per audience later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire kind of an envelope, matching the client protocol
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum EnvelopeKind {
    /// Personal notification for a user room
    Notification,
    /// State change on an event, for the organizer dashboard
    EventUpdate,
    /// Operator broadcast to a whole room
    Broadcast,
    /// Rolled-up sales counters for an event room
    LiveStats,
}

impl std::fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeKind::Notification => write!(f, "notification"),
            EnvelopeKind::EventUpdate => write!(f, "event-update"),
            EnvelopeKind::Broadcast => write!(f, "broadcast"),
            EnvelopeKind::LiveStats => write!(f, "live-stats"),
        }
    }
}

/// Events emitted after a committed lifecycle transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Tickets were issued against an event
    TicketsIssued {
        event_id: Uuid,
        owner_id: Uuid,
        ticket_ids: Vec<Uuid>,
        tier_id: Option<Uuid>,
        quantity: u32,
    },

    /// A ticket was checked in at the door
    TicketCheckedIn { event_id: Uuid, ticket_id: Uuid },

    /// A mistaken check-in was reverted
    CheckInReverted { event_id: Uuid, ticket_id: Uuid },

    /// A buyer requested a refund
    RefundRequested {
        event_id: Uuid,
        ticket_id: Uuid,
        request_id: Uuid,
        amount_cents: i64,
    },

    /// An organizer approved a refund; the ticket is now void
    RefundApproved {
        event_id: Uuid,
        ticket_id: Uuid,
        request_id: Uuid,
        amount_cents: i64,
    },

    /// An organizer rejected a refund; the ticket stays usable
    RefundRejected {
        event_id: Uuid,
        ticket_id: Uuid,
        request_id: Uuid,
    },

    /// Current sales counters for a live dashboard
    LiveStats {
        event_id: Uuid,
        sold: i32,
        capacity: Option<i32>,
        checked_in: i64,
    },
}

/// Envelope - immutable record published once per domain occurrence per room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub kind: EnvelopeKind,
    pub payload: DomainEvent,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Wrap a domain event for delivery, stamping the publish time
    pub fn new(kind: EnvelopeKind, payload: DomainEvent) -> Self {
        Self {
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Personal notification envelope (user rooms)
    pub fn notification(payload: DomainEvent) -> Self {
        Self::new(EnvelopeKind::Notification, payload)
    }

    /// Organizer dashboard envelope (event rooms)
    pub fn event_update(payload: DomainEvent) -> Self {
        Self::new(EnvelopeKind::EventUpdate, payload)
    }

    /// Live sales counters envelope (event rooms)
    pub fn live_stats(payload: DomainEvent) -> Self {
        Self::new(EnvelopeKind::LiveStats, payload)
    }
}
