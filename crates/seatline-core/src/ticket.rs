// Ticket domain types
//
// A ticket is an independent entity per seat (multi-seat purchases create
// several tickets, never one multi-seat record). Lifecycle state and refund
// state are tracked separately: `Void` is the terminal state a ticket enters
// when its refund is approved, distinct from `CheckedIn`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Ticket lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    Issued,
    CheckedIn,
    /// Terminal: the ticket was refunded and can never be used at the door
    Void,
}

impl std::fmt::Display for TicketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketState::Issued => write!(f, "issued"),
            TicketState::CheckedIn => write!(f, "checked_in"),
            TicketState::Void => write!(f, "void"),
        }
    }
}

impl From<&str> for TicketState {
    fn from(s: &str) -> Self {
        match s {
            "checked_in" => TicketState::CheckedIn,
            "void" => TicketState::Void,
            _ => TicketState::Issued,
        }
    }
}

/// Refund state attached to a ticket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RefundState {
    None,
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for RefundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundState::None => write!(f, "none"),
            RefundState::Pending => write!(f, "pending"),
            RefundState::Approved => write!(f, "approved"),
            RefundState::Rejected => write!(f, "rejected"),
        }
    }
}

impl From<&str> for RefundState {
    fn from(s: &str) -> Self {
        match s {
            "pending" => RefundState::Pending,
            "approved" => RefundState::Approved,
            "rejected" => RefundState::Rejected,
            _ => RefundState::None,
        }
    }
}

/// Ticket - one issued seat against an event's capacity pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Ticket {
    pub id: Uuid,
    pub event_id: Uuid,
    /// None = sold at the event's flat price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier_id: Option<Uuid>,
    pub owner_id: Uuid,
    /// Price snapshotted at purchase; later listing-price changes never touch it
    pub price_paid_cents: i64,
    pub purchased_at: DateTime<Utc>,
    pub state: TicketState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked_in_at: Option<DateTime<Utc>>,
    pub refund_state: RefundState,
}
