// Event listing domain types
//
// These types represent a sellable event and its ticket tiers.
// Used by both API and storage crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Event listing status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Draft,
    Published,
    Cancelled,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "draft"),
            EventStatus::Published => write!(f, "published"),
            EventStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<&str> for EventStatus {
    fn from(s: &str) -> Self {
        match s {
            "published" => EventStatus::Published,
            "cancelled" => EventStatus::Cancelled,
            _ => EventStatus::Draft,
        }
    }
}

/// EventListing - a sellable event with a finite capacity pool
///
/// The event-level `capacity`/`sold` pair is used when tickets are issued
/// without a tier; tiered sales track capacity per tier instead. `sold`
/// counters only ever increase; refunds compensate through the money ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct EventListing {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    /// Flat ticket price in cents, used when a ticket has no tier
    pub price_cents: i64,
    /// Event-level allocation; None = unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    pub sold: i32,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventListing {
    /// Whether tickets may currently be issued against this event
    pub fn is_bookable(&self) -> bool {
        self.status == EventStatus::Published
    }
}

/// TicketTier - a named ticket category with its own price and capacity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct TicketTier {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    /// Tier allocation; None = unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<i32>,
    pub sold: i32,
    pub created_at: DateTime<Utc>,
}
