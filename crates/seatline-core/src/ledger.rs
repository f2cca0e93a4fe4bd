// Money ledger entries
//
// Append-only record of funds owed to an organizer: one Sale entry per issued
// ticket, one negative Refund entry per approved refund. The refund amount is
// the snapshot carried by the refund request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// A granted capacity reservation
///
/// Returned by a successful reserve. It is never rolled back implicitly: a
/// caller that fails downstream of the reservation must hand the token back
/// through `release` to compensate the sold counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub event_id: Uuid,
    pub tier_id: Option<Uuid>,
    pub quantity: i32,
}

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    Sale,
    Refund,
}

impl std::fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEntryKind::Sale => write!(f, "sale"),
            LedgerEntryKind::Refund => write!(f, "refund"),
        }
    }
}

impl From<&str> for LedgerEntryKind {
    fn from(s: &str) -> Self {
        match s {
            "refund" => LedgerEntryKind::Refund,
            _ => LedgerEntryKind::Sale,
        }
    }
}

/// LedgerEntry - one money movement against an event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LedgerEntry {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ticket_id: Uuid,
    /// Positive for sales, negative for refunds
    pub amount_cents: i64,
    pub kind: LedgerEntryKind,
    pub created_at: DateTime<Utc>,
}
