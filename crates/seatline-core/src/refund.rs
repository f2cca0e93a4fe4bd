// Refund request domain types
//
// A refund request references exactly one ticket and snapshots the amount at
// request time. Processing is terminal: Pending -> Approved | Rejected, set
// once together with processed_by/processed_at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Refund request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundStatus::Pending => write!(f, "pending"),
            RefundStatus::Approved => write!(f, "approved"),
            RefundStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl From<&str> for RefundStatus {
    fn from(s: &str) -> Self {
        match s {
            "approved" => RefundStatus::Approved,
            "rejected" => RefundStatus::Rejected,
            _ => RefundStatus::Pending,
        }
    }
}

/// Organizer decision on a pending refund request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum RefundDecision {
    Approve,
    Reject,
}

/// RefundRequest - a buyer's request to refund one ticket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RefundRequest {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub event_id: Uuid,
    /// Snapshot of the ticket's price_paid at request time, not recomputed later
    pub amount_cents: i64,
    pub reason: String,
    pub status: RefundStatus,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
