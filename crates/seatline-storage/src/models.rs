// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Event models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub price_cents: i64,
    pub capacity: Option<i32>,
    pub sold: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub organizer_id: Uuid,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub price_cents: i64,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TierRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub allocation: Option<i32>,
    pub sold: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateTier {
    pub event_id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub allocation: Option<i32>,
}

// ============================================
// Ticket models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct TicketRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub tier_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub price_paid_cents: i64,
    pub purchased_at: DateTime<Utc>,
    pub state: String,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub refund_state: String,
}

#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub event_id: Uuid,
    pub tier_id: Option<Uuid>,
    pub owner_id: Uuid,
    pub price_paid_cents: i64,
}

// ============================================
// Refund models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct RefundRequestRow {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub event_id: Uuid,
    pub amount_cents: i64,
    pub reason: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

// ============================================
// Money ledger models
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntryRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub ticket_id: Uuid,
    pub amount_cents: i64,
    pub kind: String,
    pub created_at: DateTime<Utc>,
}
