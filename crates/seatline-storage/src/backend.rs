// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use sqlx::PgPool;
use uuid::Uuid;

use seatline_core::{RefundDecision, Reservation, Result};

use crate::memory::InMemoryStore;
use crate::models::*;
use crate::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory store (dev mode)
    InMemory(std::sync::Arc<InMemoryStore>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL
    pub async fn postgres(database_url: &str) -> anyhow::Result<Self> {
        let db = Database::from_url(database_url).await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(std::sync::Arc::new(InMemoryStore::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    /// Get the PostgreSQL pool if using PostgreSQL backend
    /// Returns None for in-memory backend
    pub fn pool(&self) -> Option<&PgPool> {
        match self {
            Self::Postgres(db) => Some(db.pool()),
            Self::InMemory(_) => None,
        }
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEvent) -> Result<EventRow> {
        match self {
            Self::Postgres(db) => db.create_event(input).await,
            Self::InMemory(db) => db.create_event(input).await,
        }
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.get_event(id).await,
            Self::InMemory(db) => db.get_event(id).await,
        }
    }

    pub async fn list_events(&self) -> Result<Vec<EventRow>> {
        match self {
            Self::Postgres(db) => db.list_events().await,
            Self::InMemory(db) => db.list_events().await,
        }
    }

    pub async fn publish_event(&self, id: Uuid) -> Result<EventRow> {
        match self {
            Self::Postgres(db) => db.publish_event(id).await,
            Self::InMemory(db) => db.publish_event(id).await,
        }
    }

    pub async fn cancel_event(&self, id: Uuid) -> Result<EventRow> {
        match self {
            Self::Postgres(db) => db.cancel_event(id).await,
            Self::InMemory(db) => db.cancel_event(id).await,
        }
    }

    pub async fn create_tier(&self, input: CreateTier) -> Result<TierRow> {
        match self {
            Self::Postgres(db) => db.create_tier(input).await,
            Self::InMemory(db) => db.create_tier(input).await,
        }
    }

    pub async fn get_tier(&self, id: Uuid) -> Result<Option<TierRow>> {
        match self {
            Self::Postgres(db) => db.get_tier(id).await,
            Self::InMemory(db) => db.get_tier(id).await,
        }
    }

    pub async fn list_tiers(&self, event_id: Uuid) -> Result<Vec<TierRow>> {
        match self {
            Self::Postgres(db) => db.list_tiers(event_id).await,
            Self::InMemory(db) => db.list_tiers(event_id).await,
        }
    }

    // ============================================
    // Capacity ledger
    // ============================================

    pub async fn reserve_capacity(
        &self,
        event_id: Uuid,
        tier_id: Option<Uuid>,
        quantity: i32,
    ) -> Result<Reservation> {
        match self {
            Self::Postgres(db) => db.reserve_capacity(event_id, tier_id, quantity).await,
            Self::InMemory(db) => db.reserve_capacity(event_id, tier_id, quantity).await,
        }
    }

    pub async fn release_capacity(&self, reservation: &Reservation) -> Result<()> {
        match self {
            Self::Postgres(db) => db.release_capacity(reservation).await,
            Self::InMemory(db) => db.release_capacity(reservation).await,
        }
    }

    // ============================================
    // Tickets
    // ============================================

    pub async fn create_tickets(&self, inputs: Vec<CreateTicket>) -> Result<Vec<TicketRow>> {
        match self {
            Self::Postgres(db) => db.create_tickets(inputs).await,
            Self::InMemory(db) => db.create_tickets(inputs).await,
        }
    }

    pub async fn get_ticket(&self, id: Uuid) -> Result<Option<TicketRow>> {
        match self {
            Self::Postgres(db) => db.get_ticket(id).await,
            Self::InMemory(db) => db.get_ticket(id).await,
        }
    }

    pub async fn list_tickets_for_owner(&self, owner_id: Uuid) -> Result<Vec<TicketRow>> {
        match self {
            Self::Postgres(db) => db.list_tickets_for_owner(owner_id).await,
            Self::InMemory(db) => db.list_tickets_for_owner(owner_id).await,
        }
    }

    pub async fn list_tickets_for_event(&self, event_id: Uuid) -> Result<Vec<TicketRow>> {
        match self {
            Self::Postgres(db) => db.list_tickets_for_event(event_id).await,
            Self::InMemory(db) => db.list_tickets_for_event(event_id).await,
        }
    }

    pub async fn count_checked_in(&self, event_id: Uuid) -> Result<i64> {
        match self {
            Self::Postgres(db) => db.count_checked_in(event_id).await,
            Self::InMemory(db) => db.count_checked_in(event_id).await,
        }
    }

    pub async fn check_in_ticket(&self, id: Uuid) -> Result<TicketRow> {
        match self {
            Self::Postgres(db) => db.check_in_ticket(id).await,
            Self::InMemory(db) => db.check_in_ticket(id).await,
        }
    }

    pub async fn undo_check_in(&self, id: Uuid) -> Result<TicketRow> {
        match self {
            Self::Postgres(db) => db.undo_check_in(id).await,
            Self::InMemory(db) => db.undo_check_in(id).await,
        }
    }

    // ============================================
    // Refund requests
    // ============================================

    pub async fn create_refund_request(
        &self,
        ticket_id: Uuid,
        reason: String,
    ) -> Result<RefundRequestRow> {
        match self {
            Self::Postgres(db) => db.create_refund_request(ticket_id, reason).await,
            Self::InMemory(db) => db.create_refund_request(ticket_id, reason).await,
        }
    }

    pub async fn get_refund_request(&self, id: Uuid) -> Result<Option<RefundRequestRow>> {
        match self {
            Self::Postgres(db) => db.get_refund_request(id).await,
            Self::InMemory(db) => db.get_refund_request(id).await,
        }
    }

    pub async fn list_refund_requests(&self, event_id: Uuid) -> Result<Vec<RefundRequestRow>> {
        match self {
            Self::Postgres(db) => db.list_refund_requests(event_id).await,
            Self::InMemory(db) => db.list_refund_requests(event_id).await,
        }
    }

    pub async fn process_refund_request(
        &self,
        id: Uuid,
        decision: RefundDecision,
        processed_by: Uuid,
        note: Option<String>,
    ) -> Result<(RefundRequestRow, TicketRow)> {
        match self {
            Self::Postgres(db) => {
                db.process_refund_request(id, decision, processed_by, note)
                    .await
            }
            Self::InMemory(db) => {
                db.process_refund_request(id, decision, processed_by, note)
                    .await
            }
        }
    }

    // ============================================
    // Money ledger
    // ============================================

    pub async fn list_ledger_entries(&self, event_id: Uuid) -> Result<Vec<LedgerEntryRow>> {
        match self {
            Self::Postgres(db) => db.list_ledger_entries(event_id).await,
            Self::InMemory(db) => db.list_ledger_entries(event_id).await,
        }
    }

    pub async fn ledger_balance(&self, event_id: Uuid) -> Result<i64> {
        match self {
            Self::Postgres(db) => db.ledger_balance(event_id).await,
            Self::InMemory(db) => db.ledger_balance(event_id).await,
        }
    }
}
