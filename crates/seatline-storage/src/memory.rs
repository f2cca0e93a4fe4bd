// In-memory storage implementation for dev mode and tests
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation provides a PostgreSQL-compatible API backed by in-memory
// HashMaps, allowing the API server to run without a database for development.
//
// Atomicity: every guarded mutation (reserve, lifecycle transition, refund
// processing) runs its precondition and its write while holding the relevant
// table's write lock, so concurrent callers against the same tier or ticket
// are serialized exactly like the conditional UPDATEs of the Postgres
// backend. Lock order where several tables are touched: tickets, refunds,
// ledger entries.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use seatline_core::lifecycle;
use seatline_core::{
    RefundDecision, RefundState, Reservation, Result, TicketState, TicketingError,
};

use crate::models::*;

/// In-memory store for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryStore {
    events: RwLock<HashMap<Uuid, EventRow>>,
    tiers: RwLock<HashMap<Uuid, TierRow>>,
    tickets: RwLock<HashMap<Uuid, TicketRow>>,
    refund_requests: RwLock<HashMap<Uuid, RefundRequestRow>>,
    ledger_entries: RwLock<HashMap<Uuid, LedgerEntryRow>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, input: CreateEvent) -> Result<EventRow> {
        let now = Self::now();
        let row = EventRow {
            id: Uuid::now_v7(),
            organizer_id: input.organizer_id,
            name: input.name,
            starts_at: input.starts_at,
            price_cents: input.price_cents,
            capacity: input.capacity,
            sold: 0,
            status: "draft".to_string(),
            created_at: now,
            updated_at: now,
        };
        self.events.write().insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        Ok(self.events.read().get(&id).cloned())
    }

    pub async fn list_events(&self) -> Result<Vec<EventRow>> {
        let mut result: Vec<_> = self.events.read().values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    pub async fn publish_event(&self, id: Uuid) -> Result<EventRow> {
        let mut events = self.events.write();
        let event = events
            .get_mut(&id)
            .ok_or(TicketingError::EventNotFound(id))?;
        event.status = "published".to_string();
        event.updated_at = Self::now();
        Ok(event.clone())
    }

    pub async fn cancel_event(&self, id: Uuid) -> Result<EventRow> {
        let mut events = self.events.write();
        let event = events
            .get_mut(&id)
            .ok_or(TicketingError::EventNotFound(id))?;
        event.status = "cancelled".to_string();
        event.updated_at = Self::now();
        Ok(event.clone())
    }

    pub async fn create_tier(&self, input: CreateTier) -> Result<TierRow> {
        if !self.events.read().contains_key(&input.event_id) {
            return Err(TicketingError::EventNotFound(input.event_id));
        }
        let row = TierRow {
            id: Uuid::now_v7(),
            event_id: input.event_id,
            name: input.name,
            price_cents: input.price_cents,
            allocation: input.allocation,
            sold: 0,
            created_at: Self::now(),
        };
        self.tiers.write().insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_tier(&self, id: Uuid) -> Result<Option<TierRow>> {
        Ok(self.tiers.read().get(&id).cloned())
    }

    pub async fn list_tiers(&self, event_id: Uuid) -> Result<Vec<TierRow>> {
        let mut result: Vec<_> = self
            .tiers
            .read()
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    // ============================================
    // Capacity ledger
    // ============================================

    /// Atomically reserve capacity against a tier or the event-level pool
    ///
    /// The oversell check and the increment happen under one write lock;
    /// the sum of granted quantities can never exceed the allocation.
    pub async fn reserve_capacity(
        &self,
        event_id: Uuid,
        tier_id: Option<Uuid>,
        quantity: i32,
    ) -> Result<Reservation> {
        match tier_id {
            Some(tier_id) => {
                {
                    let events = self.events.read();
                    let event = events
                        .get(&event_id)
                        .ok_or(TicketingError::EventNotFound(event_id))?;
                    if event.status != "published" {
                        return Err(TicketingError::EventNotBookable(event_id));
                    }
                }
                let mut tiers = self.tiers.write();
                let tier = tiers
                    .get_mut(&tier_id)
                    .filter(|t| t.event_id == event_id)
                    .ok_or(TicketingError::TierNotFound(tier_id))?;
                lifecycle::ensure_capacity(tier.sold, tier.allocation, quantity)?;
                tier.sold += quantity;
            }
            None => {
                let mut events = self.events.write();
                let event = events
                    .get_mut(&event_id)
                    .ok_or(TicketingError::EventNotFound(event_id))?;
                if event.status != "published" {
                    return Err(TicketingError::EventNotBookable(event_id));
                }
                lifecycle::ensure_capacity(event.sold, event.capacity, quantity)?;
                event.sold += quantity;
                event.updated_at = Self::now();
            }
        }
        Ok(Reservation {
            event_id,
            tier_id,
            quantity,
        })
    }

    /// Compensate a reservation whose downstream work failed
    pub async fn release_capacity(&self, reservation: &Reservation) -> Result<()> {
        match reservation.tier_id {
            Some(tier_id) => {
                let mut tiers = self.tiers.write();
                if let Some(tier) = tiers.get_mut(&tier_id) {
                    tier.sold = (tier.sold - reservation.quantity).max(0);
                }
            }
            None => {
                let mut events = self.events.write();
                if let Some(event) = events.get_mut(&reservation.event_id) {
                    event.sold = (event.sold - reservation.quantity).max(0);
                    event.updated_at = Self::now();
                }
            }
        }
        Ok(())
    }

    // ============================================
    // Tickets
    // ============================================

    /// Create a batch of tickets plus their sale ledger entries, all-or-nothing
    pub async fn create_tickets(&self, inputs: Vec<CreateTicket>) -> Result<Vec<TicketRow>> {
        let now = Self::now();
        let mut tickets = self.tickets.write();
        let mut ledger = self.ledger_entries.write();
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let row = TicketRow {
                id: Uuid::now_v7(),
                event_id: input.event_id,
                tier_id: input.tier_id,
                owner_id: input.owner_id,
                price_paid_cents: input.price_paid_cents,
                purchased_at: now,
                state: "issued".to_string(),
                checked_in_at: None,
                refund_state: "none".to_string(),
            };
            let entry = LedgerEntryRow {
                id: Uuid::now_v7(),
                event_id: row.event_id,
                ticket_id: row.id,
                amount_cents: row.price_paid_cents,
                kind: "sale".to_string(),
                created_at: now,
            };
            tickets.insert(row.id, row.clone());
            ledger.insert(entry.id, entry);
            created.push(row);
        }
        Ok(created)
    }

    pub async fn get_ticket(&self, id: Uuid) -> Result<Option<TicketRow>> {
        Ok(self.tickets.read().get(&id).cloned())
    }

    pub async fn list_tickets_for_owner(&self, owner_id: Uuid) -> Result<Vec<TicketRow>> {
        let mut result: Vec<_> = self
            .tickets
            .read()
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(result)
    }

    pub async fn list_tickets_for_event(&self, event_id: Uuid) -> Result<Vec<TicketRow>> {
        let mut result: Vec<_> = self
            .tickets
            .read()
            .values()
            .filter(|t| t.event_id == event_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.purchased_at.cmp(&a.purchased_at));
        Ok(result)
    }

    pub async fn count_checked_in(&self, event_id: Uuid) -> Result<i64> {
        Ok(self
            .tickets
            .read()
            .values()
            .filter(|t| t.event_id == event_id && t.state == "checked_in")
            .count() as i64)
    }

    /// Check a ticket in, guarded against double entry
    pub async fn check_in_ticket(&self, id: Uuid) -> Result<TicketRow> {
        let mut tickets = self.tickets.write();
        let row = tickets
            .get_mut(&id)
            .ok_or(TicketingError::TicketNotFound(id))?;
        lifecycle::ensure_can_check_in(&row_to_ticket(row))?;
        row.state = "checked_in".to_string();
        row.checked_in_at = Some(Self::now());
        Ok(row.clone())
    }

    /// Revert a mistaken check-in
    pub async fn undo_check_in(&self, id: Uuid) -> Result<TicketRow> {
        let mut tickets = self.tickets.write();
        let row = tickets
            .get_mut(&id)
            .ok_or(TicketingError::TicketNotFound(id))?;
        lifecycle::ensure_can_undo_check_in(&row_to_ticket(row))?;
        row.state = "issued".to_string();
        row.checked_in_at = None;
        Ok(row.clone())
    }

    // ============================================
    // Refund requests
    // ============================================

    /// Open a refund request, snapshotting the amount from the ticket
    ///
    /// The ticket-state guards run under the ticket write lock so a racing
    /// check-in or second request is serialized against us. The refund
    /// window check belongs to the service layer (it needs the event's start
    /// time and the configured cutoff).
    pub async fn create_refund_request(
        &self,
        ticket_id: Uuid,
        reason: String,
    ) -> Result<RefundRequestRow> {
        let mut tickets = self.tickets.write();
        let mut requests = self.refund_requests.write();

        let ticket = tickets
            .get_mut(&ticket_id)
            .ok_or(TicketingError::TicketNotFound(ticket_id))?;
        lifecycle::ensure_can_request_refund(&row_to_ticket(ticket))?;

        let row = RefundRequestRow {
            id: Uuid::now_v7(),
            ticket_id,
            event_id: ticket.event_id,
            amount_cents: ticket.price_paid_cents,
            reason,
            status: "pending".to_string(),
            requested_at: Self::now(),
            processed_by: None,
            processed_at: None,
            note: None,
        };
        ticket.refund_state = "pending".to_string();
        requests.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_refund_request(&self, id: Uuid) -> Result<Option<RefundRequestRow>> {
        Ok(self.refund_requests.read().get(&id).cloned())
    }

    pub async fn list_refund_requests(&self, event_id: Uuid) -> Result<Vec<RefundRequestRow>> {
        let mut result: Vec<_> = self
            .refund_requests
            .read()
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(result)
    }

    /// Process a pending refund request exactly once
    ///
    /// Approve voids the ticket and writes the compensating ledger entry for
    /// the snapshotted amount; reject returns the ticket to normal issued
    /// state. An approve that races a completed check-in fails with
    /// `AlreadyUsed` and leaves the request pending for the organizer.
    pub async fn process_refund_request(
        &self,
        id: Uuid,
        decision: RefundDecision,
        processed_by: Uuid,
        note: Option<String>,
    ) -> Result<(RefundRequestRow, TicketRow)> {
        let mut tickets = self.tickets.write();
        let mut requests = self.refund_requests.write();
        let mut ledger = self.ledger_entries.write();

        let request = requests
            .get_mut(&id)
            .ok_or(TicketingError::RefundRequestNotFound(id))?;
        lifecycle::ensure_unprocessed(&row_to_request(request))?;

        let ticket = tickets
            .get_mut(&request.ticket_id)
            .ok_or(TicketingError::TicketNotFound(request.ticket_id))?;

        let now = Self::now();
        match decision {
            RefundDecision::Approve => {
                if TicketState::from(ticket.state.as_str()) != TicketState::Issued {
                    return Err(TicketingError::AlreadyUsed(ticket.id));
                }
                request.status = "approved".to_string();
                ticket.state = "void".to_string();
                ticket.refund_state = "approved".to_string();
                let entry = LedgerEntryRow {
                    id: Uuid::now_v7(),
                    event_id: request.event_id,
                    ticket_id: request.ticket_id,
                    amount_cents: -request.amount_cents,
                    kind: "refund".to_string(),
                    created_at: now,
                };
                ledger.insert(entry.id, entry);
            }
            RefundDecision::Reject => {
                request.status = "rejected".to_string();
                ticket.refund_state = "rejected".to_string();
            }
        }
        request.processed_by = Some(processed_by);
        request.processed_at = Some(now);
        request.note = note;

        Ok((request.clone(), ticket.clone()))
    }

    // ============================================
    // Money ledger
    // ============================================

    pub async fn list_ledger_entries(&self, event_id: Uuid) -> Result<Vec<LedgerEntryRow>> {
        let mut result: Vec<_> = self
            .ledger_entries
            .read()
            .values()
            .filter(|e| e.event_id == event_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    pub async fn ledger_balance(&self, event_id: Uuid) -> Result<i64> {
        Ok(self
            .ledger_entries
            .read()
            .values()
            .filter(|e| e.event_id == event_id)
            .map(|e| e.amount_cents)
            .sum())
    }
}

fn row_to_ticket(row: &TicketRow) -> seatline_core::Ticket {
    seatline_core::Ticket {
        id: row.id,
        event_id: row.event_id,
        tier_id: row.tier_id,
        owner_id: row.owner_id,
        price_paid_cents: row.price_paid_cents,
        purchased_at: row.purchased_at,
        state: TicketState::from(row.state.as_str()),
        checked_in_at: row.checked_in_at,
        refund_state: RefundState::from(row.refund_state.as_str()),
    }
}

fn row_to_request(row: &RefundRequestRow) -> seatline_core::RefundRequest {
    seatline_core::RefundRequest {
        id: row.id,
        ticket_id: row.ticket_id,
        event_id: row.event_id,
        amount_cents: row.amount_cents,
        reason: row.reason.clone(),
        status: seatline_core::RefundStatus::from(row.status.as_str()),
        requested_at: row.requested_at,
        processed_by: row.processed_by,
        processed_at: row.processed_at,
        note: row.note.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    async fn published_event(store: &InMemoryStore, capacity: Option<i32>) -> EventRow {
        let event = store
            .create_event(CreateEvent {
                organizer_id: Uuid::now_v7(),
                name: "Test Night".to_string(),
                starts_at: Utc::now() + Duration::days(30),
                price_cents: 2000,
                capacity,
            })
            .await
            .unwrap();
        store.publish_event(event.id).await.unwrap()
    }

    async fn issued_ticket(store: &InMemoryStore, event_id: Uuid) -> TicketRow {
        store
            .create_tickets(vec![CreateTicket {
                event_id,
                tier_id: None,
                owner_id: Uuid::now_v7(),
                price_paid_cents: 2000,
            }])
            .await
            .unwrap()
            .remove(0)
    }

    #[tokio::test]
    async fn reserve_rejects_draft_event() {
        let store = InMemoryStore::new();
        let event = store
            .create_event(CreateEvent {
                organizer_id: Uuid::now_v7(),
                name: "Unpublished".to_string(),
                starts_at: Utc::now() + Duration::days(30),
                price_cents: 1000,
                capacity: Some(10),
            })
            .await
            .unwrap();

        let err = store
            .reserve_capacity(event.id, None, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::EventNotBookable(_)));
    }

    #[tokio::test]
    async fn cancelled_event_rejects_reservations() {
        let store = InMemoryStore::new();
        let event = published_event(&store, Some(10)).await;
        assert!(store.reserve_capacity(event.id, None, 1).await.is_ok());

        let cancelled = store.cancel_event(event.id).await.unwrap();
        assert_eq!(cancelled.status, "cancelled");

        let err = store
            .reserve_capacity(event.id, None, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::EventNotBookable(_)));
    }

    #[tokio::test]
    async fn reserve_rejects_tier_of_another_event() {
        let store = InMemoryStore::new();
        let event_a = published_event(&store, None).await;
        let event_b = published_event(&store, None).await;
        let tier_b = store
            .create_tier(CreateTier {
                event_id: event_b.id,
                name: "GA".to_string(),
                price_cents: 1500,
                allocation: Some(10),
            })
            .await
            .unwrap();

        let err = store
            .reserve_capacity(event_a.id, Some(tier_b.id), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::TierNotFound(_)));
    }

    #[tokio::test]
    async fn concurrent_reserves_never_oversell() {
        let store = Arc::new(InMemoryStore::new());
        let event = published_event(&store, None).await;
        let tier = store
            .create_tier(CreateTier {
                event_id: event.id,
                name: "GA".to_string(),
                price_cents: 1500,
                allocation: Some(10),
            })
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let store = Arc::clone(&store);
            let event_id = event.id;
            let tier_id = tier.id;
            handles.push(tokio::spawn(async move {
                store.reserve_capacity(event_id, Some(tier_id), 1).await
            }));
        }

        let mut granted = 0;
        let mut exceeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => granted += 1,
                Err(TicketingError::CapacityExceeded) => exceeded += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        // Demand >= allocation: the full allocation is granted, never more
        assert_eq!(granted, 10);
        assert_eq!(exceeded, 15);
        assert_eq!(store.get_tier(tier.id).await.unwrap().unwrap().sold, 10);
    }

    #[tokio::test]
    async fn last_seat_goes_to_exactly_one_buyer() {
        let store = Arc::new(InMemoryStore::new());
        let event = published_event(&store, Some(1)).await;

        let a = {
            let store = Arc::clone(&store);
            let id = event.id;
            tokio::spawn(async move { store.reserve_capacity(id, None, 1).await })
        };
        let b = {
            let store = Arc::clone(&store);
            let id = event.id;
            tokio::spawn(async move { store.reserve_capacity(id, None, 1).await })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(TicketingError::CapacityExceeded))));
    }

    #[tokio::test]
    async fn release_compensates_reservation() {
        let store = InMemoryStore::new();
        let event = published_event(&store, Some(5)).await;

        let reservation = store.reserve_capacity(event.id, None, 3).await.unwrap();
        store.release_capacity(&reservation).await.unwrap();

        assert_eq!(store.get_event(event.id).await.unwrap().unwrap().sold, 0);
        // The freed capacity is grantable again
        assert!(store.reserve_capacity(event.id, None, 5).await.is_ok());
    }

    #[tokio::test]
    async fn check_in_twice_reports_duplicate_entry() {
        let store = InMemoryStore::new();
        let event = published_event(&store, None).await;
        let ticket = issued_ticket(&store, event.id).await;

        let checked = store.check_in_ticket(ticket.id).await.unwrap();
        assert_eq!(checked.state, "checked_in");
        assert!(checked.checked_in_at.is_some());

        let err = store.check_in_ticket(ticket.id).await.unwrap_err();
        assert!(matches!(err, TicketingError::AlreadyCheckedIn(_)));
    }

    #[tokio::test]
    async fn undo_check_in_restores_usable_ticket() {
        let store = InMemoryStore::new();
        let event = published_event(&store, None).await;
        let ticket = issued_ticket(&store, event.id).await;

        store.check_in_ticket(ticket.id).await.unwrap();
        let reverted = store.undo_check_in(ticket.id).await.unwrap();
        assert_eq!(reverted.state, "issued");
        assert!(reverted.checked_in_at.is_none());

        assert!(store.check_in_ticket(ticket.id).await.is_ok());
    }

    #[tokio::test]
    async fn second_refund_request_while_pending_fails() {
        let store = InMemoryStore::new();
        let event = published_event(&store, None).await;
        let ticket = issued_ticket(&store, event.id).await;

        store
            .create_refund_request(ticket.id, "plans changed".to_string())
            .await
            .unwrap();
        let err = store
            .create_refund_request(ticket.id, "asking again".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::RefundAlreadyPending(_)));
    }

    #[tokio::test]
    async fn refund_processed_exactly_once() {
        let store = InMemoryStore::new();
        let event = published_event(&store, None).await;
        let ticket = issued_ticket(&store, event.id).await;
        let request = store
            .create_refund_request(ticket.id, "plans changed".to_string())
            .await
            .unwrap();

        let organizer = Uuid::now_v7();
        let (processed, voided) = store
            .process_refund_request(request.id, RefundDecision::Approve, organizer, None)
            .await
            .unwrap();
        assert_eq!(processed.status, "approved");
        assert_eq!(processed.processed_by, Some(organizer));
        assert_eq!(voided.state, "void");
        assert_eq!(voided.refund_state, "approved");

        let err = store
            .process_refund_request(request.id, RefundDecision::Reject, organizer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::AlreadyProcessed(_)));
    }

    #[tokio::test]
    async fn approved_refund_amount_is_snapshotted() {
        let store = InMemoryStore::new();
        let event = published_event(&store, None).await;
        let ticket = issued_ticket(&store, event.id).await; // paid 2000

        let request = store
            .create_refund_request(ticket.id, "plans changed".to_string())
            .await
            .unwrap();
        assert_eq!(request.amount_cents, 2000);

        // Listed price changes after the request; the snapshot must not move
        store.events.write().get_mut(&event.id).unwrap().price_cents = 9999;

        store
            .process_refund_request(request.id, RefundDecision::Approve, Uuid::now_v7(), None)
            .await
            .unwrap();

        let entries = store.list_ledger_entries(event.id).await.unwrap();
        let refund = entries.iter().find(|e| e.kind == "refund").unwrap();
        assert_eq!(refund.amount_cents, -2000);
        // Sale (+2000) and refund (-2000) net to zero
        assert_eq!(store.ledger_balance(event.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn rejected_refund_leaves_ticket_usable_and_rerequestable() {
        let store = InMemoryStore::new();
        let event = published_event(&store, None).await;
        let ticket = issued_ticket(&store, event.id).await;
        let request = store
            .create_refund_request(ticket.id, "plans changed".to_string())
            .await
            .unwrap();

        let (_, updated) = store
            .process_refund_request(request.id, RefundDecision::Reject, Uuid::now_v7(), None)
            .await
            .unwrap();
        assert_eq!(updated.state, "issued");
        assert_eq!(updated.refund_state, "rejected");

        // A second request may be opened after a rejection
        assert!(store
            .create_refund_request(ticket.id, "trying again".to_string())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn voided_ticket_never_checks_in_under_race() {
        // Refund approval vs door check-in: exactly one side wins, the loser
        // sees a terminal error, and a voided ticket is never checked in.
        for _ in 0..20 {
            let store = Arc::new(InMemoryStore::new());
            let event = published_event(&store, None).await;
            let ticket = issued_ticket(&store, event.id).await;
            let request = store
                .create_refund_request(ticket.id, "race".to_string())
                .await
                .unwrap();

            let approve = {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .process_refund_request(
                            request.id,
                            RefundDecision::Approve,
                            Uuid::now_v7(),
                            None,
                        )
                        .await
                })
            };
            let check_in = {
                let store = Arc::clone(&store);
                let id = ticket.id;
                tokio::spawn(async move { store.check_in_ticket(id).await })
            };

            let approve = approve.await.unwrap();
            let check_in = check_in.await.unwrap();
            assert!(approve.is_ok() != check_in.is_ok(), "exactly one must win");

            let final_state = store.get_ticket(ticket.id).await.unwrap().unwrap().state;
            if approve.is_ok() {
                assert_eq!(final_state, "void");
                assert!(matches!(
                    check_in.unwrap_err(),
                    TicketingError::TicketVoided(_)
                ));
            } else {
                assert_eq!(final_state, "checked_in");
                assert!(matches!(
                    approve.unwrap_err(),
                    TicketingError::AlreadyUsed(_)
                ));
            }
        }
    }
}
