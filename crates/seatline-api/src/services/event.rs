// Event service for business logic

use std::sync::Arc;
use uuid::Uuid;

use seatline_core::{EventListing, LedgerEntry, Result, TicketTier, TicketingError};
use seatline_storage::{CreateEvent, CreateTier, StorageBackend};

use super::{row_to_event, row_to_ledger_entry, row_to_tier};
use crate::common::EventStats;

pub struct EventService {
    store: Arc<StorageBackend>,
}

impl EventService {
    pub fn new(store: Arc<StorageBackend>) -> Self {
        Self { store }
    }

    pub async fn create(&self, input: CreateEvent) -> Result<EventListing> {
        if input.price_cents < 0 {
            return Err(TicketingError::invalid("price must not be negative"));
        }
        let row = self.store.create_event(input).await?;
        Ok(row_to_event(row))
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<EventListing>> {
        let row = self.store.get_event(id).await?;
        Ok(row.map(row_to_event))
    }

    pub async fn list(&self) -> Result<Vec<EventListing>> {
        let rows = self.store.list_events().await?;
        Ok(rows.into_iter().map(row_to_event).collect())
    }

    /// Open an event for booking
    pub async fn publish(&self, id: Uuid) -> Result<EventListing> {
        let row = self.store.publish_event(id).await?;
        Ok(row_to_event(row))
    }

    /// Withdraw an event from sale; cancelled events reject new purchases
    pub async fn cancel(&self, id: Uuid) -> Result<EventListing> {
        let row = self.store.cancel_event(id).await?;
        Ok(row_to_event(row))
    }

    pub async fn create_tier(&self, input: CreateTier) -> Result<TicketTier> {
        if input.price_cents < 0 {
            return Err(TicketingError::invalid("price must not be negative"));
        }
        let row = self.store.create_tier(input).await?;
        Ok(row_to_tier(row))
    }

    pub async fn list_tiers(&self, event_id: Uuid) -> Result<Vec<TicketTier>> {
        let rows = self.store.list_tiers(event_id).await?;
        Ok(rows.into_iter().map(row_to_tier).collect())
    }

    /// Money movements for an event, oldest first
    pub async fn ledger(&self, event_id: Uuid) -> Result<Vec<LedgerEntry>> {
        if self.store.get_event(event_id).await?.is_none() {
            return Err(TicketingError::EventNotFound(event_id));
        }
        let rows = self.store.list_ledger_entries(event_id).await?;
        Ok(rows.into_iter().map(row_to_ledger_entry).collect())
    }

    /// Sales snapshot for an event: sold counters, door count, gross takings
    pub async fn stats(&self, event_id: Uuid) -> Result<EventStats> {
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(TicketingError::EventNotFound(event_id))?;
        let tiers = self.store.list_tiers(event_id).await?;
        let checked_in = self.store.count_checked_in(event_id).await?;
        let gross_cents = self.store.ledger_balance(event_id).await?;

        let sold = event.sold + tiers.iter().map(|t| t.sold).sum::<i32>();
        // Total capacity is only meaningful when every pool is bounded
        let capacity = tiers
            .iter()
            .map(|t| t.allocation)
            .chain(std::iter::once(event.capacity))
            .try_fold(0i32, |acc, a| a.map(|a| acc + a));

        Ok(EventStats {
            event_id,
            sold,
            capacity,
            checked_in,
            gross_cents,
        })
    }
}
