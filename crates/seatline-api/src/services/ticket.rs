// Ticket service: issuance and door operations
//
// Every successful mutation publishes after the storage commit, never
// before, so observers are never told about a change that did not persist.
// A purchase fans out as two independent envelopes (buyer's user room,
// organizer's event room) plus a live-stats refresh for dashboards.

use std::sync::Arc;
use uuid::Uuid;

use seatline_core::lifecycle;
use seatline_core::{
    DomainEvent, Envelope, NotificationBus, Result, Room, Ticket, TicketingError,
};
use seatline_storage::{CreateTicket, StorageBackend};

use crate::auth::Claims;

use super::{row_to_event, row_to_ticket};

pub struct TicketService {
    store: Arc<StorageBackend>,
    bus: NotificationBus,
}

impl TicketService {
    pub fn new(store: Arc<StorageBackend>, bus: NotificationBus) -> Self {
        Self { store, bus }
    }

    /// Issue `quantity` tickets against an event's capacity pool
    ///
    /// Payment is already settled when this is called. Capacity is reserved
    /// first; if persisting the tickets fails afterwards the reservation is
    /// explicitly released, so the operation is all-or-nothing for the
    /// requested quantity.
    pub async fn issue(
        &self,
        event_id: Uuid,
        tier_id: Option<Uuid>,
        owner_id: Uuid,
        quantity: u32,
    ) -> Result<Vec<Ticket>> {
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(TicketingError::EventNotFound(event_id))?;
        // Fast precheck; the reserve re-validates atomically
        lifecycle::ensure_bookable(&row_to_event(event.clone()))?;

        let price_cents = match tier_id {
            Some(tier_id) => {
                let tier = self
                    .store
                    .get_tier(tier_id)
                    .await?
                    .filter(|t| t.event_id == event_id)
                    .ok_or(TicketingError::TierNotFound(tier_id))?;
                tier.price_cents
            }
            None => event.price_cents,
        };

        let quantity = i32::try_from(quantity)
            .map_err(|_| TicketingError::invalid("quantity out of range"))?;
        let reservation = self
            .store
            .reserve_capacity(event_id, tier_id, quantity)
            .await?;

        let inputs = (0..quantity)
            .map(|_| CreateTicket {
                event_id,
                tier_id,
                owner_id,
                price_paid_cents: price_cents,
            })
            .collect();

        let rows = match self.store.create_tickets(inputs).await {
            Ok(rows) => rows,
            Err(err) => {
                // Compensate the reservation; the sold counter must not
                // keep seats that were never issued
                if let Err(release_err) = self.store.release_capacity(&reservation).await {
                    tracing::error!(
                        event_id = %event_id,
                        "failed to release reservation after issuance error: {release_err}"
                    );
                }
                return Err(err);
            }
        };

        let tickets: Vec<Ticket> = rows.into_iter().map(row_to_ticket).collect();

        let issued = DomainEvent::TicketsIssued {
            event_id,
            owner_id,
            ticket_ids: tickets.iter().map(|t| t.id).collect(),
            tier_id,
            quantity: quantity as u32,
        };
        self.bus
            .publish(Room::User(owner_id), Envelope::notification(issued.clone()))
            .await;
        self.bus
            .publish(Room::Event(event_id), Envelope::event_update(issued))
            .await;
        self.publish_live_stats(event_id).await;

        tracing::info!(event_id = %event_id, owner_id = %owner_id, quantity, "tickets issued");
        Ok(tickets)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Ticket>> {
        let row = self.store.get_ticket(id).await?;
        Ok(row.map(row_to_ticket))
    }

    pub async fn list_for_owner(&self, owner_id: Uuid) -> Result<Vec<Ticket>> {
        let rows = self.store.list_tickets_for_owner(owner_id).await?;
        Ok(rows.into_iter().map(row_to_ticket).collect())
    }

    /// Attendance list for an event's door staff; organizer/admin only
    pub async fn list_for_event(&self, event_id: Uuid, claims: Claims) -> Result<Vec<Ticket>> {
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(TicketingError::EventNotFound(event_id))?;
        if !claims.can_manage(event.organizer_id) {
            return Err(TicketingError::not_authorized(
                "only the organizer may list an event's tickets",
            ));
        }

        let rows = self.store.list_tickets_for_event(event_id).await?;
        Ok(rows.into_iter().map(row_to_ticket).collect())
    }

    /// Mark a ticket used at the door
    pub async fn check_in(&self, ticket_id: Uuid) -> Result<Ticket> {
        let row = self.store.check_in_ticket(ticket_id).await?;
        let ticket = row_to_ticket(row);

        let event = DomainEvent::TicketCheckedIn {
            event_id: ticket.event_id,
            ticket_id: ticket.id,
        };
        self.bus
            .publish(
                Room::User(ticket.owner_id),
                Envelope::notification(event.clone()),
            )
            .await;
        self.bus
            .publish(Room::Event(ticket.event_id), Envelope::event_update(event))
            .await;
        self.publish_live_stats(ticket.event_id).await;

        tracing::info!(ticket_id = %ticket.id, "ticket checked in");
        Ok(ticket)
    }

    /// Correct a scanner mistake
    pub async fn undo_check_in(&self, ticket_id: Uuid) -> Result<Ticket> {
        let row = self.store.undo_check_in(ticket_id).await?;
        let ticket = row_to_ticket(row);

        let event = DomainEvent::CheckInReverted {
            event_id: ticket.event_id,
            ticket_id: ticket.id,
        };
        self.bus
            .publish(
                Room::User(ticket.owner_id),
                Envelope::notification(event.clone()),
            )
            .await;
        self.bus
            .publish(Room::Event(ticket.event_id), Envelope::event_update(event))
            .await;

        tracing::info!(ticket_id = %ticket.id, "check-in reverted");
        Ok(ticket)
    }

    /// Push refreshed counters to the event's dashboard room; best-effort
    async fn publish_live_stats(&self, event_id: Uuid) {
        let stats = async {
            let event = self
                .store
                .get_event(event_id)
                .await?
                .ok_or(TicketingError::EventNotFound(event_id))?;
            let tiers = self.store.list_tiers(event_id).await?;
            let checked_in = self.store.count_checked_in(event_id).await?;
            let sold = event.sold + tiers.iter().map(|t| t.sold).sum::<i32>();
            let capacity = tiers
                .iter()
                .map(|t| t.allocation)
                .chain(std::iter::once(event.capacity))
                .try_fold(0i32, |acc, a| a.map(|a| acc + a));
            Ok::<_, TicketingError>(DomainEvent::LiveStats {
                event_id,
                sold,
                capacity,
                checked_in,
            })
        }
        .await;

        match stats {
            Ok(stats) => {
                self.bus
                    .publish(Room::Event(event_id), Envelope::live_stats(stats))
                    .await;
            }
            Err(err) => {
                tracing::warn!(event_id = %event_id, "skipping live stats: {err}");
            }
        }
    }
}
