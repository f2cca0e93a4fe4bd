// Refund service: request and processing flows
//
// The refund window is a hard business-time boundary checked once, at
// request time; a pending request then stays pending until an organizer
// processes it, however long that takes.

use std::sync::Arc;
use uuid::Uuid;

use seatline_core::lifecycle;
use seatline_core::{
    DomainEvent, Envelope, NotificationBus, RefundDecision, RefundRequest, Result, Room,
    TicketingError,
};
use seatline_storage::StorageBackend;

use crate::auth::Claims;

use super::{row_to_refund_request, row_to_ticket};

pub struct RefundService {
    store: Arc<StorageBackend>,
    bus: NotificationBus,
    cutoff_hours: i64,
}

impl RefundService {
    pub fn new(store: Arc<StorageBackend>, bus: NotificationBus, cutoff_hours: i64) -> Self {
        Self {
            store,
            bus,
            cutoff_hours,
        }
    }

    /// Open a refund request for an unused ticket
    pub async fn request(&self, ticket_id: Uuid, reason: String) -> Result<RefundRequest> {
        let ticket = self
            .store
            .get_ticket(ticket_id)
            .await?
            .ok_or(TicketingError::TicketNotFound(ticket_id))?;
        let event = self
            .store
            .get_event(ticket.event_id)
            .await?
            .ok_or(TicketingError::EventNotFound(ticket.event_id))?;

        // Window check runs here, once; the ticket-state guards run again
        // atomically inside the store
        lifecycle::ensure_can_request_refund(&row_to_ticket(ticket.clone()))?;
        lifecycle::ensure_refund_window_open(
            event.starts_at,
            self.cutoff_hours,
            chrono::Utc::now(),
        )?;

        let row = self.store.create_refund_request(ticket_id, reason).await?;
        let request = row_to_refund_request(row);

        let requested = DomainEvent::RefundRequested {
            event_id: request.event_id,
            ticket_id,
            request_id: request.id,
            amount_cents: request.amount_cents,
        };
        self.bus
            .publish(
                Room::User(ticket.owner_id),
                Envelope::notification(requested.clone()),
            )
            .await;
        self.bus
            .publish(
                Room::Event(request.event_id),
                Envelope::event_update(requested),
            )
            .await;

        tracing::info!(ticket_id = %ticket_id, request_id = %request.id, "refund requested");
        Ok(request)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<RefundRequest>> {
        let row = self.store.get_refund_request(id).await?;
        Ok(row.map(row_to_refund_request))
    }

    pub async fn list_for_event(&self, event_id: Uuid) -> Result<Vec<RefundRequest>> {
        let rows = self.store.list_refund_requests(event_id).await?;
        Ok(rows.into_iter().map(row_to_refund_request).collect())
    }

    /// Process a pending request exactly once; organizer/admin only
    pub async fn process(
        &self,
        request_id: Uuid,
        decision: RefundDecision,
        claims: Claims,
        note: Option<String>,
    ) -> Result<RefundRequest> {
        let request = self
            .store
            .get_refund_request(request_id)
            .await?
            .ok_or(TicketingError::RefundRequestNotFound(request_id))?;
        let event = self
            .store
            .get_event(request.event_id)
            .await?
            .ok_or(TicketingError::EventNotFound(request.event_id))?;

        if !claims.can_manage(event.organizer_id) {
            return Err(TicketingError::not_authorized(
                "only the event organizer may process refunds",
            ));
        }

        let (row, ticket_row) = self
            .store
            .process_refund_request(request_id, decision, claims.user_id, note)
            .await?;
        let request = row_to_refund_request(row);
        let ticket = row_to_ticket(ticket_row);

        let event = match decision {
            RefundDecision::Approve => DomainEvent::RefundApproved {
                event_id: request.event_id,
                ticket_id: request.ticket_id,
                request_id: request.id,
                amount_cents: request.amount_cents,
            },
            RefundDecision::Reject => DomainEvent::RefundRejected {
                event_id: request.event_id,
                ticket_id: request.ticket_id,
                request_id: request.id,
            },
        };
        self.bus
            .publish(
                Room::User(ticket.owner_id),
                Envelope::notification(event.clone()),
            )
            .await;
        self.bus
            .publish(Room::Event(request.event_id), Envelope::event_update(event))
            .await;

        tracing::info!(
            request_id = %request.id,
            decision = ?decision,
            "refund request processed"
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::services::TicketService;
    use chrono::{Duration, Utc};
    use seatline_core::RefundStatus;
    use seatline_storage::CreateEvent;

    struct Fixture {
        refunds: RefundService,
        tickets: TicketService,
        organizer: Claims,
    }

    async fn fixture(starts_in_hours: i64) -> (Fixture, Uuid) {
        let store = Arc::new(StorageBackend::in_memory());
        let bus = NotificationBus::new();
        let organizer_id = Uuid::now_v7();

        let event = store
            .create_event(CreateEvent {
                organizer_id,
                name: "Test Night".to_string(),
                starts_at: Utc::now() + Duration::hours(starts_in_hours),
                price_cents: 2000,
                capacity: None,
            })
            .await
            .unwrap();
        store.publish_event(event.id).await.unwrap();

        let fixture = Fixture {
            refunds: RefundService::new(Arc::clone(&store), bus.clone(), 24),
            tickets: TicketService::new(store, bus),
            organizer: Claims {
                user_id: organizer_id,
                role: Role::Organizer,
            },
        };
        (fixture, event.id)
    }

    #[tokio::test]
    async fn request_inside_window_is_rejected() {
        let (f, event_id) = fixture(12).await;
        let ticket = f
            .tickets
            .issue(event_id, None, Uuid::now_v7(), 1)
            .await
            .unwrap()
            .remove(0);

        let err = f
            .refunds
            .request(ticket.id, "plans changed".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TicketingError::WindowClosed { cutoff_hours: 24 }
        ));
    }

    #[tokio::test]
    async fn request_outside_window_succeeds_and_snapshots_amount() {
        let (f, event_id) = fixture(72).await;
        let ticket = f
            .tickets
            .issue(event_id, None, Uuid::now_v7(), 1)
            .await
            .unwrap()
            .remove(0);

        let request = f
            .refunds
            .request(ticket.id, "plans changed".to_string())
            .await
            .unwrap();
        assert_eq!(request.status, RefundStatus::Pending);
        assert_eq!(request.amount_cents, 2000);
    }

    #[tokio::test]
    async fn approval_voids_the_ticket_and_blocks_the_door() {
        let (f, event_id) = fixture(72).await;
        let ticket = f
            .tickets
            .issue(event_id, None, Uuid::now_v7(), 1)
            .await
            .unwrap()
            .remove(0);
        let request = f
            .refunds
            .request(ticket.id, "plans changed".to_string())
            .await
            .unwrap();

        let processed = f
            .refunds
            .process(request.id, RefundDecision::Approve, f.organizer, None)
            .await
            .unwrap();
        assert_eq!(processed.status, RefundStatus::Approved);

        assert!(matches!(
            f.tickets.check_in(ticket.id).await.unwrap_err(),
            TicketingError::TicketVoided(_)
        ));
    }

    #[tokio::test]
    async fn second_process_call_fails() {
        let (f, event_id) = fixture(72).await;
        let ticket = f
            .tickets
            .issue(event_id, None, Uuid::now_v7(), 1)
            .await
            .unwrap()
            .remove(0);
        let request = f
            .refunds
            .request(ticket.id, "plans changed".to_string())
            .await
            .unwrap();

        f.refunds
            .process(request.id, RefundDecision::Reject, f.organizer, None)
            .await
            .unwrap();
        let err = f
            .refunds
            .process(request.id, RefundDecision::Approve, f.organizer, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::AlreadyProcessed(_)));
    }

    #[tokio::test]
    async fn attendee_cannot_process_refunds() {
        let (f, event_id) = fixture(72).await;
        let buyer = Uuid::now_v7();
        let ticket = f
            .tickets
            .issue(event_id, None, buyer, 1)
            .await
            .unwrap()
            .remove(0);
        let request = f
            .refunds
            .request(ticket.id, "plans changed".to_string())
            .await
            .unwrap();

        let claims = Claims {
            user_id: buyer,
            role: Role::Attendee,
        };
        let err = f
            .refunds
            .process(request.id, RefundDecision::Approve, claims, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketingError::NotAuthorized(_)));

        // The request is untouched and still processable by the organizer
        let pending = f.refunds.get(request.id).await.unwrap().unwrap();
        assert_eq!(pending.status, RefundStatus::Pending);
    }
}
