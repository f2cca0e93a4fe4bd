// Ticket lifecycle state machine
//
// Pure precondition guards for every transition:
//
//   Issued --check_in--> CheckedIn
//   CheckedIn --undo_check_in--> Issued
//   Issued --request_refund--> Issued (refund_state = Pending)
//   Pending --approve--> Void (terminal)
//   Pending --reject--> Issued (refund_state = Rejected, may re-request)
//
// The guards take entities by reference and have no storage or clock
// dependency (the caller supplies `now`), so every business rule is
// unit-testable in isolation. Storage backends apply them atomically: the
// in-memory backend runs them inside its write lock, the Postgres backend
// encodes the same conditions in state-conditional UPDATEs.

use chrono::{DateTime, Duration, Utc};

use crate::error::{Result, TicketingError};
use crate::event::EventListing;
use crate::refund::{RefundRequest, RefundStatus};
use crate::ticket::{RefundState, Ticket, TicketState};

/// Default refund cutoff: requests inside this window before the event start
/// are rejected with `WindowClosed`
pub const DEFAULT_REFUND_CUTOFF_HOURS: i64 = 24;

/// Guard: the event must be published before capacity can be reserved
pub fn ensure_bookable(event: &EventListing) -> Result<()> {
    if !event.is_bookable() {
        return Err(TicketingError::EventNotBookable(event.id));
    }
    Ok(())
}

/// Guard: reserving `quantity` must not push `sold` past `allocation`
///
/// This is the oversell check. It must be evaluated and applied as one
/// indivisible step by the backend holding the counter.
pub fn ensure_capacity(sold: i32, allocation: Option<i32>, quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(TicketingError::invalid("quantity must be at least 1"));
    }
    if let Some(allocation) = allocation {
        if sold + quantity > allocation {
            return Err(TicketingError::CapacityExceeded);
        }
    }
    Ok(())
}

/// Guard: a ticket can be checked in only from `Issued`
///
/// A second check-in is a distinct error, not a silent no-op: the door
/// scanner must see that this ticket was already used.
pub fn ensure_can_check_in(ticket: &Ticket) -> Result<()> {
    match ticket.state {
        TicketState::Issued => Ok(()),
        TicketState::CheckedIn => Err(TicketingError::AlreadyCheckedIn(ticket.id)),
        TicketState::Void => Err(TicketingError::TicketVoided(ticket.id)),
    }
}

/// Guard: check-in can only be undone from `CheckedIn`
pub fn ensure_can_undo_check_in(ticket: &Ticket) -> Result<()> {
    match ticket.state {
        TicketState::CheckedIn => Ok(()),
        TicketState::Void => Err(TicketingError::TicketVoided(ticket.id)),
        TicketState::Issued => Err(TicketingError::NotCheckedIn(ticket.id)),
    }
}

/// Guard: a refund may be requested for an unused ticket with no active request
pub fn ensure_can_request_refund(ticket: &Ticket) -> Result<()> {
    match ticket.state {
        TicketState::CheckedIn => return Err(TicketingError::AlreadyUsed(ticket.id)),
        TicketState::Void => return Err(TicketingError::TicketVoided(ticket.id)),
        TicketState::Issued => {}
    }
    if ticket.refund_state == RefundState::Pending {
        return Err(TicketingError::RefundAlreadyPending(ticket.id));
    }
    Ok(())
}

/// Guard: refund requests are only accepted up to `cutoff_hours` before the
/// event starts
///
/// Evaluated once, at request time. There is no revalidation at approval
/// time and no background timer expiring stale requests.
pub fn ensure_refund_window_open(
    event_starts_at: DateTime<Utc>,
    cutoff_hours: i64,
    now: DateTime<Utc>,
) -> Result<()> {
    if event_starts_at - now < Duration::hours(cutoff_hours) {
        return Err(TicketingError::WindowClosed { cutoff_hours });
    }
    Ok(())
}

/// Guard: a refund request can be processed exactly once
pub fn ensure_unprocessed(request: &RefundRequest) -> Result<()> {
    if request.status != RefundStatus::Pending {
        return Err(TicketingError::AlreadyProcessed(request.id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn ticket(state: TicketState, refund_state: RefundState) -> Ticket {
        Ticket {
            id: Uuid::now_v7(),
            event_id: Uuid::now_v7(),
            tier_id: None,
            owner_id: Uuid::now_v7(),
            price_paid_cents: 2000,
            purchased_at: Utc::now(),
            state,
            checked_in_at: None,
            refund_state,
        }
    }

    #[test]
    fn capacity_allows_exact_fill() {
        assert!(ensure_capacity(0, Some(10), 10).is_ok());
        assert!(ensure_capacity(9, Some(10), 1).is_ok());
    }

    #[test]
    fn capacity_rejects_oversell() {
        let err = ensure_capacity(9, Some(10), 2).unwrap_err();
        assert!(matches!(err, TicketingError::CapacityExceeded));
    }

    #[test]
    fn capacity_unlimited_when_allocation_is_none() {
        assert!(ensure_capacity(1_000_000, None, 500).is_ok());
    }

    #[test]
    fn capacity_rejects_zero_quantity() {
        let err = ensure_capacity(0, Some(10), 0).unwrap_err();
        assert!(matches!(err, TicketingError::InvalidRequest(_)));
    }

    #[test]
    fn check_in_from_issued_only() {
        assert!(ensure_can_check_in(&ticket(TicketState::Issued, RefundState::None)).is_ok());

        let used = ticket(TicketState::CheckedIn, RefundState::None);
        assert!(matches!(
            ensure_can_check_in(&used).unwrap_err(),
            TicketingError::AlreadyCheckedIn(id) if id == used.id
        ));
    }

    #[test]
    fn voided_ticket_never_checks_in() {
        let voided = ticket(TicketState::Void, RefundState::Approved);
        assert!(matches!(
            ensure_can_check_in(&voided).unwrap_err(),
            TicketingError::TicketVoided(_)
        ));
    }

    #[test]
    fn undo_check_in_requires_checked_in() {
        assert!(
            ensure_can_undo_check_in(&ticket(TicketState::CheckedIn, RefundState::None)).is_ok()
        );
        assert!(matches!(
            ensure_can_undo_check_in(&ticket(TicketState::Issued, RefundState::None)).unwrap_err(),
            TicketingError::NotCheckedIn(_)
        ));
    }

    #[test]
    fn refund_request_blocked_for_used_ticket() {
        let used = ticket(TicketState::CheckedIn, RefundState::None);
        assert!(matches!(
            ensure_can_request_refund(&used).unwrap_err(),
            TicketingError::AlreadyUsed(_)
        ));
    }

    #[test]
    fn refund_request_blocked_while_pending() {
        let pending = ticket(TicketState::Issued, RefundState::Pending);
        assert!(matches!(
            ensure_can_request_refund(&pending).unwrap_err(),
            TicketingError::RefundAlreadyPending(_)
        ));
    }

    #[test]
    fn rejected_refund_may_be_requested_again() {
        let rejected = ticket(TicketState::Issued, RefundState::Rejected);
        assert!(ensure_can_request_refund(&rejected).is_ok());
    }

    #[test]
    fn window_closes_inside_cutoff() {
        let now = Utc::now();
        let starts_soon = now + Duration::hours(23);
        assert!(matches!(
            ensure_refund_window_open(starts_soon, 24, now).unwrap_err(),
            TicketingError::WindowClosed { cutoff_hours: 24 }
        ));
    }

    #[test]
    fn window_open_outside_cutoff() {
        let now = Utc::now();
        let starts_later = now + Duration::hours(25);
        assert!(ensure_refund_window_open(starts_later, 24, now).is_ok());
    }

    #[test]
    fn processed_request_cannot_be_processed_again() {
        let request = RefundRequest {
            id: Uuid::now_v7(),
            ticket_id: Uuid::now_v7(),
            event_id: Uuid::now_v7(),
            amount_cents: 2000,
            reason: "can no longer attend".to_string(),
            status: RefundStatus::Approved,
            requested_at: Utc::now(),
            processed_by: Some(Uuid::now_v7()),
            processed_at: Some(Utc::now()),
            note: None,
        };
        assert!(matches!(
            ensure_unprocessed(&request).unwrap_err(),
            TicketingError::AlreadyProcessed(id) if id == request.id
        ));
    }
}
