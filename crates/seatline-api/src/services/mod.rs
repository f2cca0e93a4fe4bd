// Services layer for business logic
// Services own business logic and validation, calling storage directly and
// publishing to the notification bus after each committed mutation

pub mod event;
pub mod refund;
pub mod ticket;

pub use event::EventService;
pub use refund::RefundService;
pub use ticket::TicketService;

use seatline_core::{
    EventListing, EventStatus, LedgerEntry, LedgerEntryKind, RefundRequest, RefundState,
    RefundStatus, Ticket, TicketState, TicketTier,
};
use seatline_storage::{EventRow, LedgerEntryRow, RefundRequestRow, TicketRow, TierRow};

pub(crate) fn row_to_event(row: EventRow) -> EventListing {
    EventListing {
        id: row.id,
        organizer_id: row.organizer_id,
        name: row.name,
        starts_at: row.starts_at,
        price_cents: row.price_cents,
        capacity: row.capacity,
        sold: row.sold,
        status: EventStatus::from(row.status.as_str()),
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn row_to_tier(row: TierRow) -> TicketTier {
    TicketTier {
        id: row.id,
        event_id: row.event_id,
        name: row.name,
        price_cents: row.price_cents,
        allocation: row.allocation,
        sold: row.sold,
        created_at: row.created_at,
    }
}

pub(crate) fn row_to_ticket(row: TicketRow) -> Ticket {
    Ticket {
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

pub(crate) fn row_to_ledger_entry(row: LedgerEntryRow) -> LedgerEntry {
    LedgerEntry {
        id: row.id,
        event_id: row.event_id,
        ticket_id: row.ticket_id,
        amount_cents: row.amount_cents,
        kind: LedgerEntryKind::from(row.kind.as_str()),
        created_at: row.created_at,
    }
}

pub(crate) fn row_to_refund_request(row: RefundRequestRow) -> RefundRequest {
    RefundRequest {
        id: row.id,
        ticket_id: row.ticket_id,
        event_id: row.event_id,
        amount_cents: row.amount_cents,
        reason: row.reason,
        status: RefundStatus::from(row.status.as_str()),
        requested_at: row.requested_at,
        processed_by: row.processed_by,
        processed_at: row.processed_at,
        note: row.note,
    }
}
