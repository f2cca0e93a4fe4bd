// Ticketing Domain Core
//
// This crate provides the storage-agnostic core of the Seatline ticketing
// platform: entities, the ticket lifecycle state machine, and the in-process
// notification bus.
//
// Key design decisions:
// - Lifecycle preconditions are pure functions over entities so they are
//   unit-testable without a database or network
// - Capacity rules (sold <= allocation) are stated here and enforced
//   atomically by each storage backend
// - The notification bus is room-scoped fan-out over bounded broadcast
//   channels: at-most-once, publish-order per room, no replay
// - Domain entity types are defined here for shared use by API and storage

// Domain entity types
pub mod event;
pub mod ledger;
pub mod refund;
pub mod ticket;

pub mod bus;
pub mod error;
pub mod events;
pub mod lifecycle;

// Re-exports for convenience
pub use bus::{NotificationBus, Room};
pub use error::{Result, TicketingError};
pub use event::{EventListing, EventStatus, TicketTier};
pub use events::{DomainEvent, Envelope, EnvelopeKind};
pub use ledger::{LedgerEntry, LedgerEntryKind, Reservation};
pub use refund::{RefundDecision, RefundRequest, RefundStatus};
pub use ticket::{RefundState, Ticket, TicketState};
