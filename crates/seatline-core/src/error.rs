// Error types for the ticketing core

use thiserror::Error;
use uuid::Uuid;

/// Result type alias for ticketing operations
pub type Result<T> = std::result::Result<T, TicketingError>;

/// Errors that can occur in the ticketing core
///
/// Every variant maps to a concrete, user-visible outcome ("sold out",
/// "ticket already used at door") and is returned synchronously to the
/// caller, never swallowed.
#[derive(Debug, Error)]
pub enum TicketingError {
    /// Requested quantity would push sold past allocation
    #[error("Capacity exceeded for the requested tier")]
    CapacityExceeded,

    /// Tier does not exist or does not belong to the event
    #[error("Tier not found: {0}")]
    TierNotFound(Uuid),

    /// Event does not exist
    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    /// Event is not in a published, bookable state
    #[error("Event is not open for booking: {0}")]
    EventNotBookable(Uuid),

    /// Ticket does not exist
    #[error("Ticket not found: {0}")]
    TicketNotFound(Uuid),

    /// Ticket was already checked in (duplicate entry at the door)
    #[error("Ticket already checked in: {0}")]
    AlreadyCheckedIn(Uuid),

    /// Ticket is not checked in, so check-in cannot be undone
    #[error("Ticket is not checked in: {0}")]
    NotCheckedIn(Uuid),

    /// Ticket was voided by an approved refund
    #[error("Ticket was refunded and is void: {0}")]
    TicketVoided(Uuid),

    /// Ticket was already used, so it cannot be refunded
    #[error("Ticket already used at the door: {0}")]
    AlreadyUsed(Uuid),

    /// An active refund request already exists for this ticket
    #[error("A refund request is already pending for ticket {0}")]
    RefundAlreadyPending(Uuid),

    /// Refund window has closed relative to the event start time
    #[error("Refund window closed: event starts within {cutoff_hours} hours")]
    WindowClosed { cutoff_hours: i64 },

    /// Refund request does not exist
    #[error("Refund request not found: {0}")]
    RefundRequestNotFound(Uuid),

    /// Refund request was already processed
    #[error("Refund request already processed: {0}")]
    AlreadyProcessed(Uuid),

    /// Caller lacks the role required for this operation
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Invalid input (e.g. quantity < 1)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error (storage or infrastructure)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl TicketingError {
    /// Create a not-authorized error
    pub fn not_authorized(msg: impl Into<String>) -> Self {
        TicketingError::NotAuthorized(msg.into())
    }

    /// Create an invalid-request error
    pub fn invalid(msg: impl Into<String>) -> Self {
        TicketingError::InvalidRequest(msg.into())
    }

    /// Create an internal error from a storage failure
    pub fn internal(msg: impl Into<String>) -> Self {
        TicketingError::Internal(anyhow::anyhow!(msg.into()))
    }
}
