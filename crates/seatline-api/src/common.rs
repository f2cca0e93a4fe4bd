// Common DTOs for public API
//
// These types are shared across multiple API endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response wrapper for list endpoints.
/// All list endpoints return responses wrapped in a `data` field.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    /// Array of items returned by the list operation.
    pub data: Vec<T>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

/// Sales snapshot for an event, served to organizer dashboards
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventStats {
    pub event_id: uuid::Uuid,
    /// Tickets sold across the event-level pool and all tiers
    pub sold: i32,
    /// Total bounded capacity; None when any pool is unlimited
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i32>,
    /// Tickets currently checked in at the door
    pub checked_in: i64,
    /// Net takings from the money ledger (sales minus refunds)
    pub gross_cents: i64,
}
