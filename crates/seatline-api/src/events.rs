// Event and tier HTTP routes

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use seatline_core::{EventListing, LedgerEntry, TicketTier, TicketingError};
use seatline_storage::{CreateEvent, CreateTier, StorageBackend};

use crate::auth::require_claims;
use crate::common::{EventStats, ListResponse};
use crate::error::ApiError;
use crate::services::EventService;

/// Request to create an event listing
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    /// Display name of the event.
    #[schema(example = "Warehouse Live 2026")]
    pub name: String,
    /// When the event starts. Drives the refund cutoff window.
    pub starts_at: DateTime<Utc>,
    /// Flat ticket price in cents, used when no tier is referenced.
    #[schema(example = 2000)]
    pub price_cents: i64,
    /// Event-level capacity. Omit for unlimited.
    #[serde(default)]
    pub capacity: Option<i32>,
}

/// Request to add a ticket tier to an event
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTierRequest {
    /// Tier name.
    #[schema(example = "Early Bird")]
    pub name: String,
    /// Tier price in cents.
    #[schema(example = 1500)]
    pub price_cents: i64,
    /// Tier allocation. Omit for unlimited.
    #[serde(default)]
    pub allocation: Option<i32>,
}

/// App state for event routes
#[derive(Clone)]
pub struct AppState {
    pub event_service: Arc<EventService>,
}

impl AppState {
    pub fn new(store: Arc<StorageBackend>) -> Self {
        Self {
            event_service: Arc::new(EventService::new(store)),
        }
    }
}

/// Create event routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", post(create_event).get(list_events))
        .route("/v1/events/:event_id", get(get_event))
        .route("/v1/events/:event_id/publish", post(publish_event))
        .route("/v1/events/:event_id/cancel", post(cancel_event))
        .route(
            "/v1/events/:event_id/tiers",
            post(create_tier).get(list_tiers),
        )
        .route("/v1/events/:event_id/stats", get(event_stats))
        .route("/v1/events/:event_id/ledger", get(event_ledger))
        .with_state(state)
}

/// POST /v1/events - Create a new event listing (draft)
#[utoipa::path(
    post,
    path = "/v1/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created successfully", body = EventListing),
        (status = 403, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventListing>), ApiError> {
    let claims = require_claims(&headers)?;
    let event = state
        .event_service
        .create(CreateEvent {
            organizer_id: claims.user_id,
            name: req.name,
            starts_at: req.starts_at,
            price_cents: req.price_cents,
            capacity: req.capacity,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /v1/events - List event listings
#[utoipa::path(
    get,
    path = "/v1/events",
    responses(
        (status = 200, description = "List of events", body = ListResponse<EventListing>),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<ListResponse<EventListing>>, ApiError> {
    let events = state.event_service.list().await?;
    Ok(Json(events.into()))
}

/// GET /v1/events/{event_id} - Get an event listing
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event details", body = EventListing),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventListing>, ApiError> {
    let event = state
        .event_service
        .get(event_id)
        .await?
        .ok_or(TicketingError::EventNotFound(event_id))?;
    Ok(Json(event))
}

/// POST /v1/events/{event_id}/publish - Open an event for booking
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/publish",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event published", body = EventListing),
        (status = 403, description = "Not the event's organizer"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn publish_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<EventListing>, ApiError> {
    let claims = require_claims(&headers)?;
    let event = state
        .event_service
        .get(event_id)
        .await?
        .ok_or(TicketingError::EventNotFound(event_id))?;
    if !claims.can_manage(event.organizer_id) {
        return Err(ApiError(TicketingError::not_authorized(
            "only the organizer may publish this event",
        )));
    }

    let event = state.event_service.publish(event_id).await?;
    Ok(Json(event))
}

/// POST /v1/events/{event_id}/cancel - Withdraw an event from sale
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/cancel",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event cancelled", body = EventListing),
        (status = 403, description = "Not the event's organizer"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn cancel_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<EventListing>, ApiError> {
    let claims = require_claims(&headers)?;
    let event = state
        .event_service
        .get(event_id)
        .await?
        .ok_or(TicketingError::EventNotFound(event_id))?;
    if !claims.can_manage(event.organizer_id) {
        return Err(ApiError(TicketingError::not_authorized(
            "only the organizer may cancel this event",
        )));
    }

    let event = state.event_service.cancel(event_id).await?;
    Ok(Json(event))
}

/// POST /v1/events/{event_id}/tiers - Add a ticket tier
#[utoipa::path(
    post,
    path = "/v1/events/{event_id}/tiers",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    request_body = CreateTierRequest,
    responses(
        (status = 201, description = "Tier created successfully", body = TicketTier),
        (status = 403, description = "Not the event's organizer"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn create_tier(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<CreateTierRequest>,
) -> Result<(StatusCode, Json<TicketTier>), ApiError> {
    let claims = require_claims(&headers)?;
    let event = state
        .event_service
        .get(event_id)
        .await?
        .ok_or(TicketingError::EventNotFound(event_id))?;
    if !claims.can_manage(event.organizer_id) {
        return Err(ApiError(TicketingError::not_authorized(
            "only the organizer may add tiers",
        )));
    }

    let tier = state
        .event_service
        .create_tier(CreateTier {
            event_id,
            name: req.name,
            price_cents: req.price_cents,
            allocation: req.allocation,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(tier)))
}

/// GET /v1/events/{event_id}/tiers - List an event's tiers
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}/tiers",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "List of tiers", body = ListResponse<TicketTier>),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn list_tiers(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ListResponse<TicketTier>>, ApiError> {
    let tiers = state.event_service.list_tiers(event_id).await?;
    Ok(Json(tiers.into()))
}

/// GET /v1/events/{event_id}/stats - Sales snapshot for a dashboard
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}/stats",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Sales snapshot", body = EventStats),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn event_stats(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventStats>, ApiError> {
    let stats = state.event_service.stats(event_id).await?;
    Ok(Json(stats))
}

/// GET /v1/events/{event_id}/ledger - Money movements for an event
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}/ledger",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Ledger entries, oldest first", body = ListResponse<LedgerEntry>),
        (status = 403, description = "Not the event's organizer"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn event_ledger(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ListResponse<LedgerEntry>>, ApiError> {
    let claims = require_claims(&headers)?;
    let event = state
        .event_service
        .get(event_id)
        .await?
        .ok_or(TicketingError::EventNotFound(event_id))?;
    if !claims.can_manage(event.organizer_id) {
        return Err(ApiError(TicketingError::not_authorized(
            "only the organizer may view the ledger",
        )));
    }

    let entries = state.event_service.ledger(event_id).await?;
    Ok(Json(entries.into()))
}
