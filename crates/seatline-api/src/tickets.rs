// Ticket lifecycle HTTP routes: purchase, door operations, refund requests

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use seatline_core::{NotificationBus, RefundRequest, Ticket, TicketingError};
use seatline_storage::StorageBackend;

use crate::auth::require_claims;
use crate::common::ListResponse;
use crate::error::ApiError;
use crate::services::{RefundService, TicketService};

fn default_quantity() -> u32 {
    1
}

/// Request to purchase tickets. Payment is settled upstream; this endpoint
/// claims capacity and issues the ticket records.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IssueTicketsRequest {
    /// Event to buy into.
    pub event_id: Uuid,
    /// Tier to draw from. Omit to buy against the event-level pool.
    #[serde(default)]
    pub tier_id: Option<Uuid>,
    /// Number of seats, all-or-nothing. Defaults to 1.
    #[serde(default = "default_quantity")]
    #[schema(example = 2)]
    pub quantity: u32,
}

/// Request to open a refund for a ticket
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefundRequestBody {
    /// Free-form reason shown to the organizer.
    #[schema(example = "can no longer attend")]
    pub reason: String,
}

/// App state for ticket routes
#[derive(Clone)]
pub struct AppState {
    pub ticket_service: Arc<TicketService>,
    pub refund_service: Arc<RefundService>,
}

impl AppState {
    pub fn new(store: Arc<StorageBackend>, bus: NotificationBus, cutoff_hours: i64) -> Self {
        Self {
            ticket_service: Arc::new(TicketService::new(Arc::clone(&store), bus.clone())),
            refund_service: Arc::new(RefundService::new(store, bus, cutoff_hours)),
        }
    }
}

/// Create ticket routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/tickets", post(issue_tickets))
        .route("/v1/tickets/:ticket_id", get(get_ticket))
        .route("/v1/tickets/:ticket_id/check-in", post(check_in))
        .route("/v1/tickets/:ticket_id/undo-check-in", post(undo_check_in))
        .route(
            "/v1/tickets/:ticket_id/refund-requests",
            post(request_refund),
        )
        .route("/v1/users/:user_id/tickets", get(list_user_tickets))
        .route("/v1/events/:event_id/tickets", get(list_event_tickets))
        .with_state(state)
}

/// POST /v1/tickets - Purchase tickets
#[utoipa::path(
    post,
    path = "/v1/tickets",
    request_body = IssueTicketsRequest,
    responses(
        (status = 201, description = "Tickets issued", body = ListResponse<Ticket>),
        (status = 403, description = "Not authenticated"),
        (status = 404, description = "Event or tier not found"),
        (status = 409, description = "Sold out or event not open for booking"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tickets"
)]
pub async fn issue_tickets(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<IssueTicketsRequest>,
) -> Result<(StatusCode, Json<ListResponse<Ticket>>), ApiError> {
    let claims = require_claims(&headers)?;
    if req.quantity == 0 {
        return Err(ApiError(TicketingError::invalid(
            "quantity must be at least 1",
        )));
    }

    let tickets = state
        .ticket_service
        .issue(req.event_id, req.tier_id, claims.user_id, req.quantity)
        .await?;

    Ok((StatusCode::CREATED, Json(tickets.into())))
}

/// GET /v1/tickets/{ticket_id} - Get a ticket
#[utoipa::path(
    get,
    path = "/v1/tickets/{ticket_id}",
    params(
        ("ticket_id" = Uuid, Path, description = "Ticket ID")
    ),
    responses(
        (status = 200, description = "Ticket details", body = Ticket),
        (status = 404, description = "Ticket not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tickets"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state
        .ticket_service
        .get(ticket_id)
        .await?
        .ok_or(TicketingError::TicketNotFound(ticket_id))?;
    Ok(Json(ticket))
}

/// GET /v1/users/{user_id}/tickets - List a user's tickets
#[utoipa::path(
    get,
    path = "/v1/users/{user_id}/tickets",
    params(
        ("user_id" = Uuid, Path, description = "Owner user ID")
    ),
    responses(
        (status = 200, description = "List of tickets", body = ListResponse<Ticket>),
        (status = 500, description = "Internal server error")
    ),
    tag = "tickets"
)]
pub async fn list_user_tickets(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ListResponse<Ticket>>, ApiError> {
    let tickets = state.ticket_service.list_for_owner(user_id).await?;
    Ok(Json(tickets.into()))
}

/// GET /v1/events/{event_id}/tickets - Attendance list for door staff
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}/tickets",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Tickets issued for the event", body = ListResponse<Ticket>),
        (status = 403, description = "Not the event's organizer"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tickets"
)]
pub async fn list_event_tickets(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<ListResponse<Ticket>>, ApiError> {
    let claims = require_claims(&headers)?;
    let tickets = state
        .ticket_service
        .list_for_event(event_id, claims)
        .await?;
    Ok(Json(tickets.into()))
}

/// POST /v1/tickets/{ticket_id}/check-in - Mark a ticket used at the door
#[utoipa::path(
    post,
    path = "/v1/tickets/{ticket_id}/check-in",
    params(
        ("ticket_id" = Uuid, Path, description = "Ticket ID")
    ),
    responses(
        (status = 200, description = "Ticket checked in", body = Ticket),
        (status = 404, description = "Ticket not found"),
        (status = 409, description = "Already checked in or voided"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tickets"
)]
pub async fn check_in(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state.ticket_service.check_in(ticket_id).await?;
    Ok(Json(ticket))
}

/// POST /v1/tickets/{ticket_id}/undo-check-in - Revert a scanner mistake
#[utoipa::path(
    post,
    path = "/v1/tickets/{ticket_id}/undo-check-in",
    params(
        ("ticket_id" = Uuid, Path, description = "Ticket ID")
    ),
    responses(
        (status = 200, description = "Check-in reverted", body = Ticket),
        (status = 404, description = "Ticket not found"),
        (status = 409, description = "Ticket is not checked in"),
        (status = 500, description = "Internal server error")
    ),
    tag = "tickets"
)]
pub async fn undo_check_in(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Ticket>, ApiError> {
    let ticket = state.ticket_service.undo_check_in(ticket_id).await?;
    Ok(Json(ticket))
}

/// POST /v1/tickets/{ticket_id}/refund-requests - Open a refund request
#[utoipa::path(
    post,
    path = "/v1/tickets/{ticket_id}/refund-requests",
    params(
        ("ticket_id" = Uuid, Path, description = "Ticket ID")
    ),
    request_body = RefundRequestBody,
    responses(
        (status = 201, description = "Refund request opened", body = RefundRequest),
        (status = 403, description = "Not the ticket's owner"),
        (status = 404, description = "Ticket not found"),
        (status = 409, description = "Ticket used, voided, or already under refund"),
        (status = 422, description = "Refund window has closed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "refunds"
)]
pub async fn request_refund(
    State(state): State<AppState>,
    Path(ticket_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<RefundRequestBody>,
) -> Result<(StatusCode, Json<RefundRequest>), ApiError> {
    let claims = require_claims(&headers)?;
    let ticket = state
        .ticket_service
        .get(ticket_id)
        .await?
        .ok_or(TicketingError::TicketNotFound(ticket_id))?;
    if ticket.owner_id != claims.user_id {
        return Err(ApiError(TicketingError::not_authorized(
            "only the ticket's owner may request a refund",
        )));
    }

    let request = state.refund_service.request(ticket_id, req.reason).await?;
    Ok((StatusCode::CREATED, Json(request)))
}
