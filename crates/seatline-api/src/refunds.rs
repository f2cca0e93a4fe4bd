// Refund processing HTTP routes (organizer side)

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use seatline_core::{NotificationBus, RefundDecision, RefundRequest, TicketingError};
use seatline_storage::StorageBackend;

use crate::auth::require_claims;
use crate::common::ListResponse;
use crate::error::ApiError;
use crate::services::RefundService;

/// Organizer's verdict on a pending refund request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProcessRefundRequest {
    /// `approve` or `reject`.
    pub decision: RefundDecision,
    /// Optional note recorded with the decision.
    #[serde(default)]
    pub note: Option<String>,
}

/// App state for refund routes
#[derive(Clone)]
pub struct AppState {
    pub refund_service: Arc<RefundService>,
}

impl AppState {
    pub fn new(store: Arc<StorageBackend>, bus: NotificationBus, cutoff_hours: i64) -> Self {
        Self {
            refund_service: Arc::new(RefundService::new(store, bus, cutoff_hours)),
        }
    }
}

/// Create refund routes
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/refund-requests/:request_id", get(get_refund_request))
        .route(
            "/v1/refund-requests/:request_id/process",
            post(process_refund_request),
        )
        .route(
            "/v1/events/:event_id/refund-requests",
            get(list_event_refund_requests),
        )
        .with_state(state)
}

/// GET /v1/refund-requests/{request_id} - Get a refund request
#[utoipa::path(
    get,
    path = "/v1/refund-requests/{request_id}",
    params(
        ("request_id" = Uuid, Path, description = "Refund request ID")
    ),
    responses(
        (status = 200, description = "Refund request details", body = RefundRequest),
        (status = 404, description = "Refund request not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "refunds"
)]
pub async fn get_refund_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RefundRequest>, ApiError> {
    let request = state
        .refund_service
        .get(request_id)
        .await?
        .ok_or(TicketingError::RefundRequestNotFound(request_id))?;
    Ok(Json(request))
}

/// GET /v1/events/{event_id}/refund-requests - List an event's refund requests
#[utoipa::path(
    get,
    path = "/v1/events/{event_id}/refund-requests",
    params(
        ("event_id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "List of refund requests", body = ListResponse<RefundRequest>),
        (status = 500, description = "Internal server error")
    ),
    tag = "refunds"
)]
pub async fn list_event_refund_requests(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<ListResponse<RefundRequest>>, ApiError> {
    let requests = state.refund_service.list_for_event(event_id).await?;
    Ok(Json(requests.into()))
}

/// POST /v1/refund-requests/{request_id}/process - Approve or reject a refund
#[utoipa::path(
    post,
    path = "/v1/refund-requests/{request_id}/process",
    params(
        ("request_id" = Uuid, Path, description = "Refund request ID")
    ),
    request_body = ProcessRefundRequest,
    responses(
        (status = 200, description = "Refund request processed", body = RefundRequest),
        (status = 403, description = "Caller may not manage this event"),
        (status = 404, description = "Refund request not found"),
        (status = 409, description = "Already processed, or ticket used at the door"),
        (status = 500, description = "Internal server error")
    ),
    tag = "refunds"
)]
pub async fn process_refund_request(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<ProcessRefundRequest>,
) -> Result<Json<RefundRequest>, ApiError> {
    let claims = require_claims(&headers)?;
    let request = state
        .refund_service
        .process(request_id, req.decision, claims, req.note)
        .await?;
    Ok(Json(request))
}
