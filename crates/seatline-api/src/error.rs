// HTTP mapping for the domain error taxonomy
//
// Every TicketingError variant maps to a concrete status code and a stable
// machine-readable code string, so "sold out" and "already used at the door"
// reach the client as distinct outcomes instead of a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use seatline_core::TicketingError;

/// JSON error body returned by all endpoints
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Stable machine-readable error code
    pub error: &'static str,
    /// Human-readable description
    pub message: String,
}

/// Wrapper turning a TicketingError into an HTTP response
#[derive(Debug)]
pub struct ApiError(pub TicketingError);

impl From<TicketingError> for ApiError {
    fn from(err: TicketingError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match &self.0 {
            TicketingError::CapacityExceeded => "capacity_exceeded",
            TicketingError::TierNotFound(_) => "tier_not_found",
            TicketingError::EventNotFound(_) => "event_not_found",
            TicketingError::EventNotBookable(_) => "event_not_bookable",
            TicketingError::TicketNotFound(_) => "ticket_not_found",
            TicketingError::AlreadyCheckedIn(_) => "already_checked_in",
            TicketingError::NotCheckedIn(_) => "not_checked_in",
            TicketingError::TicketVoided(_) => "ticket_voided",
            TicketingError::AlreadyUsed(_) => "already_used",
            TicketingError::RefundAlreadyPending(_) => "refund_already_pending",
            TicketingError::WindowClosed { .. } => "window_closed",
            TicketingError::RefundRequestNotFound(_) => "refund_request_not_found",
            TicketingError::AlreadyProcessed(_) => "already_processed",
            TicketingError::NotAuthorized(_) => "not_authorized",
            TicketingError::InvalidRequest(_) => "invalid_request",
            TicketingError::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match &self.0 {
            TicketingError::TierNotFound(_)
            | TicketingError::EventNotFound(_)
            | TicketingError::TicketNotFound(_)
            | TicketingError::RefundRequestNotFound(_) => StatusCode::NOT_FOUND,

            TicketingError::CapacityExceeded
            | TicketingError::EventNotBookable(_)
            | TicketingError::AlreadyCheckedIn(_)
            | TicketingError::NotCheckedIn(_)
            | TicketingError::TicketVoided(_)
            | TicketingError::AlreadyUsed(_)
            | TicketingError::RefundAlreadyPending(_)
            | TicketingError::AlreadyProcessed(_) => StatusCode::CONFLICT,

            TicketingError::WindowClosed { .. } | TicketingError::InvalidRequest(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            TicketingError::NotAuthorized(_) => StatusCode::FORBIDDEN,

            TicketingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {:#}", self.0);
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
