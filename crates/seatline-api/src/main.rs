// Seatline API server
// Decision: Postgres when DATABASE_URL is set, otherwise an in-memory dev mode
// Decision: Real-time delivery is a WebSocket gateway over the in-process bus

mod auth;
mod common;
mod error;
mod events;
mod gateway;
mod refunds;
mod services;
mod tickets;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use seatline_core::lifecycle::DEFAULT_REFUND_CUTOFF_HOURS;
use seatline_core::{
    EventListing, EventStatus, LedgerEntry, LedgerEntryKind, NotificationBus, RefundDecision,
    RefundRequest, RefundState, RefundStatus, Ticket, TicketState, TicketTier,
};
use seatline_storage::StorageBackend;

use common::{EventStats, ListResponse};
use error::ErrorBody;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage_mode: &'static str,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage_mode: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage_mode: state.storage_mode,
    })
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        events::create_event,
        events::list_events,
        events::get_event,
        events::publish_event,
        events::cancel_event,
        events::create_tier,
        events::list_tiers,
        events::event_stats,
        events::event_ledger,
        tickets::issue_tickets,
        tickets::get_ticket,
        tickets::list_user_tickets,
        tickets::list_event_tickets,
        tickets::check_in,
        tickets::undo_check_in,
        tickets::request_refund,
        refunds::get_refund_request,
        refunds::list_event_refund_requests,
        refunds::process_refund_request,
        gateway::ws_upgrade,
    ),
    components(
        schemas(
            EventListing, EventStatus, TicketTier,
            Ticket, TicketState, RefundState,
            RefundRequest, RefundStatus, RefundDecision,
            LedgerEntry, LedgerEntryKind,
            events::CreateEventRequest,
            events::CreateTierRequest,
            tickets::IssueTicketsRequest,
            tickets::RefundRequestBody,
            refunds::ProcessRefundRequest,
            ListResponse<EventListing>,
            ListResponse<TicketTier>,
            ListResponse<Ticket>,
            ListResponse<RefundRequest>,
            ListResponse<LedgerEntry>,
            EventStats,
            ErrorBody,
        )
    ),
    tags(
        (name = "events", description = "Event and tier management endpoints"),
        (name = "tickets", description = "Ticket purchase and door endpoints"),
        (name = "refunds", description = "Refund request endpoints"),
        (name = "gateway", description = "Real-time notification WebSocket")
    ),
    info(
        title = "Seatline API",
        version = "0.2.0",
        description = "API for event ticketing: capacity, ticket lifecycle, refunds, and live notifications",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatline_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("seatline-api starting...");

    // Initialize storage: Postgres when configured, in-memory otherwise
    let store = match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let store = StorageBackend::postgres(&url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            store
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set, running in-memory (dev mode, data is volatile)");
            StorageBackend::in_memory()
        }
    };
    let storage_mode = if store.is_dev_mode() {
        "in-memory"
    } else {
        "postgres"
    };
    let store = Arc::new(store);

    // Refund cutoff: requests must arrive this many hours before doors
    let cutoff_hours = std::env::var("REFUND_CUTOFF_HOURS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(DEFAULT_REFUND_CUTOFF_HOURS);
    tracing::info!(cutoff_hours, "Refund window configured");

    // One bus shared by every producer and the gateway
    let bus = NotificationBus::new();

    // Create module-specific states
    let events_state = events::AppState::new(store.clone());
    let tickets_state = tickets::AppState::new(store.clone(), bus.clone(), cutoff_hours);
    let refunds_state = refunds::AppState::new(store.clone(), bus.clone(), cutoff_hours);
    let gateway_state = gateway::AppState::new(bus.clone());
    let health_state = HealthState { storage_mode };

    // Load API prefix from environment (default: empty)
    // Example: API_PREFIX="/api" results in routes like /api/v1/events
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    // Load CORS allowed origins from environment (optional)
    // Example: CORS_ALLOWED_ORIGINS="https://app.example.com,https://box-office.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    // Build API routes
    let api_routes = Router::new()
        .merge(events::routes(events_state))
        .merge(tickets::routes(tickets_state))
        .merge(refunds::routes(refunds_state))
        .merge(gateway::routes(gateway_state));

    // Build main router with health (not prefixed) and prefixed API routes
    let mut app = Router::new().route("/health", get(health).with_state(health_state));

    // Apply API prefix if configured
    app = app.merge(build_router_with_prefix(api_routes, &api_prefix));

    // Add Swagger UI
    let app =
        app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    header::ORIGIN,
                    header::HeaderName::from_static(auth::USER_HEADER),
                    header::HeaderName::from_static(auth::ROLE_HEADER),
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let port = std::env::var("PORT").unwrap_or_else(|_| "9000".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Build router with optional API prefix (extracted for testing)
fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/v1/test", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_api_prefix_empty() {
        let app = build_router_with_prefix(test_routes(), "");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_prefix_set() {
        let app = build_router_with_prefix(test_routes(), "/api");

        // Route should work with prefix
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);

        // Route should NOT work without prefix
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/v1/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
    }
}
