// Integration tests for Seatline API
// Run with: cargo test --test integration_test

use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use seatline_core::{
    EventListing, EventStatus, RefundRequest, RefundStatus, Ticket, TicketState,
};

const API_BASE_URL: &str = "http://localhost:9000";
const USER_HEADER: &str = "x-seatline-user";
const ROLE_HEADER: &str = "x-seatline-role";

#[derive(Deserialize)]
struct ListBody<T> {
    data: Vec<T>,
}

async fn parse<T: DeserializeOwned>(response: reqwest::Response, what: &str) -> T {
    let status = response.status();
    let text = response.text().await.expect("Failed to read response body");
    assert!(
        status.is_success(),
        "Expected success for {}, got {}: {}",
        what,
        status,
        text
    );
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {} ({})", what, e, text))
}

#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_full_ticketing_workflow() {
    let client = reqwest::Client::new();
    let organizer = Uuid::now_v7();
    let buyer = Uuid::now_v7();

    println!("🧪 Testing full ticketing workflow...");

    // Step 1: Create an event as organizer
    println!("\n📝 Step 1: Creating event...");
    let response = client
        .post(format!("{}/v1/events", API_BASE_URL))
        .header(USER_HEADER, organizer.to_string())
        .header(ROLE_HEADER, "organizer")
        .json(&json!({
            "name": "Integration Night",
            "starts_at": Utc::now() + Duration::days(30),
            "price_cents": 2500,
            "capacity": 100
        }))
        .send()
        .await
        .expect("Failed to create event");

    assert_eq!(response.status(), 201);
    let event: EventListing = response.json().await.expect("Failed to parse event");
    println!("✅ Created event: {}", event.id);
    assert_eq!(event.status, EventStatus::Draft);
    assert_eq!(event.sold, 0);

    // Step 2: Buying against a draft event must fail
    println!("\n🚫 Step 2: Buying before publish...");
    let response = client
        .post(format!("{}/v1/tickets", API_BASE_URL))
        .header(USER_HEADER, buyer.to_string())
        .json(&json!({ "event_id": event.id, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to call ticket endpoint");
    assert_eq!(response.status(), 409);
    println!("✅ Draft event rejects purchases");

    // Step 3: Publish the event
    println!("\n📣 Step 3: Publishing event...");
    let response = client
        .post(format!("{}/v1/events/{}/publish", API_BASE_URL, event.id))
        .header(USER_HEADER, organizer.to_string())
        .header(ROLE_HEADER, "organizer")
        .send()
        .await
        .expect("Failed to publish event");
    let published: EventListing = parse(response, "published event").await;
    assert_eq!(published.status, EventStatus::Published);
    println!("✅ Event published");

    // Step 4: Buy two tickets
    println!("\n🎟️  Step 4: Buying tickets...");
    let response = client
        .post(format!("{}/v1/tickets", API_BASE_URL))
        .header(USER_HEADER, buyer.to_string())
        .json(&json!({ "event_id": event.id, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to buy tickets");
    assert_eq!(response.status(), 201);
    let tickets: ListBody<Ticket> = response.json().await.expect("Failed to parse tickets");
    assert_eq!(tickets.data.len(), 2);
    assert!(tickets.data.iter().all(|t| t.price_paid_cents == 2500));
    println!("✅ Issued {} tickets", tickets.data.len());

    // Step 5: Owner's ticket list includes them
    println!("\n📋 Step 5: Listing buyer's tickets...");
    let response = client
        .get(format!("{}/v1/users/{}/tickets", API_BASE_URL, buyer))
        .send()
        .await
        .expect("Failed to list tickets");
    let owned: ListBody<Ticket> = parse(response, "owner tickets").await;
    assert_eq!(owned.data.len(), 2);
    println!("✅ Buyer owns {} tickets", owned.data.len());

    // Step 6: Check in one ticket, twice
    let ticket = &tickets.data[0];
    println!("\n🚪 Step 6: Checking in ticket {}...", ticket.id);
    let response = client
        .post(format!("{}/v1/tickets/{}/check-in", API_BASE_URL, ticket.id))
        .send()
        .await
        .expect("Failed to check in");
    let checked: Ticket = parse(response, "checked-in ticket").await;
    assert_eq!(checked.state, TicketState::CheckedIn);

    let response = client
        .post(format!("{}/v1/tickets/{}/check-in", API_BASE_URL, ticket.id))
        .send()
        .await
        .expect("Failed to call check-in");
    assert_eq!(response.status(), 409, "double check-in must conflict");
    println!("✅ Check-in once, duplicate rejected");

    // Step 7: Undo the check-in
    println!("\n↩️  Step 7: Undoing check-in...");
    let response = client
        .post(format!(
            "{}/v1/tickets/{}/undo-check-in",
            API_BASE_URL, ticket.id
        ))
        .send()
        .await
        .expect("Failed to undo check-in");
    let reverted: Ticket = parse(response, "reverted ticket").await;
    assert_eq!(reverted.state, TicketState::Issued);
    println!("✅ Check-in reverted");

    // Step 8: Sales stats
    println!("\n📊 Step 8: Fetching stats...");
    let response = client
        .get(format!("{}/v1/events/{}/stats", API_BASE_URL, event.id))
        .send()
        .await
        .expect("Failed to get stats");
    let stats: serde_json::Value = parse(response, "stats").await;
    assert_eq!(stats["sold"], 2);
    assert_eq!(stats["gross_cents"], 5000);
    println!("✅ Stats: {}", stats);

    // Step 9: Request a refund for the second ticket
    let refundable = &tickets.data[1];
    println!("\n💸 Step 9: Requesting refund for {}...", refundable.id);
    let response = client
        .post(format!(
            "{}/v1/tickets/{}/refund-requests",
            API_BASE_URL, refundable.id
        ))
        .header(USER_HEADER, buyer.to_string())
        .json(&json!({ "reason": "plans changed" }))
        .send()
        .await
        .expect("Failed to request refund");
    assert_eq!(response.status(), 201);
    let request: RefundRequest = response.json().await.expect("Failed to parse request");
    assert_eq!(request.status, RefundStatus::Pending);
    assert_eq!(request.amount_cents, 2500);
    println!("✅ Refund request opened: {}", request.id);

    // Step 10: Attendee may not process it
    println!("\n🚫 Step 10: Attendee tries to process...");
    let response = client
        .post(format!(
            "{}/v1/refund-requests/{}/process",
            API_BASE_URL, request.id
        ))
        .header(USER_HEADER, buyer.to_string())
        .json(&json!({ "decision": "approve" }))
        .send()
        .await
        .expect("Failed to call process endpoint");
    assert_eq!(response.status(), 403);
    println!("✅ Attendee is rejected");

    // Step 11: Organizer approves, ticket becomes void
    println!("\n✅ Step 11: Organizer approves refund...");
    let response = client
        .post(format!(
            "{}/v1/refund-requests/{}/process",
            API_BASE_URL, request.id
        ))
        .header(USER_HEADER, organizer.to_string())
        .header(ROLE_HEADER, "organizer")
        .json(&json!({ "decision": "approve", "note": "ok" }))
        .send()
        .await
        .expect("Failed to process refund");
    let processed: RefundRequest = parse(response, "processed request").await;
    assert_eq!(processed.status, RefundStatus::Approved);

    let response = client
        .post(format!(
            "{}/v1/tickets/{}/check-in",
            API_BASE_URL, refundable.id
        ))
        .send()
        .await
        .expect("Failed to call check-in");
    assert_eq!(response.status(), 409, "voided ticket must be barred");
    println!("✅ Refunded ticket is void at the door");

    // Step 12: Net takings reflect the refund
    println!("\n📊 Step 12: Stats after refund...");
    let response = client
        .get(format!("{}/v1/events/{}/stats", API_BASE_URL, event.id))
        .send()
        .await
        .expect("Failed to get stats");
    let stats: serde_json::Value = parse(response, "stats").await;
    assert_eq!(stats["sold"], 2, "sold never decrements");
    assert_eq!(stats["gross_cents"], 2500);
    println!("✅ Stats: {}", stats);

    // Step 13: Organizer ledger has one sale per ticket plus the refund
    println!("\n🧾 Step 13: Fetching ledger...");
    let response = client
        .get(format!("{}/v1/events/{}/ledger", API_BASE_URL, event.id))
        .header(USER_HEADER, organizer.to_string())
        .header(ROLE_HEADER, "organizer")
        .send()
        .await
        .expect("Failed to get ledger");
    let entries: ListBody<serde_json::Value> = parse(response, "ledger").await;
    assert_eq!(entries.data.len(), 3, "two sales and one refund");
    let total: i64 = entries
        .data
        .iter()
        .map(|e| e["amount_cents"].as_i64().unwrap())
        .sum();
    assert_eq!(total, 2500);
    println!("✅ Ledger has {} entries", entries.data.len());

    // Step 14: Organizer pulls the door list; anonymous callers may not
    println!("\n🗒️  Step 14: Fetching attendance list...");
    let response = client
        .get(format!("{}/v1/events/{}/tickets", API_BASE_URL, event.id))
        .header(USER_HEADER, organizer.to_string())
        .header(ROLE_HEADER, "organizer")
        .send()
        .await
        .expect("Failed to list event tickets");
    let attendance: ListBody<Ticket> = parse(response, "event tickets").await;
    assert_eq!(attendance.data.len(), 2);

    let response = client
        .get(format!("{}/v1/events/{}/tickets", API_BASE_URL, event.id))
        .send()
        .await
        .expect("Failed to call event tickets endpoint");
    assert_eq!(response.status(), 403);
    println!("✅ Door list is organizer-only");

    // Step 15: Cancel the event; further purchases are rejected
    println!("\n🛑 Step 15: Cancelling event...");
    let response = client
        .post(format!("{}/v1/events/{}/cancel", API_BASE_URL, event.id))
        .header(USER_HEADER, organizer.to_string())
        .header(ROLE_HEADER, "organizer")
        .send()
        .await
        .expect("Failed to cancel event");
    let cancelled: EventListing = parse(response, "cancelled event").await;
    assert_eq!(cancelled.status, EventStatus::Cancelled);

    let response = client
        .post(format!("{}/v1/tickets", API_BASE_URL))
        .header(USER_HEADER, buyer.to_string())
        .json(&json!({ "event_id": event.id, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to call ticket endpoint");
    assert_eq!(response.status(), 409, "cancelled event must reject purchases");
    println!("✅ Cancelled event is closed for sale");

    println!("\n🎉 All tests passed!");
}

#[tokio::test]
#[ignore]
async fn test_sold_out_event_returns_conflict() {
    let client = reqwest::Client::new();
    let organizer = Uuid::now_v7();

    println!("🧪 Testing sold-out behavior...");

    let response = client
        .post(format!("{}/v1/events", API_BASE_URL))
        .header(USER_HEADER, organizer.to_string())
        .header(ROLE_HEADER, "organizer")
        .json(&json!({
            "name": "Tiny Room",
            "starts_at": Utc::now() + Duration::days(7),
            "price_cents": 1000,
            "capacity": 1
        }))
        .send()
        .await
        .expect("Failed to create event");
    let event: EventListing = parse(response, "event").await;

    client
        .post(format!("{}/v1/events/{}/publish", API_BASE_URL, event.id))
        .header(USER_HEADER, organizer.to_string())
        .header(ROLE_HEADER, "organizer")
        .send()
        .await
        .expect("Failed to publish event");

    let response = client
        .post(format!("{}/v1/tickets", API_BASE_URL))
        .header(USER_HEADER, Uuid::now_v7().to_string())
        .json(&json!({ "event_id": event.id, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to buy ticket");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/v1/tickets", API_BASE_URL))
        .header(USER_HEADER, Uuid::now_v7().to_string())
        .json(&json!({ "event_id": event.id, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to call ticket endpoint");
    assert_eq!(response.status(), 409);

    let body: serde_json::Value = response.json().await.expect("Failed to parse error");
    assert_eq!(body["error"], "capacity_exceeded");
    println!("✅ Sold out maps to 409 capacity_exceeded");
}

#[tokio::test]
#[ignore]
async fn test_health_endpoint() {
    let client = reqwest::Client::new();

    println!("🏥 Testing health endpoint...");
    let response = client
        .get(format!("{}/health", API_BASE_URL))
        .send()
        .await
        .expect("Failed to call health endpoint");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    println!("✅ Health check: {:?}", body);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
#[ignore]
async fn test_openapi_spec() {
    let client = reqwest::Client::new();

    println!("📖 Testing OpenAPI spec endpoint...");
    let response = client
        .get(format!("{}/api-doc/openapi.json", API_BASE_URL))
        .send()
        .await
        .expect("Failed to get OpenAPI spec");

    assert_eq!(response.status(), 200);
    let spec: serde_json::Value = response.json().await.expect("Failed to parse spec");
    println!("✅ OpenAPI spec title: {}", spec["info"]["title"]);
    assert_eq!(spec["info"]["title"], "Seatline API");
}
