//! Integration tests for the HTTP booking client.
//!
//! Each test spins up an Axum stub backend on a random port and exercises
//! the real request/response contract.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Json;
use chrono::NaiveDate;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use booking_assist::api::{BookingApi, ClientInfo, HttpBookingClient};
use booking_assist::config::ApiConfig;
use booking_assist::error::{ApiError, GENERIC_API_MESSAGE};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests the stub has seen: `(route, body or query)`.
#[derive(Default)]
struct Recorded {
    calls: Mutex<Vec<(String, Value)>>,
}

impl Recorded {
    fn push(&self, route: &str, payload: Value) {
        self.calls.lock().unwrap().push((route.to_string(), payload));
    }

    fn last(&self, route: &str) -> Value {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(r, _)| r == route)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| panic!("no call to {route}"))
    }
}

type Shared = State<Arc<Recorded>>;

async fn create_cart(State(rec): Shared, Json(body): Json<Value>) -> Response {
    rec.push("create_cart", body.clone());
    match body["locationId"].as_str().unwrap_or_default() {
        "slow" => {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Json(json!({ "id": "late" })).into_response()
        }
        "closed" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "message": "Location closed" })),
        )
            .into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>").into_response(),
        "garbled" => Json(json!({ "unexpected": true })).into_response(),
        id => Json(json!({
            "id": format!("cart-{id}"),
            "availableCategories": [{
                "name": "Skin",
                "availableItems": [{
                    "id": "hydra",
                    "name": "HydraFacial",
                    "listPrice": 19500,
                    "listDuration": 45,
                    "staffVariants": [{
                        "id": "variant-1",
                        "staff": { "id": "staff-1", "firstName": "Sarah", "lastName": "Johnson" }
                    }]
                }]
            }]
        }))
        .into_response(),
    }
}

async fn add_item(State(rec): Shared, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    rec.push("add_item", json!({ "cart": id, "body": body }));
    Json(json!({ "id": id })).into_response()
}

async fn availability(State(rec): Shared, Query(params): Query<HashMap<String, String>>) -> Response {
    rec.push("availability", json!(params));
    Json(json!([
        { "id": "slot-1", "startTime": format!("{}T10:00:00-04:00", params["date"]) },
        { "id": "slot-2", "startTime": format!("{}T11:30:00-04:00", params["date"]) }
    ]))
    .into_response()
}

async fn reserve(State(rec): Shared, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    rec.push("reserve", body.clone());
    if body["timeSlotId"] == "taken" {
        return (StatusCode::CONFLICT, Json(json!({ "error": "Slot taken" }))).into_response();
    }
    Json(json!({ "id": id })).into_response()
}

async fn client_info(State(rec): Shared, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    rec.push("client", body);
    Json(json!({ "id": id })).into_response()
}

async fn complete(State(rec): Shared, Json(body): Json<Value>) -> Response {
    rec.push("complete", body);
    Json(json!({ "bookingId": "bk-1", "appointmentId": "ap-1" })).into_response()
}

async fn get_booking(Path(id): Path<String>) -> Response {
    Json(json!({
        "id": id,
        "status": "CONFIRMED",
        "startTime": "2025-03-10T10:00:00-04:00",
        "locationId": "89763e68-2454-429c-ae9c-c1b4d91e7b81"
    }))
    .into_response()
}

async fn cancel(State(rec): Shared, Path(id): Path<String>, Json(body): Json<Value>) -> Response {
    rec.push("cancel", body);
    Json(json!({ "id": id, "status": "CANCELLED" })).into_response()
}

/// Start the stub backend on a random port, return (base url, recorder).
async fn start_server() -> (String, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let app = Router::new()
        .route("/api/cart", post(create_cart))
        .route("/api/cart/{id}/items", post(add_item))
        .route("/api/cart/{id}/reserve", post(reserve))
        .route("/api/cart/{id}/client", put(client_info))
        .route("/api/availability", get(availability))
        .route("/api/booking", post(complete))
        .route("/api/booking/{id}", get(get_booking))
        .route("/api/booking/{id}/cancel", post(cancel))
        .with_state(Arc::clone(&recorded));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}/api"), recorded)
}

fn client(base_url: &str, deadline: Duration) -> HttpBookingClient {
    HttpBookingClient::new(&ApiConfig {
        base_url: base_url.to_string(),
        timeout: deadline,
    })
}

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

// ── Happy paths ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_cart_parses_catalog() {
    timeout(TEST_TIMEOUT, async {
        let (base, recorded) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        let cart = api.create_cart("soho-id").await.unwrap();

        assert_eq!(cart.id, "cart-soho-id");
        let item = &cart.available_categories[0].available_items[0];
        assert_eq!(item.name, "HydraFacial");
        assert_eq!(item.list_price, Some(19500));
        assert_eq!(item.staff_variants[0].staff.as_ref().unwrap().first_name, "Sarah");
        assert_eq!(recorded.last("create_cart")["locationId"], "soho-id");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn availability_sends_query_parameters() {
    timeout(TEST_TIMEOUT, async {
        let (base, recorded) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        let slots = api
            .get_available_times("cart-1", date(10), Some("staff-1"))
            .await
            .unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].id, "slot-1");

        let query = recorded.last("availability");
        assert_eq!(query["cartId"], "cart-1");
        assert_eq!(query["date"], "2025-03-10");
        assert_eq!(query["staffId"], "staff-1");

        api.get_available_times("cart-1", date(11), None).await.unwrap();
        let query = recorded.last("availability");
        assert_eq!(query["date"], "2025-03-11");
        assert!(query.get("staffId").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn add_service_passes_staff_variant() {
    timeout(TEST_TIMEOUT, async {
        let (base, recorded) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        api.add_service("cart-1", "hydra", Some("variant-1")).await.unwrap();
        let call = recorded.last("add_item");
        assert_eq!(call["cart"], "cart-1");
        assert_eq!(call["body"]["serviceId"], "hydra");
        assert_eq!(call["body"]["staffId"], "variant-1");

        api.add_service("cart-1", "hydra", None).await.unwrap();
        assert!(recorded.last("add_item")["body"]["staffId"].is_null());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn client_info_and_completion() {
    timeout(TEST_TIMEOUT, async {
        let (base, recorded) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        let info = ClientInfo {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@x.com".into(),
            phone_number: "(212) 555-0100".into(),
        };
        api.update_client_info("cart-1", &info).await.unwrap();
        let body = recorded.last("client");
        assert_eq!(body["firstName"], "Jane");
        assert_eq!(body["phoneNumber"], "(212) 555-0100");

        let confirmation = api.complete_booking("cart-1").await.unwrap();
        assert_eq!(confirmation.booking_id.as_deref(), Some("bk-1"));
        assert_eq!(confirmation.appointment_id.as_deref(), Some("ap-1"));
        let body = recorded.last("complete");
        assert_eq!(body["cartId"], "cart-1");
        assert!(body["paymentInfo"].is_null());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn get_and_cancel_booking() {
    timeout(TEST_TIMEOUT, async {
        let (base, recorded) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        let booking = api.get_booking("bk-1").await.unwrap();
        assert_eq!(booking.id, "bk-1");
        assert_eq!(booking.status.as_deref(), Some("CONFIRMED"));
        assert!(booking.start_time.is_some());

        let cancelled = api.cancel_booking("bk-1", "Schedule conflict").await.unwrap();
        assert_eq!(cancelled.status.as_deref(), Some("CANCELLED"));
        assert_eq!(recorded.last("cancel")["reason"], "Schedule conflict");
    })
    .await
    .expect("test timed out");
}

// ── Failure mapping ──────────────────────────────────────────────────

#[tokio::test]
async fn slow_backend_times_out() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;
        let api = client(&base, Duration::from_millis(100));

        let err = api.create_cart("slow").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(d) if d == Duration::from_millis(100)));
        assert_eq!(err.user_message(), "Request timeout. Please try again.");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn backend_message_is_surfaced() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        let err = api.create_cart("closed").await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 422, .. }));
        assert_eq!(err.user_message(), "Location closed");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn missing_error_body_gets_generic_message() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        let err = api.create_cart("broken").await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 500, .. }));
        assert_eq!(err.user_message(), GENERIC_API_MESSAGE);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn conflict_on_reserve_is_stale_availability() {
    timeout(TEST_TIMEOUT, async {
        let (base, recorded) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        api.reserve_slot("cart-1", "slot-1").await.unwrap();
        assert_eq!(recorded.last("reserve")["timeSlotId"], "slot-1");

        let err = api.reserve_slot("cart-1", "taken").await.unwrap_err();
        assert!(matches!(err, ApiError::StaleAvailability(ref m) if m == "Slot taken"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unexpected_shape_is_invalid_response() {
    timeout(TEST_TIMEOUT, async {
        let (base, _) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        let err = api.create_cart("garbled").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn offline_flag_short_circuits_before_the_request() {
    timeout(TEST_TIMEOUT, async {
        let (base, recorded) = start_server().await;
        let api = client(&base, Duration::from_secs(2));

        api.set_online(false);
        let err = api.create_cart("soho-id").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(recorded.calls.lock().unwrap().is_empty());

        api.set_online(true);
        assert!(api.create_cart("soho-id").await.is_ok());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn refused_connection_is_network_error() {
    timeout(TEST_TIMEOUT, async {
        // Grab a free port, then close it so nothing is listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let api = client(&format!("http://127.0.0.1:{port}/api"), Duration::from_secs(2));
        let err = api.create_cart("soho-id").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(err.user_message(), "Network error. Please check your connection.");
    })
    .await
    .expect("test timed out");
}
