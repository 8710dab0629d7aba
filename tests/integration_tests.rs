use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use medspa_booking::clock::FixedClock;
use medspa_booking::config::AppConfig;
use medspa_booking::db;
use medspa_booking::handlers;
use medspa_booking::services::events::BookingEventKind;
use medspa_booking::state::AppState;

// ── Helpers ──

const API_KEY: &str = "test-key";

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        api_key: API_KEY.to_string(),
        slot_minutes: 30,
        seed_demo_data: true,
        public_base_url: "http://spa.test".to_string(),
    }
}

/// Seeded database with the clock fixed on Sunday 2025-06-01 08:00.
fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    db::seed::seed_demo_data(&conn).unwrap();
    let clock = FixedClock::at("2025-06-01 08:00:00").unwrap();
    Arc::new(AppState::new(conn, test_config(), Box::new(clock)))
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(state: &Arc<AppState>, req: Request<Body>) -> Response {
    test_app(state.clone()).oneshot(req).await.unwrap()
}

async fn body_json(res: Response) -> Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn booking_body(date: &str, time: &str) -> Value {
    json!({
        "clientName": "Jane Doe",
        "clientEmail": "jane@example.com",
        "clientPhone": "+1-555-0199",
        "serviceId": "srv_002",
        "date": date,
        "time": time,
    })
}

async fn create_booking(state: &Arc<AppState>, date: &str, time: &str) -> Value {
    let res = call(state, send_json("POST", "/api/v1/bookings", booking_body(date, time))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await["data"].clone()
}

// ── Health & API key ──

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "OK");
}

#[tokio::test]
async fn test_wrong_api_key_rejected() {
    let state = test_state();
    let res = call(
        &state,
        Request::builder()
            .uri("/api/v1/services")
            .header("x-api-key", "wrong-key")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(res).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "unauthorized");
}

#[tokio::test]
async fn test_missing_api_key_allowed() {
    let state = test_state();
    let res = call(
        &state,
        Request::builder()
            .uri("/api/v1/services")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_key_in_query() {
    let state = test_state();
    let ok = call(
        &state,
        Request::builder()
            .uri(format!("/api/v1/services?api_key={API_KEY}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(ok.status(), StatusCode::OK);

    let bad = call(
        &state,
        Request::builder()
            .uri("/api/v1/services?api_key=nope")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);
}

// ── Bookings ──

#[tokio::test]
async fn test_list_seeded_bookings_with_filter() {
    let state = test_state();

    let all = body_json(call(&state, get("/api/v1/bookings")).await).await;
    assert_eq!(all["success"], true);
    assert_eq!(all["count"], 6);
    assert_eq!(all["data"][0]["clientName"], "Sarah Johnson");
    assert_eq!(all["data"][0]["time"], "10:00");

    let cancelled = body_json(call(&state, get("/api/v1/bookings?status=cancelled")).await).await;
    assert_eq!(cancelled["count"], 1);
    assert_eq!(cancelled["data"][0]["clientName"], "Robert Taylor");

    let bad = call(&state, get("/api/v1/bookings?status=done")).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_booking_snapshots_service() {
    let state = test_state();
    let booking = create_booking(&state, "2025-06-02", "10:00").await;

    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["service"], "Hydrafacial");
    assert_eq!(booking["duration"], 90);
    assert_eq!(booking["price"], 250.0);
    assert_eq!(booking["depositAmount"], 50.0);
    assert_eq!(booking["depositPaid"], false);
    assert_eq!(booking["createdAt"], "2025-06-01T08:00:00");
}

#[tokio::test]
async fn test_create_missing_fields() {
    let state = test_state();
    let res = call(
        &state,
        send_json("POST", "/api/v1/bookings", json!({ "clientName": "Jane" })),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["kind"], "validation");
    let error = json["error"].as_str().unwrap();
    assert!(error.contains("clientEmail"));
    assert!(error.contains("serviceId"));
}

#[tokio::test]
async fn test_create_unknown_service() {
    let state = test_state();
    let mut body = booking_body("2025-06-02", "10:00");
    body["serviceId"] = json!("srv_999");
    let res = call(&state, send_json("POST", "/api/v1/bookings", body)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_double_booking_conflict_then_cancel_and_retry() {
    let state = test_state();
    let first = create_booking(&state, "2025-06-02", "10:00").await;

    let res = call(
        &state,
        send_json("POST", "/api/v1/bookings", booking_body("2025-06-02", "10:00")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(res).await["kind"], "conflict");

    let id = first["id"].as_str().unwrap();
    let res = call(
        &state,
        send_json("POST", &format!("/api/v1/bookings/{id}/cancel"), json!({})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let cancelled = body_json(res).await;
    assert_eq!(cancelled["data"]["status"], "cancelled");
    assert_eq!(cancelled["data"]["cancellationReason"], "No reason provided");

    create_booking(&state, "2025-06-02", "10:00").await;
}

#[tokio::test]
async fn test_booking_outside_business_hours_rejected() {
    let state = test_state();
    // Sunday is closed
    let res = call(
        &state,
        send_json("POST", "/api/v1/bookings", booking_body("2025-06-08", "10:00")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deposit_confirms_pending_booking() {
    let state = test_state();
    let booking = create_booking(&state, "2025-06-03", "11:00").await;
    let id = booking["id"].as_str().unwrap();

    let res = call(
        &state,
        Request::builder()
            .method("POST")
            .uri(format!("/api/v1/bookings/{id}/deposit"))
            .header("x-api-key", API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["status"], "confirmed");
    assert_eq!(json["data"]["depositPaid"], true);
    assert_eq!(json["data"]["depositPaidAt"], "2025-06-01T08:00:00");
}

#[tokio::test]
async fn test_cancelled_booking_cannot_be_confirmed() {
    let state = test_state();
    let booking = create_booking(&state, "2025-06-03", "11:00").await;
    let id = booking["id"].as_str().unwrap();

    call(
        &state,
        send_json(
            "POST",
            &format!("/api/v1/bookings/{id}/cancel"),
            json!({ "reason": "Client request" }),
        ),
    )
    .await;

    let res = call(
        &state,
        send_json("POST", &format!("/api/v1/bookings/{id}/confirm"), json!({})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(res).await["kind"], "invalid_state");
}

#[tokio::test]
async fn test_update_and_reschedule() {
    let state = test_state();
    let booking = create_booking(&state, "2025-06-03", "11:00").await;
    let id = booking["id"].as_str().unwrap();

    let res = call(
        &state,
        send_json(
            "PATCH",
            &format!("/api/v1/bookings/{id}"),
            json!({ "notes": "Bring ID", "time": "15:30" }),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["id"], id);
    assert_eq!(json["data"]["notes"], "Bring ID");
    assert_eq!(json["data"]["time"], "15:30");

    let check = body_json(
        call(&state, get("/api/v1/availability/check?date=2025-06-03&time=11:00")).await,
    )
    .await;
    assert_eq!(check["data"]["available"], true);
}

#[tokio::test]
async fn test_get_and_delete_booking() {
    let state = test_state();
    let booking = create_booking(&state, "2025-06-03", "11:00").await;
    let id = booking["id"].as_str().unwrap();

    let res = call(&state, get(&format!("/api/v1/bookings/{id}"))).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = call(
        &state,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/bookings/{id}"))
            .header("x-api-key", API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = call(&state, get(&format!("/api/v1/bookings/{id}"))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["kind"], "not_found");
}

// ── Availability ──

#[tokio::test]
async fn test_monday_slots() {
    let state = test_state();
    let json = body_json(call(&state, get("/api/v1/availability?date=2025-06-02&days=1")).await).await;

    assert_eq!(json["count"], 18);
    assert_eq!(json["data"][0]["time"], "09:00");
    assert_eq!(json["data"][17]["time"], "17:30");
    assert_eq!(json["businessHours"]["sunday"]["isOpen"], false);

    create_booking(&state, "2025-06-02", "10:00").await;
    let json = body_json(call(&state, get("/api/v1/availability?date=2025-06-02&days=1")).await).await;
    assert_eq!(json["count"], 17);
}

#[tokio::test]
async fn test_availability_requires_date() {
    let state = test_state();
    let res = call(&state, get("/api/v1/availability")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = call(&state, get("/api/v1/availability?date=2025-13-40")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_seeded_holiday_has_no_slots() {
    let state = test_state();
    let json = body_json(call(&state, get("/api/v1/availability?date=2024-12-25&days=1")).await).await;
    assert_eq!(json["count"], 0);

    let check = body_json(
        call(&state, get("/api/v1/availability/check?date=2024-12-25&time=10:00")).await,
    )
    .await;
    assert_eq!(check["data"]["available"], false);
    assert_eq!(check["data"]["isHoliday"], true);
    assert_eq!(check["data"]["holidayName"], "Christmas Day");
}

#[tokio::test]
async fn test_check_slot_on_working_day_has_no_holiday_name() {
    let state = test_state();
    let json = body_json(
        call(&state, get("/api/v1/availability/check?date=2025-06-02&time=10:00")).await,
    )
    .await;
    assert_eq!(json["data"]["available"], true);
    assert_eq!(json["data"]["holidayName"], Value::Null);
}

#[tokio::test]
async fn test_check_slot_booked() {
    let state = test_state();
    create_booking(&state, "2025-06-02", "10:00").await;

    let json = body_json(
        call(&state, get("/api/v1/availability/check?date=2025-06-02&time=10:00")).await,
    )
    .await;
    assert_eq!(json["data"]["available"], false);
    assert_eq!(json["data"]["isBooked"], true);
    assert_eq!(json["data"]["isWithinBusinessHours"], true);
    assert_eq!(json["data"]["dayOfWeek"], "monday");
}

#[tokio::test]
async fn test_open_sunday_via_business_hours() {
    let state = test_state();
    let res = call(
        &state,
        send_json(
            "PUT",
            "/api/v1/availability/business-hours",
            json!({ "day": "sunday", "open": "11:00", "close": "15:00", "isOpen": true }),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let json = body_json(call(&state, get("/api/v1/availability?date=2025-06-08&days=1")).await).await;
    assert_eq!(json["count"], 8);

    let hours = body_json(call(&state, get("/api/v1/availability/business-hours")).await).await;
    assert_eq!(hours["data"]["sunday"]["open"], "11:00");
}

#[tokio::test]
async fn test_holiday_admin_endpoints() {
    let state = test_state();
    let res = call(
        &state,
        send_json(
            "POST",
            "/api/v1/availability/holidays",
            json!({ "date": "2025-06-02", "name": "Staff Training" }),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let list = body_json(call(&state, get("/api/v1/availability/holidays")).await).await;
    assert_eq!(list["count"], 4);

    let res = call(
        &state,
        send_json("POST", "/api/v1/bookings", booking_body("2025-06-02", "10:00")),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = call(
        &state,
        Request::builder()
            .method("DELETE")
            .uri("/api/v1/availability/holidays/2025-06-02")
            .header("x-api-key", API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    create_booking(&state, "2025-06-02", "10:00").await;
}

// ── Services ──

#[tokio::test]
async fn test_services_catalog() {
    let state = test_state();

    let all = body_json(call(&state, get("/api/v1/services")).await).await;
    assert_eq!(all["count"], 8);

    let injectables = body_json(call(&state, get("/api/v1/services?category=Injectables")).await).await;
    assert_eq!(injectables["count"], 2);

    let categories = body_json(call(&state, get("/api/v1/services/categories/list")).await).await;
    assert_eq!(categories["count"], 5);

    let res = call(&state, get("/api/v1/services/srv_404")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_service_delete_blocked_by_active_booking() {
    let state = test_state();
    let res = call(
        &state,
        send_json(
            "POST",
            "/api/v1/services",
            json!({ "name": "LED Therapy", "category": "Facials", "duration": 30, "price": 120.0 }),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let service = body_json(res).await["data"].clone();
    let service_id = service["id"].as_str().unwrap().to_string();
    assert_eq!(service["depositRequired"], true);

    let mut body = booking_body("2025-06-02", "09:00");
    body["serviceId"] = json!(service_id);
    let res = call(&state, send_json("POST", "/api/v1/bookings", body)).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = call(
        &state,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/services/{service_id}"))
            .header("x-api-key", API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

// ── Stats ──

#[tokio::test]
async fn test_stats_summary_from_seed() {
    let state = test_state();
    let json = body_json(call(&state, get("/api/v1/stats")).await).await;

    assert_eq!(json["data"]["totalBookings"], 6);
    assert_eq!(json["data"]["confirmedBookings"], 4);
    assert_eq!(json["data"]["pendingBookings"], 1);
    assert_eq!(json["data"]["cancelledBookings"], 1);
    // Botox 450 + Hydrafacial 250 + Peel 350 + Microneedling 400
    assert_eq!(json["data"]["totalRevenue"], 1450.0);
    assert_eq!(json["data"]["conversionRate"], "66.67%");
}

#[tokio::test]
async fn test_stats_revenue_grouping() {
    let state = test_state();
    let json = body_json(call(&state, get("/api/v1/stats/revenue?groupBy=month")).await).await;
    assert_eq!(json["data"]["groupBy"], "month");
    assert_eq!(json["data"]["data"][0]["period"], "2024-12");
    assert_eq!(json["data"]["totalBookings"], 4);

    let res = call(&state, get("/api/v1/stats/revenue?groupBy=year")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_dashboard_and_reports() {
    let state = test_state();
    create_booking(&state, "2025-06-02", "10:00").await;

    let dash = body_json(call(&state, get("/api/v1/stats/dashboard")).await).await;
    assert_eq!(dash["data"]["thisMonth"]["bookings"], 1);
    assert_eq!(dash["data"]["recentActivity"][0]["clientName"], "Jane Doe");

    let services = body_json(call(&state, get("/api/v1/stats/services")).await).await;
    assert!(services["data"]["data"].as_array().unwrap().len() >= 6);

    let clients = body_json(call(&state, get("/api/v1/stats/clients")).await).await;
    assert_eq!(clients["data"][0]["clientEmail"], "sarah.j@email.com");
    assert_eq!(clients["data"][0]["totalSpent"], 450.0);
}

// ── Automation webhook ──

#[tokio::test]
async fn test_webhook_bookings_count() {
    let state = test_state();
    let json = body_json(
        call(
            &state,
            send_json("POST", "/api/v1/webhook/n8n", json!({ "action": "getBookingsCount" })),
        )
        .await,
    )
    .await;
    assert_eq!(json["success"], true);
    assert_eq!(json["action"], "getBookingsCount");
    assert_eq!(json["data"]["count"], 4);
}

#[tokio::test]
async fn test_webhook_unknown_action() {
    let state = test_state();
    let res = call(
        &state,
        send_json("POST", "/api/v1/webhook/n8n", json!({ "action": "launchRocket", "data": {} })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Unknown action: launchRocket");
}

#[tokio::test]
async fn test_webhook_quick_booking_and_availability() {
    let state = test_state();
    let json = body_json(
        call(
            &state,
            send_json(
                "POST",
                "/api/v1/webhook/n8n",
                json!({
                    "action": "quickBooking",
                    "data": {
                        "clientName": "John Doe",
                        "clientEmail": "john@email.com",
                        "clientPhone": "+1-555-0123",
                        "serviceId": "srv_001",
                        "bookingDate": "2025-06-03",
                        "bookingTime": "14:00"
                    }
                }),
            ),
        )
        .await,
    )
    .await;
    assert_eq!(json["success"], true);
    let id = json["data"]["booking"]["id"].as_str().unwrap();
    assert_eq!(json["data"]["booking"]["notes"], "Created via n8n webhook");
    assert_eq!(
        json["data"]["depositLink"],
        format!("http://spa.test/api/v1/bookings/{id}/deposit")
    );

    let check = body_json(
        call(
            &state,
            send_json(
                "POST",
                "/api/v1/webhook/n8n",
                json!({ "action": "checkAvailability", "data": { "date": "2025-06-03", "time": "14:00" } }),
            ),
        )
        .await,
    )
    .await;
    assert_eq!(check["data"]["available"], false);
}

#[tokio::test]
async fn test_webhook_actions_listed() {
    let state = test_state();
    let json = body_json(call(&state, get("/api/v1/webhook/actions")).await).await;
    assert_eq!(json["count"], 7);
}

#[tokio::test]
async fn test_webhook_test_echoes_payload() {
    let state = test_state();
    let json = body_json(
        call(
            &state,
            send_json("POST", "/api/v1/webhook/test", json!({ "hello": "world" })),
        )
        .await,
    )
    .await;
    assert_eq!(json["receivedData"]["hello"], "world");
    assert!(json["headers"].get("x-api-key").is_none());
}

// ── Events ──

#[tokio::test]
async fn test_mutations_publish_events() {
    let state = test_state();
    let mut rx = state.events_tx.subscribe();

    let booking = create_booking(&state, "2025-06-02", "10:00").await;
    let id = booking["id"].as_str().unwrap();
    call(
        &state,
        send_json("POST", &format!("/api/v1/bookings/{id}/confirm"), json!({ "depositPaid": true })),
    )
    .await;

    let created = rx.recv().await.unwrap();
    assert_eq!(created.event, BookingEventKind::Created);
    assert_eq!(created.booking.id, id);

    let confirmed = rx.recv().await.unwrap();
    assert_eq!(confirmed.event, BookingEventKind::Confirmed);
    assert!(confirmed.booking.deposit_paid);
}

// ── Malformed input ──

fn raw_post(uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-api-key", API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn assert_validation_error(res: Response) {
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["kind"], "validation");
    assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_malformed_json_body_uses_error_envelope() {
    let state = test_state();
    let res = call(&state, raw_post("/api/v1/bookings", "{not json")).await;
    assert_validation_error(res).await;
}

#[tokio::test]
async fn test_mistyped_json_field_uses_error_envelope() {
    let state = test_state();
    let res = call(&state, raw_post("/api/v1/bookings", r#"{"clientName":5}"#)).await;
    assert_validation_error(res).await;
}

#[tokio::test]
async fn test_non_numeric_days_uses_error_envelope() {
    let state = test_state();
    let res = call(&state, get("/api/v1/availability?date=2025-06-02&days=abc")).await;
    assert_validation_error(res).await;
}

#[tokio::test]
async fn test_malformed_webhook_body_uses_error_envelope() {
    let state = test_state();
    let res = call(&state, raw_post("/api/v1/webhook/n8n", "action=getStats")).await;
    assert_validation_error(res).await;
}

#[tokio::test]
async fn test_malformed_cancel_body_rejected_but_empty_body_allowed() {
    let state = test_state();
    let booking = create_booking(&state, "2025-06-02", "11:00").await;
    let uri = format!("/api/v1/bookings/{}/cancel", booking["id"].as_str().unwrap());

    let res = call(
        &state,
        Request::builder()
            .method("POST")
            .uri(uri.as_str())
            .header("x-api-key", API_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from("{reason"))
            .unwrap(),
    )
    .await;
    assert_validation_error(res).await;

    let res = call(
        &state,
        Request::builder()
            .method("POST")
            .uri(uri.as_str())
            .header("x-api-key", API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["data"]["cancellationReason"], "No reason provided");
}

// ── Concurrency ──

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_creates_for_one_slot_book_it_once() {
    let state = test_state();
    let app = test_app(state.clone());

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                let req = send_json("POST", "/api/v1/bookings", booking_body("2025-06-03", "15:00"));
                app.oneshot(req).await.unwrap().status()
            })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(conflicts, 31);

    let json = body_json(
        call(&state, get("/api/v1/bookings?date=2025-06-03&status=pending")).await,
    )
    .await;
    let at_slot = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|b| b["time"] == "15:00")
        .count();
    assert_eq!(at_slot, 1);
}
