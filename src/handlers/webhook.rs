use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::bookings::{lifecycle, publish};
use super::extract::ApiJson;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::calendar::{parse_date, parse_time};
use crate::models::{Booking, BookingFilter, BookingStatus, NewBooking};
use crate::services::availability::AvailabilityEngine;
use crate::services::events::BookingEventKind;
use crate::services::{catalog, stats};
use crate::state::AppState;

const UPCOMING_LIMIT: usize = 5;
const QUICK_BOOKING_NOTES: &str = "Created via n8n webhook";

#[derive(Deserialize)]
pub struct N8nRequest {
    pub action: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Deserialize, Default)]
struct SlotData {
    date: Option<String>,
    time: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct QuickBookingData {
    client_name: Option<String>,
    client_email: Option<String>,
    client_phone: Option<String>,
    service_id: Option<String>,
    booking_date: Option<String>,
    booking_time: Option<String>,
}

/// Compact booking shape returned to automation flows.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookingBrief {
    id: String,
    client_name: String,
    service: String,
    date: chrono::NaiveDate,
    #[serde(with = "crate::models::hhmm")]
    time: chrono::NaiveTime,
    price: f64,
}

impl From<&Booking> for BookingBrief {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id.clone(),
            client_name: b.client_name.clone(),
            service: b.service_name.clone(),
            date: b.date,
            time: b.time,
            price: b.price,
        }
    }
}

fn parse_data<T: DeserializeOwned + Default>(data: serde_json::Value) -> Result<T, AppError> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(|e| AppError::Validation(format!("invalid action data: {e}")))
}

fn confirmed_bookings(state: &AppState, filter: BookingFilter) -> Result<Vec<Booking>, AppError> {
    let db = state.db()?;
    Ok(queries::list_bookings(
        &db,
        &BookingFilter {
            status: Some(BookingStatus::Confirmed),
            ..filter
        },
    )?)
}

fn check_availability(state: &AppState, data: SlotData) -> Result<serde_json::Value, AppError> {
    let (Some(date), Some(time)) = (data.date, data.time) else {
        return Err(AppError::Validation("date and time are required".to_string()));
    };
    let date = parse_date(&date)?;
    let time = parse_time(&time)?;

    let check = {
        let db = state.db()?;
        AvailabilityEngine::load(&db, state.config.slot_minutes)?.check_slot(date, time, None)?
    };
    let message = match check.rejection() {
        None => "Slot is available".to_string(),
        Some(reason) => format!("Slot is not available: {reason}"),
    };

    Ok(serde_json::json!({
        "available": check.is_free(),
        "date": date,
        "time": time.format("%H:%M").to_string(),
        "message": message,
    }))
}

fn quick_booking(state: &AppState, data: QuickBookingData) -> Result<serde_json::Value, AppError> {
    let client_name = data.client_name.clone().unwrap_or_default();
    let input = NewBooking {
        client_name: data.client_name,
        client_email: data.client_email,
        client_phone: data.client_phone,
        service_id: data.service_id,
        date: data.booking_date,
        time: data.booking_time,
        notes: Some(QUICK_BOOKING_NOTES.to_string()),
        deposit_paid: false,
    };

    let booking = {
        let db = state.db()?;
        lifecycle(state, &db).create(input)?
    };
    publish(state, BookingEventKind::Created, &booking);

    Ok(serde_json::json!({
        "message": format!("Booking created successfully for {client_name}"),
        "depositLink": format!(
            "{}/api/v1/bookings/{}/deposit",
            state.config.public_base_url.trim_end_matches('/'),
            booking.id
        ),
        "booking": booking,
    }))
}

fn dispatch(state: &AppState, action: &str, data: serde_json::Value) -> Result<serde_json::Value, AppError> {
    match action {
        "checkAvailability" => check_availability(state, parse_data(data)?),
        "getBookingsCount" => {
            let count = confirmed_bookings(state, BookingFilter::default())?.len();
            Ok(serde_json::json!({
                "count": count,
                "message": format!("You have {count} confirmed bookings"),
            }))
        }
        "getTodayBookings" => {
            let today = confirmed_bookings(
                state,
                BookingFilter {
                    date: Some(state.clock.today()),
                    ..Default::default()
                },
            )?;
            let briefs: Vec<BookingBrief> = today.iter().map(BookingBrief::from).collect();
            Ok(serde_json::json!({
                "count": briefs.len(),
                "bookings": briefs,
                "message": format!("You have {} bookings today", briefs.len()),
            }))
        }
        "getUpcomingBookings" => {
            let today = state.clock.today();
            let upcoming: Vec<BookingBrief> = confirmed_bookings(state, BookingFilter::default())?
                .iter()
                .filter(|b| b.date > today)
                .take(UPCOMING_LIMIT)
                .map(BookingBrief::from)
                .collect();
            Ok(serde_json::json!({
                "count": upcoming.len(),
                "bookings": upcoming,
                "message": format!("You have {} upcoming bookings", upcoming.len()),
            }))
        }
        "quickBooking" => quick_booking(state, parse_data(data)?),
        "getServices" => {
            let services = {
                let db = state.db()?;
                catalog::list_services(&db, None, Some(true))?
            };
            Ok(serde_json::json!({
                "message": format!("We have {} services available", services.len()),
                "services": services,
            }))
        }
        "getStats" => {
            let bookings = {
                let db = state.db()?;
                queries::all_bookings(&db)?
            };
            Ok(serde_json::json!({
                "stats": stats::summary(&bookings, state.clock.today()),
                "message": "Here are your current statistics",
            }))
        }
        other => Err(AppError::Validation(format!("Unknown action: {other}"))),
    }
}

// POST /api/v1/webhook/n8n
pub async fn n8n(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<N8nRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let action = req.action.unwrap_or_default();
    tracing::info!(action = %action, "automation webhook received");

    match dispatch(&state, &action, req.data) {
        Ok(data) => Ok(Json(serde_json::json!({
            "success": true,
            "action": action,
            "data": data,
            "timestamp": state.clock.now(),
        }))),
        Err(e @ (AppError::Database(_) | AppError::Internal(_))) => Err(e),
        Err(e) => {
            tracing::warn!(action = %action, error = %e, "automation action failed");
            Ok(Json(serde_json::json!({
                "success": false,
                "action": action,
                "error": e.to_string(),
                "kind": e.kind(),
                "timestamp": state.clock.now(),
            })))
        }
    }
}

// GET /api/v1/webhook/actions
pub async fn actions() -> Json<serde_json::Value> {
    let actions = serde_json::json!([
        {
            "action": "checkAvailability",
            "description": "Check if a specific time slot is available",
            "requiredFields": ["date", "time"],
            "example": { "action": "checkAvailability", "data": { "date": "2024-12-20", "time": "14:00" } }
        },
        {
            "action": "getBookingsCount",
            "description": "Get the total number of confirmed bookings",
            "requiredFields": [],
            "example": { "action": "getBookingsCount", "data": {} }
        },
        {
            "action": "getTodayBookings",
            "description": "Get all confirmed bookings for today",
            "requiredFields": [],
            "example": { "action": "getTodayBookings", "data": {} }
        },
        {
            "action": "getUpcomingBookings",
            "description": "Get upcoming confirmed bookings",
            "requiredFields": [],
            "example": { "action": "getUpcomingBookings", "data": {} }
        },
        {
            "action": "quickBooking",
            "description": "Create a new booking quickly",
            "requiredFields": ["clientName", "clientEmail", "clientPhone", "serviceId", "bookingDate", "bookingTime"],
            "example": {
                "action": "quickBooking",
                "data": {
                    "clientName": "John Doe",
                    "clientEmail": "john@email.com",
                    "clientPhone": "+1-555-0123",
                    "serviceId": "srv_001",
                    "bookingDate": "2024-12-26",
                    "bookingTime": "14:00"
                }
            }
        },
        {
            "action": "getServices",
            "description": "Get all available services",
            "requiredFields": [],
            "example": { "action": "getServices", "data": {} }
        },
        {
            "action": "getStats",
            "description": "Get booking statistics",
            "requiredFields": [],
            "example": { "action": "getStats", "data": {} }
        }
    ]);

    Json(serde_json::json!({
        "success": true,
        "message": "Available webhook actions for n8n integration",
        "count": actions.as_array().map_or(0, Vec::len),
        "actions": actions,
    }))
}

// POST /api/v1/webhook/booking-created
pub async fn booking_created(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> Json<serde_json::Value> {
    tracing::info!("booking-created webhook received");
    let now = state.clock.now();
    Json(serde_json::json!({
        "success": true,
        "message": "Webhook processed successfully",
        "data": {
            "event": BookingEventKind::Created,
            "timestamp": now,
            "data": payload,
            "processed": true,
        },
    }))
}

// POST /api/v1/webhook/test
pub async fn test(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<serde_json::Value>,
) -> Json<serde_json::Value> {
    tracing::info!("test webhook received");
    let headers: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .filter(|(name, _)| name.as_str() != "x-api-key")
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), serde_json::Value::from(v)))
        })
        .collect();

    Json(serde_json::json!({
        "success": true,
        "message": "Test webhook received successfully",
        "receivedData": payload,
        "headers": headers,
        "timestamp": state.clock.now(),
    }))
}
