pub mod availability;
pub mod bookings;
pub mod events;
pub mod extract;
pub mod health;
pub mod services;
pub mod stats;
pub mod webhook;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use extract::ApiQuery;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route(
            "/bookings",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route(
            "/bookings/:id",
            get(bookings::get_booking)
                .put(bookings::update_booking)
                .patch(bookings::update_booking)
                .delete(bookings::delete_booking),
        )
        .route("/bookings/:id/confirm", post(bookings::confirm_booking))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/bookings/:id/deposit", post(bookings::pay_deposit))
        .route(
            "/services",
            get(services::list_services).post(services::create_service),
        )
        .route("/services/categories/list", get(services::list_categories))
        .route(
            "/services/:id",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route("/availability", get(availability::free_slots))
        .route("/availability/check", get(availability::check_slot))
        .route(
            "/availability/business-hours",
            get(availability::business_hours).put(availability::update_business_hours),
        )
        .route(
            "/availability/holidays",
            get(availability::list_holidays).post(availability::add_holiday),
        )
        .route(
            "/availability/holidays/:date",
            delete(availability::remove_holiday),
        )
        .route("/stats", get(stats::summary))
        .route("/stats/revenue", get(stats::revenue))
        .route("/stats/services", get(stats::services))
        .route("/stats/clients", get(stats::clients))
        .route("/stats/dashboard", get(stats::dashboard))
        .route("/webhook/n8n", post(webhook::n8n))
        .route("/webhook/actions", get(webhook::actions))
        .route("/webhook/booking-created", post(webhook::booking_created))
        .route("/webhook/test", post(webhook::test))
        .route("/events", get(events::events_stream))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", api)
        .with_state(state)
}

#[derive(Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: Option<String>,
}

/// A wrong key is rejected; a missing key is let through with a warning.
pub fn check_api_key(provided: Option<&str>, expected: &str) -> Result<(), AppError> {
    match provided {
        None => Ok(()),
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(AppError::Unauthorized),
    }
}

async fn require_api_key(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ApiKeyQuery>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .or(query.api_key.as_deref());

    if provided.is_none() {
        tracing::warn!(method = %request.method(), path = %request.uri().path(), "request without API key");
    }
    if let Err(e) = check_api_key(provided, &state.config.api_key) {
        tracing::warn!(method = %request.method(), path = %request.uri().path(), "invalid API key");
        return Err(e);
    }

    Ok(next.run(request).await)
}

/// `{ "success": true, "data": ... }`
pub fn ok<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "data": data }))
}

/// `{ "success": true, "message": ..., "data": ... }`
pub fn ok_with_message<T: Serialize>(message: &str, data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "message": message, "data": data }))
}

/// `{ "success": true, "count": n, "data": [...] }`
pub fn ok_list<T: Serialize>(items: &[T]) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "success": true, "count": items.len(), "data": items }))
}
