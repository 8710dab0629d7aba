use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;

use super::extract::{optional_json, ApiJson, ApiQuery};
use super::{ok, ok_list, ok_with_message};
use crate::errors::AppError;
use crate::models::calendar::parse_date;
use crate::models::{Booking, BookingFilter, BookingStatus, BookingUpdate, NewBooking};
use crate::services::events::{self, BookingEventKind};
use crate::services::lifecycle::BookingLifecycle;
use crate::state::AppState;

pub(crate) fn lifecycle<'a>(state: &'a AppState, conn: &'a Connection) -> BookingLifecycle<'a> {
    BookingLifecycle::new(conn, state.clock.as_ref(), state.config.slot_minutes)
}

pub(crate) fn publish(state: &AppState, kind: BookingEventKind, booking: &Booking) {
    events::publish(&state.events_tx, kind, booking, state.clock.now());
}

// GET /api/v1/bookings
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub date: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
}

impl BookingsQuery {
    fn into_filter(self) -> Result<BookingFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                BookingStatus::parse(s)
                    .ok_or_else(|| AppError::Validation(format!("invalid status: {s}")))
            })
            .transpose()?;

        Ok(BookingFilter {
            status,
            date: self.date.as_deref().map(parse_date).transpose()?,
            from: self.from.as_deref().map(parse_date).transpose()?,
            to: self.to.as_deref().map(parse_date).transpose()?,
            client_email: self.client_email.filter(|e| !e.trim().is_empty()),
            client_phone: self.client_phone.filter(|p| !p.trim().is_empty()),
        })
    }
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<BookingsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let filter = query.into_filter()?;
    let bookings = {
        let db = state.db()?;
        lifecycle(&state, &db).list(&filter)?
    };
    Ok(ok_list(&bookings))
}

// GET /api/v1/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = {
        let db = state.db()?;
        lifecycle(&state, &db).get(&id)?
    };
    Ok(ok(booking))
}

// POST /api/v1/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<NewBooking>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let booking = {
        let db = state.db()?;
        lifecycle(&state, &db).create(input)?
    };
    publish(&state, BookingEventKind::Created, &booking);
    Ok((
        StatusCode::CREATED,
        ok_with_message("Booking created successfully", booking),
    ))
}

// PUT/PATCH /api/v1/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<BookingUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = {
        let db = state.db()?;
        lifecycle(&state, &db).update(&id, update)?
    };
    publish(&state, BookingEventKind::Updated, &booking);
    Ok(ok_with_message("Booking updated successfully", booking))
}

// POST /api/v1/bookings/:id/confirm
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    #[serde(default)]
    pub deposit_paid: bool,
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let req: ConfirmRequest = optional_json(&body)?;
    let booking = {
        let db = state.db()?;
        lifecycle(&state, &db).confirm(&id, req.deposit_paid)?
    };
    publish(&state, BookingEventKind::Confirmed, &booking);
    Ok(ok_with_message("Booking confirmed successfully", booking))
}

// POST /api/v1/bookings/:id/cancel
#[derive(Deserialize, Default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let req: CancelRequest = optional_json(&body)?;
    let booking = {
        let db = state.db()?;
        lifecycle(&state, &db).cancel(&id, req.reason)?
    };
    publish(&state, BookingEventKind::Cancelled, &booking);
    Ok(ok_with_message("Booking cancelled successfully", booking))
}

// POST /api/v1/bookings/:id/deposit
pub async fn pay_deposit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = {
        let db = state.db()?;
        lifecycle(&state, &db).pay_deposit(&id)?
    };
    publish(&state, BookingEventKind::DepositPaid, &booking);
    Ok(ok_with_message("Deposit payment recorded successfully", booking))
}

// DELETE /api/v1/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = {
        let db = state.db()?;
        lifecycle(&state, &db).delete(&id)?
    };
    publish(&state, BookingEventKind::Deleted, &booking);
    Ok(ok_with_message("Booking deleted successfully", booking))
}
