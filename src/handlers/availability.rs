use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Datelike;
use serde::Deserialize;

use super::extract::{ApiJson, ApiQuery};
use super::{ok, ok_list, ok_with_message};
use crate::errors::AppError;
use crate::models::calendar::{parse_date, parse_time, weekday_name};
use crate::models::{BusinessCalendar, HoursUpdate, NewHoliday};
use crate::services::availability::{self, AvailabilityEngine, Slot};
use crate::state::AppState;

const DEFAULT_DAYS: u32 = 7;
const MAX_DAYS: u32 = 90;

fn hours_json(calendar: &BusinessCalendar) -> serde_json::Value {
    let days: serde_json::Map<String, serde_json::Value> = calendar
        .weekly_hours()
        .map(|(wd, hours)| {
            (
                weekday_name(wd).to_string(),
                serde_json::to_value(hours).unwrap_or_default(),
            )
        })
        .collect();
    serde_json::Value::Object(days)
}

// GET /api/v1/availability?date=YYYY-MM-DD&days=N
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: Option<String>,
    pub days: Option<u32>,
}

pub async fn free_slots(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<SlotsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = query
        .date
        .as_deref()
        .ok_or_else(|| AppError::Validation("Date parameter is required".to_string()))?;
    let start = parse_date(date)?;
    let days = query.days.unwrap_or(DEFAULT_DAYS).min(MAX_DAYS);

    let (slots, calendar) = {
        let db = state.db()?;
        let engine = AvailabilityEngine::load(&db, state.config.slot_minutes)?;
        let slots: Vec<Slot> = engine.free_slots(start, days)?.collect();
        (slots, engine.calendar().clone())
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "count": slots.len(),
        "data": slots,
        "businessHours": hours_json(&calendar),
        "holidays": calendar.holidays(),
    })))
}

// GET /api/v1/availability/check?date=YYYY-MM-DD&time=HH:MM
#[derive(Deserialize)]
pub struct CheckQuery {
    pub date: Option<String>,
    pub time: Option<String>,
}

pub async fn check_slot(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CheckQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (Some(date), Some(time)) = (query.date.as_deref(), query.time.as_deref()) else {
        return Err(AppError::Validation(
            "Date and time parameters are required".to_string(),
        ));
    };
    let date = parse_date(date)?;
    let time = parse_time(time)?;

    let (check, holiday_name) = {
        let db = state.db()?;
        let engine = AvailabilityEngine::load(&db, state.config.slot_minutes)?;
        let check = engine.check_slot(date, time, None)?;
        (check, engine.calendar().holiday(date).map(str::to_string))
    };

    Ok(ok(serde_json::json!({
        "date": date,
        "time": time.format("%H:%M").to_string(),
        "available": check.is_free(),
        "isBooked": check.is_booked,
        "isWithinBusinessHours": check.is_within_business_hours,
        "isOnSlotBoundary": check.is_on_slot_boundary,
        "isHoliday": check.is_holiday,
        "holidayName": holiday_name,
        "dayOfWeek": weekday_name(date.weekday()),
        "reason": check.rejection(),
    })))
}

// GET /api/v1/availability/business-hours
pub async fn business_hours(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let calendar = {
        let db = state.db()?;
        AvailabilityEngine::load(&db, state.config.slot_minutes)?.calendar().clone()
    };
    Ok(Json(serde_json::json!({
        "success": true,
        "data": hours_json(&calendar),
        "summary": calendar.to_human_readable(),
    })))
}

// PUT /api/v1/availability/business-hours
pub async fn update_business_hours(
    State(state): State<Arc<AppState>>,
    ApiJson(update): ApiJson<HoursUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let (weekday, hours) = {
        let db = state.db()?;
        availability::update_business_hours(&db, update)?
    };
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Business hours updated successfully",
        "day": weekday_name(weekday),
        "data": hours,
    })))
}

// GET /api/v1/availability/holidays
pub async fn list_holidays(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let holidays = {
        let db = state.db()?;
        AvailabilityEngine::load(&db, state.config.slot_minutes)?
            .calendar()
            .holidays()
    };
    Ok(ok_list(&holidays))
}

// POST /api/v1/availability/holidays
pub async fn add_holiday(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<NewHoliday>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let holiday = {
        let db = state.db()?;
        availability::add_holiday(&db, input)?
    };
    Ok((
        StatusCode::CREATED,
        ok_with_message("Holiday added successfully", holiday),
    ))
}

// DELETE /api/v1/availability/holidays/:date
pub async fn remove_holiday(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = {
        let db = state.db()?;
        availability::remove_holiday(&db, &date)?
    };
    Ok(ok_with_message(
        "Holiday removed successfully",
        serde_json::json!({ "date": date }),
    ))
}
