use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::extract::ApiQuery;
use super::{ok, ok_list};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::calendar::parse_date;
use crate::models::stats::GroupBy;
use crate::models::Booking;
use crate::services::stats;
use crate::state::AppState;

fn all_bookings(state: &AppState) -> Result<Vec<Booking>, AppError> {
    let db = state.db()?;
    Ok(queries::all_bookings(&db)?)
}

// GET /api/v1/stats
pub async fn summary(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = all_bookings(&state)?;
    Ok(ok(stats::summary(&bookings, state.clock.today())))
}

// GET /api/v1/stats/revenue?from&to&groupBy
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub group_by: Option<String>,
}

pub async fn revenue(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<RevenueQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let group_by = match query.group_by.as_deref() {
        None => GroupBy::default(),
        Some(g) => GroupBy::parse(g).ok_or_else(|| {
            AppError::Validation(format!("invalid groupBy (expected day, week or month): {g}"))
        })?,
    };
    let from = query.from.as_deref().map(parse_date).transpose()?;
    let to = query.to.as_deref().map(parse_date).transpose()?;

    let bookings = all_bookings(&state)?;
    Ok(ok(stats::revenue(&bookings, from, to, group_by)))
}

// GET /api/v1/stats/services
pub async fn services(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = all_bookings(&state)?;
    Ok(ok(stats::service_report(&bookings)))
}

// GET /api/v1/stats/clients
pub async fn clients(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = all_bookings(&state)?;
    Ok(ok_list(&stats::client_report(&bookings)))
}

// GET /api/v1/stats/dashboard
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    let bookings = all_bookings(&state)?;
    Ok(ok(stats::dashboard(&bookings, state.clock.now())))
}
