use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::extract::{ApiJson, ApiQuery};
use super::{ok, ok_list, ok_with_message};
use crate::errors::AppError;
use crate::models::{NewService, ServiceUpdate};
use crate::services::catalog;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ServicesQuery {
    pub category: Option<String>,
    pub available: Option<bool>,
}

// GET /api/v1/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ServicesQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let services = {
        let db = state.db()?;
        catalog::list_services(&db, query.category.as_deref(), query.available)?
    };
    Ok(ok_list(&services))
}

// GET /api/v1/services/categories/list
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let categories = {
        let db = state.db()?;
        catalog::list_categories(&db)?
    };
    Ok(ok_list(&categories))
}

// GET /api/v1/services/:id
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = {
        let db = state.db()?;
        catalog::get_service(&db, &id)?
    };
    Ok(ok(service))
}

// POST /api/v1/services
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    ApiJson(input): ApiJson<NewService>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let service = {
        let db = state.db()?;
        catalog::create_service(&db, input)?
    };
    Ok((
        StatusCode::CREATED,
        ok_with_message("Service created successfully", service),
    ))
}

// PUT /api/v1/services/:id
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ServiceUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = {
        let db = state.db()?;
        catalog::update_service(&db, &id, update)?
    };
    Ok(ok_with_message("Service updated successfully", service))
}

// DELETE /api/v1/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let service = {
        let db = state.db()?;
        catalog::delete_service(&db, &id)?
    };
    Ok(ok_with_message("Service deleted successfully", service))
}
