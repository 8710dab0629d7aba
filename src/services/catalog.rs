use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{DepositRule, NewService, Service, ServiceUpdate};

pub fn list_services(
    conn: &Connection,
    category: Option<&str>,
    available: Option<bool>,
) -> Result<Vec<Service>, AppError> {
    Ok(queries::list_services(conn, category, available)?)
}

pub fn get_service(conn: &Connection, id: &str) -> Result<Service, AppError> {
    queries::get_service(conn, id)?.ok_or_else(|| AppError::NotFound(format!("service {id}")))
}

pub fn list_categories(conn: &Connection) -> Result<Vec<String>, AppError> {
    Ok(queries::list_categories(conn)?)
}

fn validate(service: &Service) -> Result<(), AppError> {
    if service.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if service.category.trim().is_empty() {
        return Err(AppError::Validation("category cannot be empty".to_string()));
    }
    if service.duration_minutes <= 0 {
        return Err(AppError::Validation("duration must be a positive number of minutes".to_string()));
    }
    if !service.price.is_finite() || service.price < 0.0 {
        return Err(AppError::Validation("price cannot be negative".to_string()));
    }
    match service.deposit_rule {
        DepositRule::Percentage { value } if value > 100 => Err(AppError::Validation(
            "deposit percentage must be between 0 and 100".to_string(),
        )),
        DepositRule::Fixed { amount } if !amount.is_finite() || amount < 0.0 => Err(
            AppError::Validation("deposit amount cannot be negative".to_string()),
        ),
        _ => Ok(()),
    }
}

/// A fixed amount wins over a percentage when both are given.
fn deposit_rule(percentage: Option<u8>, amount: Option<f64>) -> Option<DepositRule> {
    match (amount, percentage) {
        (Some(amount), _) => Some(DepositRule::Fixed { amount }),
        (None, Some(value)) => Some(DepositRule::Percentage { value }),
        (None, None) => None,
    }
}

pub fn create_service(conn: &Connection, input: NewService) -> Result<Service, AppError> {
    let missing: Vec<&str> = [
        ("name", input.name.is_none()),
        ("category", input.category.is_none()),
        ("duration", input.duration.is_none()),
        ("price", input.price.is_none()),
    ]
    .into_iter()
    .filter_map(|(field, absent)| absent.then_some(field))
    .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let simple = uuid::Uuid::new_v4().simple().to_string();
    let service = Service {
        id: format!("srv_{}", &simple[..8]),
        name: input.name.unwrap_or_default().trim().to_string(),
        category: input.category.unwrap_or_default().trim().to_string(),
        description: input.description.unwrap_or_default(),
        duration_minutes: input.duration.unwrap_or_default(),
        price: input.price.unwrap_or_default(),
        deposit_required: input.deposit_required.unwrap_or(true),
        deposit_rule: deposit_rule(input.deposit_percentage, input.deposit_amount).unwrap_or_default(),
        available: input.available.unwrap_or(true),
    };
    validate(&service)?;

    queries::insert_service(conn, &service)?;
    tracing::info!(service_id = %service.id, name = %service.name, "service created");
    Ok(service)
}

pub fn update_service(conn: &Connection, id: &str, update: ServiceUpdate) -> Result<Service, AppError> {
    let mut service = get_service(conn, id)?;

    if let Some(name) = update.name {
        service.name = name.trim().to_string();
    }
    if let Some(category) = update.category {
        service.category = category.trim().to_string();
    }
    if let Some(description) = update.description {
        service.description = description;
    }
    if let Some(duration) = update.duration {
        service.duration_minutes = duration;
    }
    if let Some(price) = update.price {
        service.price = price;
    }
    if let Some(required) = update.deposit_required {
        service.deposit_required = required;
    }
    if let Some(rule) = deposit_rule(update.deposit_percentage, update.deposit_amount) {
        service.deposit_rule = rule;
    }
    if let Some(available) = update.available {
        service.available = available;
    }
    validate(&service)?;

    queries::update_service(conn, &service)?;
    tracing::info!(service_id = %id, "service updated");
    Ok(service)
}

/// Refused while any non-cancelled booking references the service.
pub fn delete_service(conn: &Connection, id: &str) -> Result<Service, AppError> {
    let service = get_service(conn, id)?;

    let active = queries::count_active_bookings_for_service(conn, id)?;
    if active > 0 {
        tracing::warn!(service_id = %id, active, "refusing to delete service with active bookings");
        return Err(AppError::Conflict(format!(
            "Cannot delete service with {active} active booking(s)"
        )));
    }

    queries::delete_service(conn, id)?;
    tracing::info!(service_id = %id, "service deleted");
    Ok(service)
}
