use chrono::NaiveDateTime;
use rusqlite::Connection;

use crate::clock::Clock;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::calendar::{parse_date, parse_time};
use crate::models::{Booking, BookingFilter, BookingStatus, BookingUpdate, NewBooking};
use crate::services::availability::AvailabilityEngine;
use crate::services::catalog;

pub const DEFAULT_CANCELLATION_REASON: &str = "No reason provided";

/// Operations that may change a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Confirm,
    Cancel,
    PayDeposit,
}

impl Action {
    fn verb(&self) -> &'static str {
        match self {
            Action::Edit => "updated",
            Action::Confirm => "confirmed",
            Action::Cancel => "cancelled",
            Action::PayDeposit => "paid",
        }
    }
}

/// Status after applying `action`. `Cancelled` has no outgoing transitions.
pub fn transition(from: BookingStatus, action: Action) -> Result<BookingStatus, AppError> {
    match (from, action) {
        (BookingStatus::Cancelled, Action::Cancel) => Err(AppError::InvalidState(
            "booking is already cancelled".to_string(),
        )),
        (BookingStatus::Cancelled, action) => Err(AppError::InvalidState(format!(
            "cancelled booking cannot be {}",
            action.verb()
        ))),
        (_, Action::Confirm) => Ok(BookingStatus::Confirmed),
        (_, Action::Cancel) => Ok(BookingStatus::Cancelled),
        (BookingStatus::Pending, Action::PayDeposit) => Ok(BookingStatus::Confirmed),
        (status, Action::PayDeposit | Action::Edit) => Ok(status),
    }
}

/// Whether an insert/update failed on the active-slot unique index.
fn is_slot_conflict(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _)) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn store_error(err: anyhow::Error) -> AppError {
    if is_slot_conflict(&err) {
        AppError::Conflict("Time slot already booked".to_string())
    } else {
        AppError::from(err)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Booking state machine over the store. Callers hold the connection lock for
/// the duration, so the slot check and the write it guards are atomic.
pub struct BookingLifecycle<'a> {
    conn: &'a Connection,
    clock: &'a dyn Clock,
    slot_minutes: u32,
}

impl<'a> BookingLifecycle<'a> {
    pub fn new(conn: &'a Connection, clock: &'a dyn Clock, slot_minutes: u32) -> Self {
        Self {
            conn,
            clock,
            slot_minutes,
        }
    }

    fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn get(&self, id: &str) -> Result<Booking, AppError> {
        queries::get_booking(self.conn, id)?.ok_or_else(|| AppError::NotFound(format!("booking {id}")))
    }

    pub fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        Ok(queries::list_bookings(self.conn, filter)?)
    }

    pub fn create(&self, input: NewBooking) -> Result<Booking, AppError> {
        let client_name = non_empty(input.client_name);
        let client_email = non_empty(input.client_email);
        let client_phone = non_empty(input.client_phone);
        let service_id = non_empty(input.service_id);
        let date = non_empty(input.date);
        let time = non_empty(input.time);

        let missing: Vec<&str> = [
            ("clientName", client_name.is_none()),
            ("clientEmail", client_email.is_none()),
            ("clientPhone", client_phone.is_none()),
            ("serviceId", service_id.is_none()),
            ("date", date.is_none()),
            ("time", time.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, absent)| absent.then_some(field))
        .collect();

        let (
            Some(client_name),
            Some(client_email),
            Some(client_phone),
            Some(service_id),
            Some(date),
            Some(time),
        ) = (client_name, client_email, client_phone, service_id, date, time)
        else {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let date = parse_date(&date)?;
        let time = parse_time(&time)?;

        let service = catalog::get_service(self.conn, &service_id)?;
        if !service.available {
            return Err(AppError::Validation(format!(
                "Service {} is not currently available for booking",
                service.name
            )));
        }

        AvailabilityEngine::load(self.conn, self.slot_minutes)?.ensure_bookable(date, time, None)?;

        let now = self.now();
        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            client_name,
            client_email,
            client_phone,
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            date,
            time,
            duration_minutes: service.duration_minutes,
            price: service.price,
            deposit_amount: service.deposit_amount(),
            deposit_paid: input.deposit_paid,
            deposit_paid_at: input.deposit_paid.then_some(now),
            status: if input.deposit_paid {
                BookingStatus::Confirmed
            } else {
                BookingStatus::Pending
            },
            notes: input.notes.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            cancellation_reason: None,
        };

        queries::insert_booking(self.conn, &booking).map_err(store_error)?;

        tracing::info!(
            booking_id = %booking.id,
            service = %booking.service_name,
            date = %booking.date,
            time = %booking.time.format("%H:%M"),
            status = booking.status.as_str(),
            "booking created"
        );
        Ok(booking)
    }

    pub fn update(&self, id: &str, update: BookingUpdate) -> Result<Booking, AppError> {
        let mut booking = self.get(id)?;
        transition(booking.status, Action::Edit)?;

        for (field, value, target) in [
            ("clientName", update.client_name.as_deref(), &mut booking.client_name),
            ("clientEmail", update.client_email.as_deref(), &mut booking.client_email),
            ("clientPhone", update.client_phone.as_deref(), &mut booking.client_phone),
        ] {
            if let Some(value) = value {
                let value = value.trim();
                if value.is_empty() {
                    return Err(AppError::Validation(format!("{field} cannot be empty")));
                }
                *target = value.to_string();
            }
        }
        if let Some(notes) = update.notes.as_deref() {
            booking.notes = notes.to_string();
        }

        if update.reschedules() {
            let date = match update.date.as_deref() {
                Some(d) => parse_date(d)?,
                None => booking.date,
            };
            let time = match update.time.as_deref() {
                Some(t) => parse_time(t)?,
                None => booking.time,
            };
            if (date, time) != (booking.date, booking.time) {
                AvailabilityEngine::load(self.conn, self.slot_minutes)?.ensure_bookable(date, time, Some(id))?;
                tracing::info!(
                    booking_id = %id,
                    from = %booking.date.and_time(booking.time),
                    to = %date.and_time(time),
                    "booking rescheduled"
                );
                booking.date = date;
                booking.time = time;
            }
        }

        booking.updated_at = self.now();
        self.save(&booking)?;
        Ok(booking)
    }

    /// Confirms, optionally recording the deposit at the same time.
    pub fn confirm(&self, id: &str, deposit_paid: bool) -> Result<Booking, AppError> {
        let mut booking = self.get(id)?;
        booking.status = transition(booking.status, Action::Confirm)?;

        let now = self.now();
        if deposit_paid && !booking.deposit_paid {
            booking.deposit_paid = true;
            booking.deposit_paid_at = Some(now);
        }
        booking.updated_at = now;
        self.save(&booking)?;

        tracing::info!(booking_id = %id, deposit_paid = booking.deposit_paid, "booking confirmed");
        Ok(booking)
    }

    pub fn cancel(&self, id: &str, reason: Option<String>) -> Result<Booking, AppError> {
        let mut booking = self.get(id)?;
        booking.status = transition(booking.status, Action::Cancel)?;

        let now = self.now();
        let reason = non_empty(reason).unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string());
        booking.cancelled_at = Some(now);
        booking.cancellation_reason = Some(reason);
        booking.updated_at = now;
        self.save(&booking)?;

        tracing::info!(
            booking_id = %id,
            reason = booking.cancellation_reason.as_deref().unwrap_or_default(),
            "booking cancelled"
        );
        Ok(booking)
    }

    /// Records the deposit. A pending booking becomes confirmed; the paid-at
    /// timestamp is kept from the first payment.
    pub fn pay_deposit(&self, id: &str) -> Result<Booking, AppError> {
        let mut booking = self.get(id)?;
        booking.status = transition(booking.status, Action::PayDeposit)?;

        let now = self.now();
        if !booking.deposit_paid {
            booking.deposit_paid = true;
            booking.deposit_paid_at = Some(now);
        }
        booking.updated_at = now;
        self.save(&booking)?;

        tracing::info!(
            booking_id = %id,
            amount = booking.deposit_amount,
            status = booking.status.as_str(),
            "deposit recorded"
        );
        Ok(booking)
    }

    /// Hard delete in any state. Returns the removed booking.
    pub fn delete(&self, id: &str) -> Result<Booking, AppError> {
        let booking = self.get(id)?;
        if !queries::delete_booking(self.conn, id)? {
            return Err(AppError::NotFound(format!("booking {id}")));
        }
        tracing::info!(booking_id = %id, "booking deleted");
        Ok(booking)
    }

    fn save(&self, booking: &Booking) -> Result<(), AppError> {
        if !queries::update_booking(self.conn, booking).map_err(store_error)? {
            return Err(AppError::NotFound(format!("booking {}", booking.id)));
        }
        Ok(())
    }
}
