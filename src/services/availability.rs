use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::calendar::{capitalize, parse_date, parse_time, parse_weekday, weekday_name};
use crate::models::{BusinessCalendar, DayHours, Holiday, HoursUpdate, NewHoliday, OpeningHours};

/// A bookable `(date, time)` pair.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub date: NaiveDate,
    #[serde(with = "crate::models::hhmm")]
    pub time: NaiveTime,
    pub datetime: NaiveDateTime,
}

impl Slot {
    fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time,
            datetime: date.and_time(time),
        }
    }
}

/// Everything that decides whether one slot can be booked.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotCheck {
    pub is_open_day: bool,
    pub is_holiday: bool,
    pub is_within_business_hours: bool,
    pub is_on_slot_boundary: bool,
    pub is_booked: bool,
}

impl SlotCheck {
    pub fn is_free(&self) -> bool {
        self.is_open_day && self.is_within_business_hours && self.is_on_slot_boundary && !self.is_booked
    }

    /// Human-readable reason the slot cannot be booked, if any.
    pub fn rejection(&self) -> Option<&'static str> {
        if self.is_holiday {
            Some("the business is closed for a holiday on that date")
        } else if !self.is_open_day {
            Some("the business is closed on that day")
        } else if !self.is_within_business_hours {
            Some("that time is outside business hours")
        } else if !self.is_on_slot_boundary {
            Some("that time does not start on a slot boundary")
        } else if self.is_booked {
            Some("time slot already booked")
        } else {
            None
        }
    }
}

/// The single slot predicate. Both slot listing and single-slot checks go through here.
pub fn evaluate_slot(
    calendar: &BusinessCalendar,
    date: NaiveDate,
    time: NaiveTime,
    slot_minutes: u32,
    is_booked: bool,
) -> SlotCheck {
    let hours = calendar.hours_for(date);
    let is_on_slot_boundary = match hours {
        OpeningHours::Open { open, .. } => {
            let offset = (time - open).num_seconds();
            offset >= 0 && offset % (i64::from(slot_minutes) * 60) == 0
        }
        OpeningHours::Closed => false,
    };

    SlotCheck {
        is_open_day: calendar.is_open(date),
        is_holiday: calendar.is_holiday(date),
        is_within_business_hours: hours.contains(time),
        is_on_slot_boundary,
        is_booked,
    }
}

/// Slot start times from open (inclusive) to close (exclusive).
fn candidate_times(hours: OpeningHours, slot_minutes: u32) -> impl Iterator<Item = NaiveTime> {
    let (open, close) = match hours {
        OpeningHours::Open { open, close } => (
            open.num_seconds_from_midnight() / 60,
            close.num_seconds_from_midnight() / 60,
        ),
        OpeningHours::Closed => (0, 0),
    };
    (open..close)
        .step_by(slot_minutes as usize)
        .filter_map(|m| NaiveTime::from_num_seconds_from_midnight_opt(m * 60, 0))
}

pub struct AvailabilityEngine<'a> {
    conn: &'a Connection,
    calendar: BusinessCalendar,
    slot_minutes: u32,
}

impl<'a> AvailabilityEngine<'a> {
    pub fn new(conn: &'a Connection, calendar: BusinessCalendar, slot_minutes: u32) -> Result<Self, AppError> {
        if slot_minutes == 0 {
            return Err(AppError::Validation("slot granularity must be positive".to_string()));
        }
        Ok(Self {
            conn,
            calendar,
            slot_minutes,
        })
    }

    /// Reads the current business calendar from the store.
    pub fn load(conn: &'a Connection, slot_minutes: u32) -> Result<Self, AppError> {
        let calendar = queries::load_calendar(conn)?;
        Self::new(conn, calendar, slot_minutes)
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    /// Free slots for `[start, start + num_days)` in chronological order.
    ///
    /// Bookings are read once up front; the returned iterator generates slots
    /// lazily against that snapshot.
    pub fn free_slots(
        &self,
        start: NaiveDate,
        num_days: u32,
    ) -> Result<impl Iterator<Item = Slot> + '_, AppError> {
        let end = start
            .checked_add_days(Days::new(u64::from(num_days)))
            .ok_or_else(|| AppError::Validation(format!("date range out of bounds: {start} + {num_days} days")))?;

        let booked: HashSet<(NaiveDate, NaiveTime)> =
            queries::booked_slots_between(self.conn, &start, &end)?
                .into_iter()
                .collect();

        let calendar = &self.calendar;
        let step = self.slot_minutes;

        Ok(start
            .iter_days()
            .take(num_days as usize)
            .flat_map(move |date| candidate_times(calendar.hours_for(date), step).map(move |time| (date, time)))
            .filter(move |(date, time)| {
                evaluate_slot(calendar, *date, *time, step, booked.contains(&(*date, *time))).is_free()
            })
            .map(|(date, time)| Slot::new(date, time)))
    }

    /// Full diagnostic for one slot, ignoring the booking `exclude_id`.
    pub fn check_slot(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        exclude_id: Option<&str>,
    ) -> Result<SlotCheck, AppError> {
        let is_booked = queries::active_booking_at(self.conn, &date, &time, exclude_id)?.is_some();
        Ok(evaluate_slot(&self.calendar, date, time, self.slot_minutes, is_booked))
    }

    pub fn is_slot_free(&self, date: NaiveDate, time: NaiveTime) -> Result<bool, AppError> {
        Ok(self.check_slot(date, time, None)?.is_free())
    }

    /// Fails with `Conflict` when taken and `Validation` when not bookable at all.
    pub fn ensure_bookable(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        exclude_id: Option<&str>,
    ) -> Result<(), AppError> {
        let check = self.check_slot(date, time, exclude_id)?;
        let Some(reason) = check.rejection() else {
            return Ok(());
        };
        let only_taken = SlotCheck {
            is_booked: false,
            ..check
        }
        .is_free();

        if only_taken {
            Err(AppError::Conflict(format!(
                "{} at {} {}",
                capitalize(reason),
                date,
                time.format("%H:%M")
            )))
        } else {
            Err(AppError::Validation(format!(
                "{} ({} {} {})",
                capitalize(reason),
                weekday_name(date.weekday()),
                date,
                time.format("%H:%M")
            )))
        }
    }
}

// ── Calendar administration ──

pub fn update_business_hours(
    conn: &Connection,
    update: HoursUpdate,
) -> Result<(Weekday, DayHours), AppError> {
    let day = update
        .day
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Day parameter is required".to_string()))?;
    let weekday = parse_weekday(day)?;

    let mut hours = *queries::load_calendar(conn)?.day(weekday);
    if let Some(open) = update.open.as_deref() {
        hours.open = parse_time(open)?;
    }
    if let Some(close) = update.close.as_deref() {
        hours.close = parse_time(close)?;
    }
    if let Some(is_open) = update.is_open {
        hours.is_open = is_open;
    }
    if hours.is_open && hours.close <= hours.open {
        return Err(AppError::Validation(format!(
            "closing time must be after opening time for {}",
            weekday_name(weekday)
        )));
    }

    queries::save_day_hours(conn, weekday, &hours)?;
    tracing::info!(
        day = weekday_name(weekday),
        open = %hours.open.format("%H:%M"),
        close = %hours.close.format("%H:%M"),
        is_open = hours.is_open,
        "business hours updated"
    );
    Ok((weekday, hours))
}

pub fn add_holiday(conn: &Connection, input: NewHoliday) -> Result<Holiday, AppError> {
    let (Some(date), Some(name)) = (
        input.date.filter(|d| !d.trim().is_empty()),
        input.name.filter(|n| !n.trim().is_empty()),
    ) else {
        return Err(AppError::Validation("Date and name are required".to_string()));
    };

    let holiday = Holiday {
        date: parse_date(&date)?,
        name: name.trim().to_string(),
    };
    if !queries::insert_holiday(conn, &holiday)? {
        return Err(AppError::Conflict(format!("A holiday already exists on {}", holiday.date)));
    }
    tracing::info!(date = %holiday.date, name = %holiday.name, "holiday added");
    Ok(holiday)
}

pub fn remove_holiday(conn: &Connection, date: &str) -> Result<NaiveDate, AppError> {
    let date = parse_date(date)?;
    if !queries::delete_holiday(conn, &date)? {
        return Err(AppError::NotFound(format!("holiday on {date}")));
    }
    tracing::info!(date = %date, "holiday removed");
    Ok(date)
}
