use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{
    Booking, BookingFilter, BookingStatus, BusinessCalendar, DayHours, DepositRule, Holiday,
    Service,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

fn fmt_time(t: &NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("malformed timestamp in database: {s}"))
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, client_name, client_email, client_phone, service_id, service_name, \
     date, time, duration_minutes, price, deposit_amount, deposit_paid, deposit_paid_at, status, \
     notes, created_at, updated_at, cancelled_at, cancellation_reason";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
        ),
        params![
            booking.id,
            booking.client_name,
            booking.client_email,
            booking.client_phone,
            booking.service_id,
            booking.service_name,
            fmt_date(&booking.date),
            fmt_time(&booking.time),
            booking.duration_minutes,
            booking.price,
            booking.deposit_amount,
            booking.deposit_paid,
            booking.deposit_paid_at.as_ref().map(fmt_ts),
            booking.status.as_str(),
            booking.notes,
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
            booking.cancelled_at.as_ref().map(fmt_ts),
            booking.cancellation_reason,
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let mut stmt = conn.prepare(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"))?;
    let row = stmt
        .query_row(params![id], |row| Ok(parse_booking_row(row)))
        .optional()?;
    row.transpose()
}

/// Bookings matching `filter`, ordered by date then time.
pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn ToSql>> = Vec::new();

    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(Box::new(status.as_str()));
    }
    if let Some(date) = &filter.date {
        clauses.push("date = ?");
        values.push(Box::new(fmt_date(date)));
    }
    if let Some(from) = &filter.from {
        clauses.push("date >= ?");
        values.push(Box::new(fmt_date(from)));
    }
    if let Some(to) = &filter.to {
        clauses.push("date <= ?");
        values.push(Box::new(fmt_date(to)));
    }
    if let Some(email) = &filter.client_email {
        clauses.push("instr(lower(client_email), lower(?)) > 0");
        values.push(Box::new(email.clone()));
    }
    if let Some(phone) = &filter.client_phone {
        clauses.push("instr(client_phone, ?) > 0");
        values.push(Box::new(phone.clone()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings{where_sql} ORDER BY date ASC, time ASC, created_at ASC");

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(params.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn all_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    list_bookings(conn, &BookingFilter::default())
}

/// Id of the non-cancelled booking holding `(date, time)`, ignoring `exclude_id`.
pub fn active_booking_at(
    conn: &Connection,
    date: &NaiveDate,
    time: &NaiveTime,
    exclude_id: Option<&str>,
) -> anyhow::Result<Option<String>> {
    let id = conn
        .query_row(
            "SELECT id FROM bookings
             WHERE date = ?1 AND time = ?2 AND status != 'cancelled' AND (?3 IS NULL OR id != ?3)
             LIMIT 1",
            params![fmt_date(date), fmt_time(time), exclude_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Occupied `(date, time)` pairs with `start <= date < end`.
pub fn booked_slots_between(
    conn: &Connection,
    start: &NaiveDate,
    end: &NaiveDate,
) -> anyhow::Result<Vec<(NaiveDate, NaiveTime)>> {
    let mut stmt = conn.prepare(
        "SELECT date, time FROM bookings
         WHERE date >= ?1 AND date < ?2 AND status != 'cancelled'",
    )?;
    let rows = stmt.query_map(params![fmt_date(start), fmt_date(end)], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut slots = vec![];
    for row in rows {
        let (date, time) = row?;
        slots.push((
            NaiveDate::parse_from_str(&date, DATE_FORMAT)?,
            NaiveTime::parse_from_str(&time, TIME_FORMAT)?,
        ));
    }
    Ok(slots)
}

/// Overwrites every mutable column. `id` and `created_at` are never written.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET
            client_name = ?1, client_email = ?2, client_phone = ?3, service_id = ?4,
            service_name = ?5, date = ?6, time = ?7, duration_minutes = ?8, price = ?9,
            deposit_amount = ?10, deposit_paid = ?11, deposit_paid_at = ?12, status = ?13,
            notes = ?14, updated_at = ?15, cancelled_at = ?16, cancellation_reason = ?17
         WHERE id = ?18",
        params![
            booking.client_name,
            booking.client_email,
            booking.client_phone,
            booking.service_id,
            booking.service_name,
            fmt_date(&booking.date),
            fmt_time(&booking.time),
            booking.duration_minutes,
            booking.price,
            booking.deposit_amount,
            booking.deposit_paid,
            booking.deposit_paid_at.as_ref().map(fmt_ts),
            booking.status.as_str(),
            booking.notes,
            fmt_ts(&booking.updated_at),
            booking.cancelled_at.as_ref().map(fmt_ts),
            booking.cancellation_reason,
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn count_active_bookings_for_service(conn: &Connection, service_id: &str) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE service_id = ?1 AND status != 'cancelled'",
        params![service_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let date_str: String = row.get(6)?;
    let time_str: String = row.get(7)?;
    let deposit_paid_at: Option<String> = row.get(12)?;
    let status_str: String = row.get(13)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;
    let cancelled_at: Option<String> = row.get(17)?;

    let status = BookingStatus::parse(&status_str)
        .with_context(|| format!("unknown booking status in database: {status_str}"))?;

    Ok(Booking {
        id: row.get(0)?,
        client_name: row.get(1)?,
        client_email: row.get(2)?,
        client_phone: row.get(3)?,
        service_id: row.get(4)?,
        service_name: row.get(5)?,
        date: NaiveDate::parse_from_str(&date_str, DATE_FORMAT)?,
        time: NaiveTime::parse_from_str(&time_str, TIME_FORMAT)?,
        duration_minutes: row.get(8)?,
        price: row.get(9)?,
        deposit_amount: row.get(10)?,
        deposit_paid: row.get(11)?,
        deposit_paid_at: deposit_paid_at.as_deref().map(parse_ts).transpose()?,
        status,
        notes: row.get(14)?,
        created_at: parse_ts(&created_at_str)?,
        updated_at: parse_ts(&updated_at_str)?,
        cancelled_at: cancelled_at.as_deref().map(parse_ts).transpose()?,
        cancellation_reason: row.get(18)?,
    })
}

// ── Services ──

const SERVICE_COLUMNS: &str = "id, name, category, description, duration_minutes, price, \
     deposit_required, deposit_kind, deposit_value, available";

pub fn insert_service(conn: &Connection, service: &Service) -> anyhow::Result<()> {
    conn.execute(
        &format!("INSERT INTO services ({SERVICE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"),
        params![
            service.id,
            service.name,
            service.category,
            service.description,
            service.duration_minutes,
            service.price,
            service.deposit_required,
            service.deposit_rule.kind(),
            service.deposit_rule.value(),
            service.available,
        ],
    )?;
    Ok(())
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let mut stmt = conn.prepare(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"))?;
    let service = stmt.query_row(params![id], parse_service_row).optional()?;
    Ok(service)
}

pub fn list_services(
    conn: &Connection,
    category: Option<&str>,
    available: Option<bool>,
) -> anyhow::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services
         WHERE (?1 IS NULL OR lower(category) = lower(?1)) AND (?2 IS NULL OR available = ?2)
         ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map(params![category, available], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn list_categories(conn: &Connection) -> anyhow::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT category FROM services ORDER BY category ASC")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut categories = vec![];
    for row in rows {
        categories.push(row?);
    }
    Ok(categories)
}

pub fn update_service(conn: &Connection, service: &Service) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET
            name = ?1, category = ?2, description = ?3, duration_minutes = ?4, price = ?5,
            deposit_required = ?6, deposit_kind = ?7, deposit_value = ?8, available = ?9
         WHERE id = ?10",
        params![
            service.name,
            service.category,
            service.description,
            service.duration_minutes,
            service.price,
            service.deposit_required,
            service.deposit_rule.kind(),
            service.deposit_rule.value(),
            service.available,
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<Service> {
    let deposit_kind: String = row.get(7)?;
    let deposit_value: f64 = row.get(8)?;

    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        description: row.get(3)?,
        duration_minutes: row.get(4)?,
        price: row.get(5)?,
        deposit_required: row.get(6)?,
        deposit_rule: DepositRule::from_parts(&deposit_kind, deposit_value),
        available: row.get(9)?,
    })
}

// ── Business calendar ──

pub fn load_calendar(conn: &Connection) -> anyhow::Result<BusinessCalendar> {
    let mut hours = [DayHours::closed(); 7];

    let mut stmt = conn.prepare("SELECT weekday, open, close, is_open FROM business_hours")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, bool>(3)?,
        ))
    })?;
    for row in rows {
        let (weekday, open, close, is_open) = row?;
        let slot = hours
            .get_mut(weekday as usize)
            .with_context(|| format!("weekday out of range in database: {weekday}"))?;
        *slot = DayHours {
            open: NaiveTime::parse_from_str(&open, TIME_FORMAT)?,
            close: NaiveTime::parse_from_str(&close, TIME_FORMAT)?,
            is_open,
        };
    }

    Ok(BusinessCalendar::new(hours, list_holidays(conn)?))
}

pub fn save_day_hours(
    conn: &Connection,
    weekday: chrono::Weekday,
    hours: &DayHours,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO business_hours (weekday, open, close, is_open) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(weekday) DO UPDATE SET
           open = excluded.open,
           close = excluded.close,
           is_open = excluded.is_open",
        params![
            weekday.num_days_from_monday(),
            fmt_time(&hours.open),
            fmt_time(&hours.close),
            hours.is_open,
        ],
    )?;
    Ok(())
}

pub fn list_holidays(conn: &Connection) -> anyhow::Result<Vec<Holiday>> {
    let mut stmt = conn.prepare("SELECT date, name FROM holidays ORDER BY date ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut holidays = vec![];
    for row in rows {
        let (date, name) = row?;
        holidays.push(Holiday {
            date: NaiveDate::parse_from_str(&date, DATE_FORMAT)?,
            name,
        });
    }
    Ok(holidays)
}

/// Returns false when a holiday already exists on that date.
pub fn insert_holiday(conn: &Connection, holiday: &Holiday) -> anyhow::Result<bool> {
    let count = conn.execute(
        "INSERT OR IGNORE INTO holidays (date, name) VALUES (?1, ?2)",
        params![fmt_date(&holiday.date), holiday.name],
    )?;
    Ok(count > 0)
}

pub fn delete_holiday(conn: &Connection, date: &NaiveDate) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM holidays WHERE date = ?1", params![fmt_date(date)])?;
    Ok(count > 0)
}
