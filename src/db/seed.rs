use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::models::{Booking, BookingStatus, DepositRule, Holiday, Service};

// (id, name, category, description, duration, price, deposit %)
const SERVICES: &[(&str, &str, &str, &str, i32, f64, u8)] = &[
    ("srv_001", "Botox Treatment", "Injectables", "Reduce fine lines and wrinkles with Botox.", 60, 450.0, 20),
    ("srv_002", "Hydrafacial", "Facials", "Deep cleanse, exfoliate, and hydrate.", 90, 250.0, 20),
    ("srv_003", "Laser Hair Removal", "Laser Treatments", "Permanent hair reduction with medical-grade laser.", 120, 600.0, 20),
    ("srv_004", "Chemical Peel", "Skin Treatments", "Medical-grade peel to improve texture and tone.", 60, 350.0, 20),
    ("srv_005", "Microneedling", "Skin Treatments", "Collagen induction therapy for texture and scarring.", 75, 400.0, 20),
    ("srv_006", "Dermal Fillers", "Injectables", "Restore volume and contour with hyaluronic acid fillers.", 90, 800.0, 20),
    ("srv_007", "IPL Photofacial", "Laser Treatments", "Light therapy for sun damage and redness.", 45, 500.0, 20),
    ("srv_008", "CoolSculpting", "Body Contouring", "Non-invasive fat reduction.", 60, 600.0, 25),
];

const HOLIDAYS: &[(&str, &str)] = &[
    ("2024-12-25", "Christmas Day"),
    ("2024-12-31", "New Year's Eve"),
    ("2025-01-01", "New Year's Day"),
];

// (client, email, phone, service, date, time, status, deposit paid, notes, created)
const BOOKINGS: &[(&str, &str, &str, &str, &str, &str, BookingStatus, bool, &str, &str)] = &[
    ("Sarah Johnson", "sarah.j@email.com", "+1-555-0101", "srv_001", "2024-12-20", "10:00", BookingStatus::Confirmed, true, "First time client, referred by Dr. Smith", "2024-12-15 09:00:00"),
    ("Michael Chen", "m.chen@email.com", "+1-555-0102", "srv_002", "2024-12-20", "14:00", BookingStatus::Confirmed, true, "Regular client, sensitive skin", "2024-12-14 10:00:00"),
    ("Emma Wilson", "emma.w@email.com", "+1-555-0103", "srv_003", "2024-12-21", "11:00", BookingStatus::Pending, false, "Needs to pay deposit", "2024-12-16 14:00:00"),
    ("David Martinez", "d.martinez@email.com", "+1-555-0104", "srv_004", "2024-12-21", "15:00", BookingStatus::Confirmed, true, "Allergic to certain chemicals - check chart", "2024-12-13 11:00:00"),
    ("Lisa Anderson", "lisa.a@email.com", "+1-555-0105", "srv_005", "2024-12-22", "09:00", BookingStatus::Confirmed, true, "VIP client", "2024-12-10 08:00:00"),
    ("Robert Taylor", "r.taylor@email.com", "+1-555-0106", "srv_006", "2024-12-22", "13:00", BookingStatus::Cancelled, true, "Cancelled due to emergency", "2024-12-11 10:00:00"),
];

/// Loads the demo catalog, holidays and sample bookings into an empty database.
pub fn seed_demo_data(conn: &Connection) -> anyhow::Result<()> {
    if !queries::list_services(conn, None, None)?.is_empty() {
        tracing::info!("catalog already populated, skipping demo seed");
        return Ok(());
    }

    for (id, name, category, description, duration, price, deposit) in SERVICES {
        queries::insert_service(
            conn,
            &Service {
                id: id.to_string(),
                name: name.to_string(),
                category: category.to_string(),
                description: description.to_string(),
                duration_minutes: *duration,
                price: *price,
                deposit_required: true,
                deposit_rule: DepositRule::Percentage { value: *deposit },
                available: true,
            },
        )?;
    }

    for (date, name) in HOLIDAYS {
        queries::insert_holiday(
            conn,
            &Holiday {
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d")?,
                name: name.to_string(),
            },
        )?;
    }

    for (client, email, phone, service_id, date, time, status, paid, notes, created) in BOOKINGS {
        let service = queries::get_service(conn, service_id)?
            .ok_or_else(|| anyhow::anyhow!("seed references unknown service {service_id}"))?;
        let created_at = NaiveDateTime::parse_from_str(created, "%Y-%m-%d %H:%M:%S")?;

        queries::insert_booking(
            conn,
            &Booking {
                id: uuid::Uuid::new_v4().to_string(),
                client_name: client.to_string(),
                client_email: email.to_string(),
                client_phone: phone.to_string(),
                service_id: service.id.clone(),
                service_name: service.name.clone(),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d")?,
                time: NaiveTime::parse_from_str(time, "%H:%M")?,
                duration_minutes: service.duration_minutes,
                price: service.price,
                deposit_amount: service.deposit_amount(),
                deposit_paid: *paid,
                deposit_paid_at: paid.then_some(created_at),
                status: *status,
                notes: notes.to_string(),
                created_at,
                updated_at: created_at,
                cancelled_at: (*status == BookingStatus::Cancelled).then_some(created_at),
                cancellation_reason: (*status == BookingStatus::Cancelled)
                    .then(|| notes.to_string()),
            },
        )?;
    }

    tracing::info!(
        services = SERVICES.len(),
        holidays = HOLIDAYS.len(),
        bookings = BOOKINGS.len(),
        "seeded demo data"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_seed_is_applied_once() {
        let conn = db::init_db(":memory:").unwrap();
        seed_demo_data(&conn).unwrap();
        seed_demo_data(&conn).unwrap();

        assert_eq!(queries::list_services(&conn, None, None).unwrap().len(), SERVICES.len());
        assert_eq!(queries::all_bookings(&conn).unwrap().len(), BOOKINGS.len());
        assert_eq!(queries::list_holidays(&conn).unwrap().len(), HOLIDAYS.len());
    }

    #[test]
    fn test_seeded_deposits_follow_service_rule() {
        let conn = db::init_db(":memory:").unwrap();
        seed_demo_data(&conn).unwrap();

        let hydrafacial = queries::get_service(&conn, "srv_002").unwrap().unwrap();
        assert_eq!(hydrafacial.deposit_amount(), 50.0);
        let coolsculpting = queries::get_service(&conn, "srv_008").unwrap().unwrap();
        assert_eq!(coolsculpting.deposit_amount(), 150.0);
    }
}
