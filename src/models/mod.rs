pub mod booking;
pub mod calendar;
pub mod service;
pub mod stats;

pub use booking::{Booking, BookingFilter, BookingStatus, BookingUpdate, NewBooking};
pub use calendar::{BusinessCalendar, DayHours, Holiday, HoursUpdate, NewHoliday, OpeningHours};
pub use service::{DepositRule, NewService, Service, ServiceUpdate};

/// Serde adapter for `HH:MM` times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, "%H:%M").map_err(serde::de::Error::custom)
    }
}
