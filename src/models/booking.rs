use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub service_id: String,
    #[serde(rename = "service")]
    pub service_name: String,
    pub date: NaiveDate,
    #[serde(with = "super::hhmm")]
    pub time: NaiveTime,
    #[serde(rename = "duration")]
    pub duration_minutes: i32,
    pub price: f64,
    pub deposit_amount: f64,
    pub deposit_paid: bool,
    pub deposit_paid_at: Option<NaiveDateTime>,
    pub status: BookingStatus,
    pub notes: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub cancelled_at: Option<NaiveDateTime>,
    pub cancellation_reason: Option<String>,
}

impl Booking {
    /// Whether this booking holds its (date, time) slot.
    pub fn occupies_slot(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" | "canceled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// Filter for listing bookings. Every field narrows the result.
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub service_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub deposit_paid: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl BookingUpdate {
    pub fn reschedules(&self) -> bool {
        self.date.is_some() || self.time.is_some()
    }
}
