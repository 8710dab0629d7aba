use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use super::BookingStatus;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopularService {
    pub service: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_bookings: usize,
    pub confirmed_bookings: usize,
    pub pending_bookings: usize,
    pub cancelled_bookings: usize,
    pub total_revenue: f64,
    pub total_deposits: f64,
    pub popular_services: Vec<PopularService>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    #[serde(flatten)]
    pub overview: Overview,
    pub today_bookings: usize,
    pub today_revenue: f64,
    pub upcoming_bookings: usize,
    pub upcoming_revenue: f64,
    pub average_booking_value: f64,
    pub conversion_rate: String,
    pub cancellation_rate: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

impl GroupBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" => Some(GroupBy::Day),
            "week" => Some(GroupBy::Week),
            "month" => Some(GroupBy::Month),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePeriod {
    pub period: String,
    pub revenue: f64,
    pub bookings: usize,
    pub deposits: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub group_by: GroupBy,
    pub total_revenue: f64,
    pub total_bookings: usize,
    pub total_deposits: f64,
    pub data: Vec<RevenuePeriod>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStats {
    pub service: String,
    pub service_id: String,
    pub total_bookings: usize,
    pub confirmed_bookings: usize,
    pub cancelled_bookings: usize,
    pub pending_bookings: usize,
    pub total_revenue: f64,
    pub average_price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReport {
    pub data: Vec<ServiceStats>,
    pub most_popular: Option<ServiceStats>,
    pub highest_revenue: Option<ServiceStats>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub client_name: String,
    pub client_email: String,
    pub client_phone: String,
    pub total_bookings: usize,
    pub confirmed_bookings: usize,
    pub total_spent: f64,
    pub last_booking: NaiveDate,
    pub services: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSummary {
    pub bookings: usize,
    pub confirmed: usize,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingBooking {
    pub id: String,
    pub client_name: String,
    pub service: String,
    pub date: NaiveDate,
    #[serde(with = "super::hhmm")]
    pub time: NaiveTime,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub id: String,
    pub action: BookingStatus,
    pub client_name: String,
    pub service: String,
    pub date: NaiveDate,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub overview: Overview,
    pub today: PeriodSummary,
    pub this_week: PeriodSummary,
    pub this_month: PeriodSummary,
    pub upcoming_bookings: Vec<UpcomingBooking>,
    pub recent_activity: Vec<RecentActivity>,
}
