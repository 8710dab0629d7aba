use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::Booking;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum BookingEventKind {
    #[serde(rename = "booking.created")]
    Created,
    #[serde(rename = "booking.updated")]
    Updated,
    #[serde(rename = "booking.confirmed")]
    Confirmed,
    #[serde(rename = "booking.cancelled")]
    Cancelled,
    #[serde(rename = "booking.deleted")]
    Deleted,
    #[serde(rename = "booking.deposit_paid")]
    DepositPaid,
}

impl BookingEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingEventKind::Created => "booking.created",
            BookingEventKind::Updated => "booking.updated",
            BookingEventKind::Confirmed => "booking.confirmed",
            BookingEventKind::Cancelled => "booking.cancelled",
            BookingEventKind::Deleted => "booking.deleted",
            BookingEventKind::DepositPaid => "booking.deposit_paid",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEvent {
    pub event: BookingEventKind,
    pub booking: Booking,
    pub timestamp: NaiveDateTime,
}

/// Broadcasts to live subscribers. Dropped silently when nobody is listening.
pub fn publish(
    tx: &broadcast::Sender<BookingEvent>,
    kind: BookingEventKind,
    booking: &Booking,
    at: NaiveDateTime,
) {
    let receivers = tx
        .send(BookingEvent {
            event: kind,
            booking: booking.clone(),
            timestamp: at,
        })
        .unwrap_or(0);
    tracing::debug!(event = kind.as_str(), booking_id = %booking.id, receivers, "booking event");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;

    fn sample() -> Booking {
        let at = NaiveDateTime::parse_from_str("2025-06-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        Booking {
            id: "bk-1".to_string(),
            client_name: "Lisa Anderson".to_string(),
            client_email: "lisa.a@email.com".to_string(),
            client_phone: "+1-555-0105".to_string(),
            service_id: "srv_005".to_string(),
            service_name: "Microneedling".to_string(),
            date: at.date(),
            time: at.time(),
            duration_minutes: 75,
            price: 400.0,
            deposit_amount: 80.0,
            deposit_paid: false,
            deposit_paid_at: None,
            status: BookingStatus::Pending,
            notes: String::new(),
            created_at: at,
            updated_at: at,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let (tx, _) = broadcast::channel(4);
        let b = sample();
        publish(&tx, BookingEventKind::Created, &b, b.created_at);
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let (tx, mut rx) = broadcast::channel(4);
        let b = sample();
        publish(&tx, BookingEventKind::Cancelled, &b, b.updated_at);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event, BookingEventKind::Cancelled);
        assert_eq!(event.booking.id, "bk-1");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "booking.cancelled");
        assert_eq!(json["booking"]["clientName"], "Lisa Anderson");
    }
}
