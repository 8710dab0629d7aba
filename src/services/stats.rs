use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};

use crate::models::stats::{
    ClientStats, Dashboard, GroupBy, Overview, PeriodSummary, PopularService, RecentActivity,
    RevenuePeriod, RevenueReport, ServiceReport, ServiceStats, StatsSummary, UpcomingBooking,
};
use crate::models::{Booking, BookingStatus};

const POPULAR_LIMIT: usize = 5;
const CLIENT_LIMIT: usize = 10;
const DASHBOARD_UPCOMING_LIMIT: usize = 10;
const RECENT_ACTIVITY_LIMIT: usize = 5;

fn confirmed(b: &Booking) -> bool {
    b.status == BookingStatus::Confirmed
}

fn count_status(bookings: &[Booking], status: BookingStatus) -> usize {
    bookings.iter().filter(|b| b.status == status).count()
}

fn confirmed_revenue<'a>(bookings: impl IntoIterator<Item = &'a Booking>) -> f64 {
    bookings.into_iter().filter(|b| confirmed(b)).map(|b| b.price).sum()
}

fn percent(part: usize, whole: usize) -> String {
    let ratio = if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    };
    format!("{ratio:.2}%")
}

pub fn overview(bookings: &[Booking]) -> Overview {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for b in bookings.iter().filter(|b| b.occupies_slot()) {
        *counts.entry(b.service_name.as_str()).or_default() += 1;
    }
    let mut popular: Vec<PopularService> = counts
        .into_iter()
        .map(|(service, count)| PopularService {
            service: service.to_string(),
            count,
        })
        .collect();
    popular.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.service.cmp(&b.service)));
    popular.truncate(POPULAR_LIMIT);

    Overview {
        total_bookings: bookings.len(),
        confirmed_bookings: count_status(bookings, BookingStatus::Confirmed),
        pending_bookings: count_status(bookings, BookingStatus::Pending),
        cancelled_bookings: count_status(bookings, BookingStatus::Cancelled),
        total_revenue: confirmed_revenue(bookings),
        total_deposits: bookings
            .iter()
            .filter(|b| b.deposit_paid)
            .map(|b| b.deposit_amount)
            .sum(),
        popular_services: popular,
    }
}

pub fn summary(bookings: &[Booking], today: NaiveDate) -> StatsSummary {
    let overview = overview(bookings);

    let todays: Vec<&Booking> = bookings.iter().filter(|b| b.date == today).collect();
    let upcoming: Vec<&Booking> = bookings
        .iter()
        .filter(|b| confirmed(b) && b.date > today)
        .collect();

    let average_booking_value = overview.total_revenue / overview.confirmed_bookings.max(1) as f64;

    StatsSummary {
        today_bookings: todays.len(),
        today_revenue: confirmed_revenue(todays.iter().copied()),
        upcoming_bookings: upcoming.len(),
        upcoming_revenue: upcoming.iter().map(|b| b.price).sum(),
        average_booking_value: (average_booking_value * 100.0).round() / 100.0,
        conversion_rate: percent(overview.confirmed_bookings, overview.total_bookings),
        cancellation_rate: percent(overview.cancelled_bookings, overview.total_bookings),
        overview,
    }
}

fn period_key(date: NaiveDate, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Day => date.format("%Y-%m-%d").to_string(),
        GroupBy::Week => date.format("%G-W%V").to_string(),
        GroupBy::Month => date.format("%Y-%m").to_string(),
    }
}

/// Confirmed revenue within `[from, to]`, bucketed by period.
pub fn revenue(
    bookings: &[Booking],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    group_by: GroupBy,
) -> RevenueReport {
    let mut periods: BTreeMap<String, RevenuePeriod> = BTreeMap::new();

    let matching = bookings.iter().filter(|b| {
        confirmed(b) && from.map_or(true, |f| b.date >= f) && to.map_or(true, |t| b.date <= t)
    });
    for b in matching {
        let key = period_key(b.date, group_by);
        let period = periods.entry(key.clone()).or_insert_with(|| RevenuePeriod {
            period: key,
            revenue: 0.0,
            bookings: 0,
            deposits: 0.0,
        });
        period.revenue += b.price;
        period.bookings += 1;
        if b.deposit_paid {
            period.deposits += b.deposit_amount;
        }
    }

    let data: Vec<RevenuePeriod> = periods.into_values().collect();
    RevenueReport {
        group_by,
        total_revenue: data.iter().map(|p| p.revenue).sum(),
        total_bookings: data.iter().map(|p| p.bookings).sum(),
        total_deposits: data.iter().map(|p| p.deposits).sum(),
        data,
    }
}

pub fn service_report(bookings: &[Booking]) -> ServiceReport {
    let mut by_service: HashMap<&str, ServiceStats> = HashMap::new();
    for b in bookings {
        let stats = by_service
            .entry(b.service_id.as_str())
            .or_insert_with(|| ServiceStats {
                service: b.service_name.clone(),
                service_id: b.service_id.clone(),
                total_bookings: 0,
                confirmed_bookings: 0,
                cancelled_bookings: 0,
                pending_bookings: 0,
                total_revenue: 0.0,
                average_price: 0.0,
            });
        stats.total_bookings += 1;
        match b.status {
            BookingStatus::Confirmed => {
                stats.confirmed_bookings += 1;
                stats.total_revenue += b.price;
            }
            BookingStatus::Cancelled => stats.cancelled_bookings += 1,
            BookingStatus::Pending => stats.pending_bookings += 1,
        }
    }

    let mut data: Vec<ServiceStats> = by_service
        .into_values()
        .map(|mut s| {
            s.average_price = s.total_revenue / s.confirmed_bookings.max(1) as f64;
            s
        })
        .collect();
    data.sort_by(|a, b| {
        b.total_bookings
            .cmp(&a.total_bookings)
            .then_with(|| a.service.cmp(&b.service))
    });

    let highest_revenue = data
        .iter()
        .max_by(|a, b| a.total_revenue.total_cmp(&b.total_revenue))
        .cloned();

    ServiceReport {
        most_popular: data.first().cloned(),
        highest_revenue,
        data,
    }
}

pub fn client_report(bookings: &[Booking]) -> Vec<ClientStats> {
    let mut by_email: HashMap<String, ClientStats> = HashMap::new();
    for b in bookings {
        let client = by_email
            .entry(b.client_email.to_lowercase())
            .or_insert_with(|| ClientStats {
                client_name: b.client_name.clone(),
                client_email: b.client_email.clone(),
                client_phone: b.client_phone.clone(),
                total_bookings: 0,
                confirmed_bookings: 0,
                total_spent: 0.0,
                last_booking: b.date,
                services: Vec::new(),
            });
        client.total_bookings += 1;
        if confirmed(b) {
            client.confirmed_bookings += 1;
            client.total_spent += b.price;
        }
        client.last_booking = client.last_booking.max(b.date);
        if !client.services.contains(&b.service_name) {
            client.services.push(b.service_name.clone());
        }
    }

    let mut clients: Vec<ClientStats> = by_email.into_values().collect();
    clients.sort_by(|a, b| {
        b.total_spent
            .total_cmp(&a.total_spent)
            .then_with(|| a.client_email.cmp(&b.client_email))
    });
    clients.truncate(CLIENT_LIMIT);
    clients
}

fn period_summary<'a>(bookings: impl Iterator<Item = &'a Booking> + Clone) -> PeriodSummary {
    PeriodSummary {
        bookings: bookings.clone().count(),
        confirmed: bookings.clone().filter(|b| confirmed(b)).count(),
        revenue: confirmed_revenue(bookings),
    }
}

fn in_range(b: &Booking, start: NaiveDate, end: NaiveDate) -> bool {
    b.date >= start && b.date <= end
}

pub fn dashboard(bookings: &[Booking], now: NaiveDateTime) -> Dashboard {
    let today = now.date();

    let week_start = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
    let week_end = week_start + Days::new(6);
    let month_start = today.with_day(1).unwrap_or(today);
    let month_end = month_start
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    let horizon = today + Days::new(7);

    let upcoming_bookings = bookings
        .iter()
        .filter(|b| confirmed(b) && b.date > today && b.date <= horizon)
        .take(DASHBOARD_UPCOMING_LIMIT)
        .map(|b| UpcomingBooking {
            id: b.id.clone(),
            client_name: b.client_name.clone(),
            service: b.service_name.clone(),
            date: b.date,
            time: b.time,
            price: b.price,
        })
        .collect();

    let mut recent: Vec<&Booking> = bookings.iter().collect();
    recent.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let recent_activity = recent
        .into_iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|b| RecentActivity {
            id: b.id.clone(),
            action: b.status,
            client_name: b.client_name.clone(),
            service: b.service_name.clone(),
            date: b.date,
            updated_at: b.updated_at,
        })
        .collect();

    Dashboard {
        overview: overview(bookings),
        today: period_summary(bookings.iter().filter(|b| b.date == today)),
        this_week: period_summary(bookings.iter().filter(|b| in_range(b, week_start, week_end))),
        this_month: period_summary(bookings.iter().filter(|b| in_range(b, month_start, month_end))),
        upcoming_bookings,
        recent_activity,
    }
}
