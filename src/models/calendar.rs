use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DayHours {
    #[serde(with = "super::hhmm")]
    pub open: NaiveTime,
    #[serde(with = "super::hhmm")]
    pub close: NaiveTime,
    pub is_open: bool,
}

impl DayHours {
    pub fn closed() -> Self {
        Self {
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
            is_open: false,
        }
    }
}

/// Opening window for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OpeningHours {
    Open { open: NaiveTime, close: NaiveTime },
    Closed,
}

impl OpeningHours {
    /// Half-open: `open <= time < close`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        match self {
            OpeningHours::Open { open, close } => time >= *open && time < *close,
            OpeningHours::Closed => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holiday {
    pub date: NaiveDate,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct BusinessCalendar {
    hours: [DayHours; 7],
    holidays: BTreeMap<NaiveDate, String>,
}

impl BusinessCalendar {
    /// `hours` is indexed by days from Monday.
    pub fn new(hours: [DayHours; 7], holidays: impl IntoIterator<Item = Holiday>) -> Self {
        Self {
            hours,
            holidays: holidays.into_iter().map(|h| (h.date, h.name)).collect(),
        }
    }

    pub fn day(&self, weekday: Weekday) -> &DayHours {
        &self.hours[weekday.num_days_from_monday() as usize]
    }

    pub fn holiday(&self, date: NaiveDate) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains_key(&date)
    }

    /// A date is open when its weekday is flagged open and it is not a holiday.
    pub fn is_open(&self, date: NaiveDate) -> bool {
        self.day(date.weekday()).is_open && !self.is_holiday(date)
    }

    pub fn hours_for(&self, date: NaiveDate) -> OpeningHours {
        if !self.is_open(date) {
            return OpeningHours::Closed;
        }
        let day = self.day(date.weekday());
        OpeningHours::Open {
            open: day.open,
            close: day.close,
        }
    }

    pub fn holidays(&self) -> Vec<Holiday> {
        self.holidays
            .iter()
            .map(|(date, name)| Holiday {
                date: *date,
                name: name.clone(),
            })
            .collect()
    }

    pub fn weekly_hours(&self) -> impl Iterator<Item = (Weekday, &DayHours)> {
        WEEKDAYS.iter().map(move |wd| (*wd, self.day(*wd)))
    }

    pub fn to_human_readable(&self) -> String {
        self.weekly_hours()
            .filter(|(_, h)| h.is_open)
            .map(|(wd, h)| {
                format!(
                    "{}: {}-{}",
                    capitalize(weekday_name(wd)),
                    h.open.format("%H:%M"),
                    h.close.format("%H:%M")
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Partial change to one weekday's hours.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursUpdate {
    pub day: Option<String>,
    pub open: Option<String>,
    pub close: Option<String>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewHoliday {
    pub date: Option<String>,
    pub name: Option<String>,
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().to_string() + c.as_str(),
    }
}

pub fn parse_weekday(s: &str) -> Result<Weekday, AppError> {
    let lower = s.trim().to_lowercase();
    WEEKDAYS
        .iter()
        .copied()
        .find(|wd| {
            let name = weekday_name(*wd);
            lower == name || (lower.len() == 3 && name.starts_with(&lower))
        })
        .ok_or_else(|| AppError::Validation(format!("invalid weekday: {s}")))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date (expected YYYY-MM-DD): {s}")))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, AppError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("invalid time (expected HH:MM): {s}")))
}
