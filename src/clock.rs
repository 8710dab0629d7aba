use chrono::{NaiveDate, NaiveDateTime, Utc};

/// Source of "now" for timestamps and date-relative stats.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub NaiveDateTime);

impl FixedClock {
    pub fn at(s: &str) -> anyhow::Result<Self> {
        Ok(Self(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")?))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
