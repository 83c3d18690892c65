use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};

/// Source of "now" for date-driven status transitions and timestamps.
pub trait Clock {
    /// Current instant, used for `createdAt` and numeric ids.
    fn now(&self) -> DateTime<Utc>;

    /// Current local calendar day. Time of day is ignored by every comparison.
    fn today(&self) -> NaiveDate;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one calendar day, for deterministic tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    today: NaiveDate,
}

impl FixedClock {
    /// Noon UTC on `today`.
    pub fn on(today: NaiveDate) -> Self {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
        Self {
            now: today.and_time(noon).and_utc(),
            today,
        }
    }

    pub fn at(now: DateTime<Utc>, today: NaiveDate) -> Self {
        Self { now, today }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.today
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
