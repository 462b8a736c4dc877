//! Conversions between the native temporal structs and `chrono` types.
//!
//! Conversions into `chrono` return `None` when the stored fields fall
//! outside what `chrono` can represent.

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use super::value::{Date, DateTime, DateTimeZoneId, LocalDateTime, LocalTime};

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAY_FROM_CE: i64 = 719_163;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Reads `epoch_second` as a wall-clock reading on the UTC timeline.
pub(crate) fn naive_from_epoch(epoch_second: i64, nanos: u32) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp(epoch_second, nanos).map(|dt| dt.naive_utc())
}

pub(crate) fn epoch_of_naive(naive: &NaiveDateTime) -> i64 {
    naive.and_utc().timestamp()
}

impl Date {
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        let days = self.epoch_day.checked_add(UNIX_EPOCH_DAY_FROM_CE)?;
        NaiveDate::from_num_days_from_ce_opt(i32::try_from(days).ok()?)
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self {
            epoch_day: i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAY_FROM_CE,
        }
    }
}

impl LocalTime {
    pub fn to_naive_time(&self) -> Option<NaiveTime> {
        if self.nanos_of_day < 0 {
            return None;
        }
        let secs = u32::try_from(self.nanos_of_day / NANOS_PER_SECOND).ok()?;
        let nanos = (self.nanos_of_day % NANOS_PER_SECOND) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
    }
}

impl From<NaiveTime> for LocalTime {
    fn from(time: NaiveTime) -> Self {
        Self {
            nanos_of_day: i64::from(time.num_seconds_from_midnight()) * NANOS_PER_SECOND
                + i64::from(time.nanosecond()),
        }
    }
}

impl LocalDateTime {
    pub fn to_naive_date_time(&self) -> Option<NaiveDateTime> {
        naive_from_epoch(self.epoch_second_local, u32::try_from(self.nanos).ok()?)
    }
}

impl From<NaiveDateTime> for LocalDateTime {
    fn from(naive: NaiveDateTime) -> Self {
        Self {
            epoch_second_local: epoch_of_naive(&naive),
            nanos: i64::from(naive.nanosecond()),
        }
    }
}

impl DateTime {
    pub fn to_chrono(&self) -> Option<chrono::DateTime<FixedOffset>> {
        let offset = FixedOffset::east_opt(self.tz_offset_seconds)?;
        let naive = naive_from_epoch(self.epoch_second_local, u32::try_from(self.nanos).ok()?)?;
        offset.from_local_datetime(&naive).single()
    }
}

impl From<chrono::DateTime<FixedOffset>> for DateTime {
    fn from(dt: chrono::DateTime<FixedOffset>) -> Self {
        Self {
            epoch_second_local: epoch_of_naive(&dt.naive_local()),
            nanos: dt.nanosecond() as i32,
            tz_offset_seconds: dt.offset().local_minus_utc(),
        }
    }
}

impl DateTimeZoneId {
    /// Resolves the wall-clock reading in its zone.
    ///
    /// Ambiguous readings (clocks turned back) resolve to the earlier
    /// instant; readings skipped by a transition yield `None`.
    pub fn to_chrono(&self) -> Option<chrono::DateTime<Tz>> {
        let naive = naive_from_epoch(self.epoch_second_local, u32::try_from(self.nanos).ok()?)?;
        self.zone_id.from_local_datetime(&naive).earliest()
    }
}

impl From<chrono::DateTime<Tz>> for DateTimeZoneId {
    fn from(dt: chrono::DateTime<Tz>) -> Self {
        Self {
            epoch_second_local: epoch_of_naive(&dt.naive_local()),
            nanos: dt.nanosecond() as i32,
            zone_id: dt.timezone(),
        }
    }
}
