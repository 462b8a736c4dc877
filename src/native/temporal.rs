//! Duration, date, time and date-time structs.
//!
//! Zoned date-times come in two encodings. The legacy one writes the local
//! wall-clock seconds; the UTC one writes the instant and the reader adds the
//! offset back. Decoded values always hold local seconds.

use bytes::{Buf, BufMut};
use chrono::{Offset, TimeZone};
use chrono_tz::Tz;

use super::DateTimeEncoding;
use crate::error::{PackstreamError, StructFieldCause};
use crate::packstream::PackstreamBuf;
use crate::types::{
    Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Time, epoch_of_naive,
    naive_from_epoch,
};

const OUT_OF_BOUNDS: &str = "Value is out of bounds";

fn read_i32_field<B: Buf>(
    buf: &mut PackstreamBuf<B>,
    field: &'static str,
) -> Result<i32, PackstreamError> {
    let value = buf.read_int()?;
    i32::try_from(value).map_err(|_| PackstreamError::illegal_field(field, OUT_OF_BOUNDS))
}

fn seconds_out_of_bounds() -> PackstreamError {
    PackstreamError::illegal_field("seconds", OUT_OF_BOUNDS)
}

fn parse_zone(id: &str) -> Result<Tz, PackstreamError> {
    id.parse::<Tz>().map_err(|_| {
        PackstreamError::illegal_field_caused_by(
            "tz_id",
            format!("Illegal zone identifier: \"{id}\""),
            StructFieldCause::UnknownZone(id.to_owned()),
        )
    })
}

/// Offset in effect in `zone` at the UTC instant `epoch_second_utc`.
fn zone_offset_at(zone: Tz, epoch_second_utc: i64) -> Result<i32, PackstreamError> {
    let instant = naive_from_epoch(epoch_second_utc, 0).ok_or_else(seconds_out_of_bounds)?;
    Ok(zone.offset_from_utc_datetime(&instant).fix().local_minus_utc())
}

// -- Duration --

pub(super) fn read_duration<B: Buf>(
    buf: &mut PackstreamBuf<B>,
) -> Result<Duration, PackstreamError> {
    Ok(Duration {
        months: buf.read_int()?,
        days: buf.read_int()?,
        seconds: buf.read_int()?,
        nanoseconds: buf.read_int()?,
    })
}

pub(super) fn write_duration<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    duration: &Duration,
) -> Result<(), PackstreamError> {
    buf.write_int(duration.months)
        .write_int(duration.days)
        .write_int(duration.seconds)
        .write_int(duration.nanoseconds);
    Ok(())
}

// -- Date and local times --

pub(super) fn read_date<B: Buf>(buf: &mut PackstreamBuf<B>) -> Result<Date, PackstreamError> {
    Ok(Date {
        epoch_day: buf.read_int()?,
    })
}

pub(super) fn write_date<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    date: &Date,
) -> Result<(), PackstreamError> {
    buf.write_int(date.epoch_day);
    Ok(())
}

pub(super) fn read_local_time<B: Buf>(
    buf: &mut PackstreamBuf<B>,
) -> Result<LocalTime, PackstreamError> {
    Ok(LocalTime {
        nanos_of_day: buf.read_int()?,
    })
}

pub(super) fn write_local_time<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    time: &LocalTime,
) -> Result<(), PackstreamError> {
    buf.write_int(time.nanos_of_day);
    Ok(())
}

pub(super) fn read_time<B: Buf>(buf: &mut PackstreamBuf<B>) -> Result<Time, PackstreamError> {
    Ok(Time {
        nanos_of_day: buf.read_int()?,
        tz_offset_seconds: read_i32_field(buf, "tz_offset_seconds")?,
    })
}

pub(super) fn write_time<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    time: &Time,
) -> Result<(), PackstreamError> {
    buf.write_int(time.nanos_of_day)
        .write_int(i64::from(time.tz_offset_seconds));
    Ok(())
}

pub(super) fn read_local_date_time<B: Buf>(
    buf: &mut PackstreamBuf<B>,
) -> Result<LocalDateTime, PackstreamError> {
    Ok(LocalDateTime {
        epoch_second_local: buf.read_int()?,
        nanos: buf.read_int()?,
    })
}

pub(super) fn write_local_date_time<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    dt: &LocalDateTime,
) -> Result<(), PackstreamError> {
    buf.write_int(dt.epoch_second_local).write_int(dt.nanos);
    Ok(())
}

// -- Zoned date-times --

pub(super) fn read_date_time<B: Buf>(
    buf: &mut PackstreamBuf<B>,
    encoding: DateTimeEncoding,
) -> Result<DateTime, PackstreamError> {
    let seconds = buf.read_int()?;
    let nanos = read_i32_field(buf, "nanoseconds")?;
    let tz_offset_seconds = read_i32_field(buf, "tz_offset_seconds")?;

    let epoch_second_local = match encoding {
        DateTimeEncoding::Legacy => seconds,
        DateTimeEncoding::Utc => seconds
            .checked_add(i64::from(tz_offset_seconds))
            .ok_or_else(seconds_out_of_bounds)?,
    };
    Ok(DateTime {
        epoch_second_local,
        nanos,
        tz_offset_seconds,
    })
}

pub(super) fn write_date_time<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    dt: &DateTime,
    encoding: DateTimeEncoding,
) -> Result<(), PackstreamError> {
    let seconds = match encoding {
        DateTimeEncoding::Legacy => dt.epoch_second_local,
        DateTimeEncoding::Utc => dt
            .epoch_second_local
            .checked_sub(i64::from(dt.tz_offset_seconds))
            .ok_or_else(seconds_out_of_bounds)?,
    };
    buf.write_int(seconds)
        .write_int(i64::from(dt.nanos))
        .write_int(i64::from(dt.tz_offset_seconds));
    Ok(())
}

pub(super) fn read_date_time_zone_id<B: Buf>(
    buf: &mut PackstreamBuf<B>,
    encoding: DateTimeEncoding,
) -> Result<DateTimeZoneId, PackstreamError> {
    let seconds = buf.read_int()?;
    let nanos = read_i32_field(buf, "nanoseconds")?;
    let zone_id = parse_zone(&buf.read_string(None)?)?;

    let epoch_second_local = match encoding {
        DateTimeEncoding::Legacy => seconds,
        DateTimeEncoding::Utc => {
            let offset = zone_offset_at(zone_id, seconds)?;
            seconds
                .checked_add(i64::from(offset))
                .ok_or_else(seconds_out_of_bounds)?
        }
    };
    Ok(DateTimeZoneId {
        epoch_second_local,
        nanos,
        zone_id,
    })
}

pub(super) fn write_date_time_zone_id<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    dt: &DateTimeZoneId,
    encoding: DateTimeEncoding,
) -> Result<(), PackstreamError> {
    let seconds = match encoding {
        DateTimeEncoding::Legacy => dt.epoch_second_local,
        DateTimeEncoding::Utc => {
            let local =
                naive_from_epoch(dt.epoch_second_local, 0).ok_or_else(seconds_out_of_bounds)?;
            let instant = dt.zone_id.from_local_datetime(&local).earliest().ok_or_else(|| {
                PackstreamError::illegal_field_caused_by(
                    "seconds",
                    format!("Local time does not exist in zone {}", dt.zone_id.name()),
                    StructFieldCause::NonexistentLocalTime(dt.epoch_second_local),
                )
            })?;
            epoch_of_naive(&instant.naive_utc())
        }
    };
    buf.write_int(seconds)
        .write_int(i64::from(dt.nanos))
        .write_string(dt.zone_id.name())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    fn fields(write: impl FnOnce(&mut PackstreamBuf)) -> PackstreamBuf {
        let mut buf = PackstreamBuf::alloc_unpooled();
        write(&mut buf);
        buf
    }

    fn assert_out_of_bounds(err: PackstreamError, expected_field: &str) {
        match err {
            PackstreamError::IllegalStructArgument {
                field,
                message,
                cause,
            } => {
                assert_eq!(field, expected_field);
                assert_eq!(message, "Value is out of bounds");
                assert!(cause.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn duration_fields_are_not_cross_validated() {
        let mut buf = fields(|b| {
            b.write_int(-1).write_int(400).write_int(i64::MAX).write_int(-5);
        });
        assert_eq!(
            read_duration(&mut buf).unwrap(),
            Duration {
                months: -1,
                days: 400,
                seconds: i64::MAX,
                nanoseconds: -5
            }
        );
    }

    #[test]
    fn time_offset_must_fit_i32() {
        let mut buf = fields(|b| {
            b.write_int(0).write_int(i64::from(i32::MIN) - 1);
        });
        assert_out_of_bounds(read_time(&mut buf).unwrap_err(), "tz_offset_seconds");
    }

    #[test]
    fn date_time_nanos_must_fit_i32() {
        let mut buf = fields(|b| {
            b.write_int(0)
                .write_int(i64::from(i32::MAX) + 1)
                .write_int(0);
        });
        let err = read_date_time(&mut buf, DateTimeEncoding::Legacy).unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal value for field \"nanoseconds\": Value is out of bounds"
        );
        assert_out_of_bounds(err, "nanoseconds");
    }

    #[test]
    fn date_time_offset_must_fit_i32() {
        let mut buf = fields(|b| {
            b.write_int(0).write_int(0).write_int(i64::from(i32::MAX) + 1);
        });
        let err = read_date_time(&mut buf, DateTimeEncoding::Legacy).unwrap_err();
        assert_out_of_bounds(err, "tz_offset_seconds");
    }

    #[test]
    fn utc_date_time_adds_offset() {
        let mut buf = fields(|b| {
            b.write_int(-2600).write_int(7).write_int(3600);
        });
        assert_eq!(
            read_date_time(&mut buf, DateTimeEncoding::Utc).unwrap(),
            DateTime {
                epoch_second_local: 1000,
                nanos: 7,
                tz_offset_seconds: 3600
            }
        );
    }

    #[test]
    fn utc_date_time_overflow() {
        let mut buf = fields(|b| {
            b.write_int(i64::MAX).write_int(0).write_int(1);
        });
        let err = read_date_time(&mut buf, DateTimeEncoding::Utc).unwrap_err();
        assert_out_of_bounds(err, "seconds");
    }

    #[test]
    fn zone_id_must_be_known() {
        let mut buf = fields(|b| {
            b.write_int(0).write_int(0).write_string("Mars/Olympus_Mons").unwrap();
        });
        let err = read_date_time_zone_id(&mut buf, DateTimeEncoding::Legacy).unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal value for field \"tz_id\": Illegal zone identifier: \"Mars/Olympus_Mons\""
        );
        assert_eq!(
            err.source().unwrap().to_string(),
            "unknown time zone: Mars/Olympus_Mons"
        );
    }

    #[test]
    fn zone_id_nanos_must_fit_i32() {
        let mut buf = fields(|b| {
            b.write_int(0)
                .write_int(-i64::from(i32::MAX) - 2)
                .write_string("UTC")
                .unwrap();
        });
        let err = read_date_time_zone_id(&mut buf, DateTimeEncoding::Legacy).unwrap_err();
        assert_out_of_bounds(err, "nanoseconds");
    }

    #[test]
    fn utc_zone_id_uses_offset_in_effect() {
        // 2020-01-15T12:00Z is winter time (+01:00) in Stockholm.
        let winter = 1_579_089_600;
        let mut buf = fields(|b| {
            b.write_int(winter).write_int(0).write_string("Europe/Stockholm").unwrap();
        });
        let dt = read_date_time_zone_id(&mut buf, DateTimeEncoding::Utc).unwrap();
        assert_eq!(dt.epoch_second_local, winter + 3600);
        assert_eq!(dt.zone_id, Tz::Europe__Stockholm);
    }

    #[test]
    fn zone_id_field_must_be_a_string() {
        let mut buf = fields(|b| {
            b.write_int(0).write_int(0).write_int(0);
        });
        assert!(matches!(
            read_date_time_zone_id(&mut buf, DateTimeEncoding::Legacy),
            Err(PackstreamError::UnexpectedType { .. })
        ));
    }
}
