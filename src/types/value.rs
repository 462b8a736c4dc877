//! Dynamically typed PackStream values.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use chrono_tz::Tz;

use super::crs::Crs;

/// Map with string keys, as decoded from a PackStream map.
pub type ValueMap = HashMap<String, Value>;

/// Any value that can appear in a PackStream stream, including the native
/// spatial and temporal structs.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Bytes),
    List(Vec<Value>),
    Map(ValueMap),
    // Spatial
    Point2D(Point2D),
    Point3D(Point3D),
    // Temporal
    Duration(Duration),
    Date(Date),
    LocalTime(LocalTime),
    Time(Time),
    LocalDateTime(LocalDateTime),
    DateTime(DateTime),
    DateTimeZoneId(DateTimeZoneId),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// True for the variants written as PackStream structs.
    pub fn is_struct(&self) -> bool {
        !matches!(
            self,
            Self::Null
                | Self::Boolean(_)
                | Self::Integer(_)
                | Self::Float(_)
                | Self::String(_)
                | Self::Bytes(_)
                | Self::List(_)
                | Self::Map(_)
        )
    }
}

// -- Spatial structures --

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub crs: Crs,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub crs: Crs,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// -- Temporal structures --

/// Calendar amount; the components are independent and never normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    /// Days since 1970-01-01, may be negative.
    pub epoch_day: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalTime {
    pub nanos_of_day: i64,
}

/// Time of day at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Time {
    pub nanos_of_day: i64,
    pub tz_offset_seconds: i32,
}

/// Date and time without any zone.
///
/// `epoch_second_local` counts seconds from 1970-01-01T00:00 on the local
/// wall clock, not a UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalDateTime {
    pub epoch_second_local: i64,
    pub nanos: i64,
}

/// Date and time at a fixed UTC offset.
///
/// `epoch_second_local` is the wall-clock reading at that offset; the UTC
/// instant is `epoch_second_local - tz_offset_seconds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    pub epoch_second_local: i64,
    pub nanos: i32,
    pub tz_offset_seconds: i32,
}

/// Date and time in a named zone, stored as the local wall-clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeZoneId {
    pub epoch_second_local: i64,
    pub nanos: i32,
    pub zone_id: Tz,
}

// -- Convenience conversions --

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(b))
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<ValueMap> for Value {
    fn from(m: ValueMap) -> Self {
        Self::Map(m)
    }
}

macro_rules! struct_value_from {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$ty(v)
                }
            }
        )*
    };
}

struct_value_from!(
    Point2D,
    Point3D,
    Duration,
    Date,
    LocalTime,
    Time,
    LocalDateTime,
    DateTime,
    DateTimeZoneId,
);

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Point2D(p) => write!(f, "point({}, {}, {})", p.crs.code(), p.x, p.y),
            Self::Point3D(p) => {
                write!(f, "point({}, {}, {}, {})", p.crs.code(), p.x, p.y, p.z)
            }
            Self::Duration(d) => write!(
                f,
                "duration({}m {}d {}s {}ns)",
                d.months, d.days, d.seconds, d.nanoseconds
            ),
            Self::Date(d) => write!(f, "date({})", d.epoch_day),
            Self::LocalTime(t) => write!(f, "localtime({})", t.nanos_of_day),
            Self::Time(t) => write!(f, "time({}, {})", t.nanos_of_day, t.tz_offset_seconds),
            Self::LocalDateTime(dt) => {
                write!(f, "localdatetime({}, {})", dt.epoch_second_local, dt.nanos)
            }
            Self::DateTime(dt) => write!(
                f,
                "datetime({}, {}, {})",
                dt.epoch_second_local, dt.nanos, dt.tz_offset_seconds
            ),
            Self::DateTimeZoneId(dt) => write!(
                f,
                "datetime({}, {}, {})",
                dt.epoch_second_local,
                dt.nanos,
                dt.zone_id.name()
            ),
        }
    }
}
