//! Registry for the built-in spatial and temporal structs.
//!
//! [`NativeStructRegistry`] maps struct tags to [`NativeCodec`]s on the read
//! side and [`Value`] variants to codecs on the write side. The two zoned
//! date-time kinds exist in two wire encodings, selected once per registry
//! through [`DateTimeEncoding`].

mod point;
mod temporal;

use bytes::{Buf, BufMut};

use crate::error::PackstreamError;
use crate::packstream::{PackstreamBuf, StructHeader, StructReader, StructRegistry, StructWriter};
use crate::types::{Value, tag};

/// Wire encoding of the zoned date-time structs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DateTimeEncoding {
    /// Tags `0x46`/`0x66`; the seconds field holds local epoch seconds.
    #[default]
    Legacy,
    /// Tags `0x49`/`0x69`; the seconds field holds UTC epoch seconds.
    Utc,
}

/// The struct kinds this registry understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeStruct {
    Point2D,
    Point3D,
    Duration,
    Date,
    LocalTime,
    Time,
    LocalDateTime,
    DateTime,
    DateTimeZoneId,
}

impl NativeStruct {
    pub const ALL: [NativeStruct; 9] = [
        NativeStruct::Point2D,
        NativeStruct::Point3D,
        NativeStruct::Duration,
        NativeStruct::Date,
        NativeStruct::LocalTime,
        NativeStruct::Time,
        NativeStruct::LocalDateTime,
        NativeStruct::DateTime,
        NativeStruct::DateTimeZoneId,
    ];

    pub const fn tag(self, encoding: DateTimeEncoding) -> u8 {
        match (self, encoding) {
            (Self::Point2D, _) => tag::POINT_2D,
            (Self::Point3D, _) => tag::POINT_3D,
            (Self::Duration, _) => tag::DURATION,
            (Self::Date, _) => tag::DATE,
            (Self::LocalTime, _) => tag::LOCAL_TIME,
            (Self::Time, _) => tag::TIME,
            (Self::LocalDateTime, _) => tag::LOCAL_DATE_TIME,
            (Self::DateTime, DateTimeEncoding::Legacy) => tag::DATE_TIME_LEGACY,
            (Self::DateTime, DateTimeEncoding::Utc) => tag::DATE_TIME,
            (Self::DateTimeZoneId, DateTimeEncoding::Legacy) => tag::DATE_TIME_ZONE_ID_LEGACY,
            (Self::DateTimeZoneId, DateTimeEncoding::Utc) => tag::DATE_TIME_ZONE_ID,
        }
    }

    pub const fn field_count(self) -> u32 {
        match self {
            Self::Date | Self::LocalTime => 1,
            Self::Time | Self::LocalDateTime => 2,
            Self::Point2D | Self::DateTime | Self::DateTimeZoneId => 3,
            Self::Point3D | Self::Duration => 4,
        }
    }

    /// The kind a value is written as, or `None` for non-struct values.
    pub fn of(value: &Value) -> Option<NativeStruct> {
        Some(match value {
            Value::Point2D(_) => Self::Point2D,
            Value::Point3D(_) => Self::Point3D,
            Value::Duration(_) => Self::Duration,
            Value::Date(_) => Self::Date,
            Value::LocalTime(_) => Self::LocalTime,
            Value::Time(_) => Self::Time,
            Value::LocalDateTime(_) => Self::LocalDateTime,
            Value::DateTime(_) => Self::DateTime,
            Value::DateTimeZoneId(_) => Self::DateTimeZoneId,
            _ => return None,
        })
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Reads and writes one native struct kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeCodec {
    kind: NativeStruct,
    encoding: DateTimeEncoding,
}

impl NativeCodec {
    pub fn kind(&self) -> NativeStruct {
        self.kind
    }
}

impl<Ctx> StructReader<Ctx, Value> for NativeCodec {
    fn expected_length(&self) -> Option<u32> {
        Some(self.kind.field_count())
    }

    fn read<B: Buf>(
        &self,
        _ctx: &Ctx,
        buf: &mut PackstreamBuf<B>,
        _header: StructHeader,
    ) -> Result<Value, PackstreamError> {
        match self.kind {
            NativeStruct::Point2D => point::read_point(buf, 2),
            NativeStruct::Point3D => point::read_point(buf, 3),
            NativeStruct::Duration => temporal::read_duration(buf).map(Value::Duration),
            NativeStruct::Date => temporal::read_date(buf).map(Value::Date),
            NativeStruct::LocalTime => temporal::read_local_time(buf).map(Value::LocalTime),
            NativeStruct::Time => temporal::read_time(buf).map(Value::Time),
            NativeStruct::LocalDateTime => {
                temporal::read_local_date_time(buf).map(Value::LocalDateTime)
            }
            NativeStruct::DateTime => {
                temporal::read_date_time(buf, self.encoding).map(Value::DateTime)
            }
            NativeStruct::DateTimeZoneId => {
                temporal::read_date_time_zone_id(buf, self.encoding).map(Value::DateTimeZoneId)
            }
        }
    }
}

impl<Ctx> StructWriter<Ctx, Value> for NativeCodec {
    fn tag(&self, _payload: &Value) -> u8 {
        self.kind.tag(self.encoding)
    }

    fn length(&self, _payload: &Value) -> u32 {
        self.kind.field_count()
    }

    fn write<B: BufMut>(
        &self,
        _ctx: &Ctx,
        buf: &mut PackstreamBuf<B>,
        payload: &Value,
    ) -> Result<(), PackstreamError> {
        match (self.kind, payload) {
            (NativeStruct::Point2D, Value::Point2D(p)) => point::write_point2d(buf, p),
            (NativeStruct::Point3D, Value::Point3D(p)) => point::write_point3d(buf, p),
            (NativeStruct::Duration, Value::Duration(d)) => temporal::write_duration(buf, d),
            (NativeStruct::Date, Value::Date(d)) => temporal::write_date(buf, d),
            (NativeStruct::LocalTime, Value::LocalTime(t)) => temporal::write_local_time(buf, t),
            (NativeStruct::Time, Value::Time(t)) => temporal::write_time(buf, t),
            (NativeStruct::LocalDateTime, Value::LocalDateTime(dt)) => {
                temporal::write_local_date_time(buf, dt)
            }
            (NativeStruct::DateTime, Value::DateTime(dt)) => {
                temporal::write_date_time(buf, dt, self.encoding)
            }
            (NativeStruct::DateTimeZoneId, Value::DateTimeZoneId(dt)) => {
                temporal::write_date_time_zone_id(buf, dt, self.encoding)
            }
            (kind, other) => Err(PackstreamError::IllegalStruct(format!(
                "{kind:?} writer cannot encode {other:?}"
            ))),
        }
    }
}

/// Lookup tables for every [`NativeStruct`] under one [`DateTimeEncoding`].
///
/// Built once and then only read, so a single registry can be shared freely
/// between threads.
#[derive(Debug, Clone)]
pub struct NativeStructRegistry {
    encoding: DateTimeEncoding,
    by_tag: [Option<NativeCodec>; 256],
    by_kind: [NativeCodec; 9],
}

impl NativeStructRegistry {
    pub fn new(encoding: DateTimeEncoding) -> Self {
        let by_kind = NativeStruct::ALL.map(|kind| NativeCodec { kind, encoding });
        let mut by_tag = [None; 256];
        for codec in by_kind {
            by_tag[usize::from(codec.kind.tag(encoding))] = Some(codec);
        }
        tracing::debug!(?encoding, kinds = by_kind.len(), "built native struct registry");
        Self {
            encoding,
            by_tag,
            by_kind,
        }
    }

    pub fn encoding(&self) -> DateTimeEncoding {
        self.encoding
    }

    pub fn codec(&self, kind: NativeStruct) -> &NativeCodec {
        &self.by_kind[kind.index()]
    }
}

impl Default for NativeStructRegistry {
    fn default() -> Self {
        Self::new(DateTimeEncoding::default())
    }
}

impl<Ctx> StructRegistry<Ctx, Value> for NativeStructRegistry {
    type Reader = NativeCodec;
    type Writer = NativeCodec;

    fn reader(&self, header: &StructHeader) -> Option<&NativeCodec> {
        self.by_tag[usize::from(header.tag)].as_ref()
    }

    fn writer(&self, payload: &Value) -> Option<&NativeCodec> {
        NativeStruct::of(payload).map(|kind| self.codec(kind))
    }
}
