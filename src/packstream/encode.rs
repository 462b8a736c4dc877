//! PackStream encoding: typed writes on a [`PackstreamBuf`].
//!
//! Every generic write picks the smallest marker able to represent the value.
//! The width-specific writers (`write_int16`, `write_string8`, ...) emit
//! exactly the marker they are named after and fail if the value does not fit.

use bytes::BufMut;

use super::buf::PackstreamBuf;
use super::marker::{self, LengthPrefix, TypeMarker};
use super::structure::{StructHeader, StructRegistry, StructWriter};
use crate::error::PackstreamError;
use crate::types::Value;

/// Largest element count a list or map may declare.
pub const MAX_COLLECTION_LENGTH: u64 = i32::MAX as u64;

fn length_of(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

impl<B: BufMut> PackstreamBuf<B> {
    // -- Markers --

    pub fn write_marker_byte(&mut self, byte: u8) -> &mut Self {
        self.write_u8(byte)
    }

    /// Writes a marker that carries no length.
    pub fn write_marker(&mut self, marker: TypeMarker) -> Result<&mut Self, PackstreamError> {
        if marker.has_length_prefix() {
            return Err(PackstreamError::IllegalArgument(format!(
                "Type {marker} requires a length"
            )));
        }
        if marker == TypeMarker::Reserved {
            return Err(PackstreamError::IllegalArgument(
                "Type RESERVED cannot be written".into(),
            ));
        }
        Ok(self.write_marker_byte(marker.value()))
    }

    /// Writes a length-carrying marker followed by its length prefix.
    ///
    /// Nibble markers pack the length into the marker byte itself.
    pub fn write_marker_with_length(
        &mut self,
        marker: TypeMarker,
        length: i64,
    ) -> Result<&mut Self, PackstreamError> {
        let Some(prefix) = marker.length_prefix() else {
            return Err(PackstreamError::IllegalArgument(format!(
                "Type {marker} does not provide length"
            )));
        };
        if length < 0 {
            return Err(PackstreamError::IllegalArgument(format!(
                "Type {marker} cannot store negative length {length}"
            )));
        }
        let length = length as u64;
        if !prefix.can_encode(length) {
            return Err(PackstreamError::IllegalArgument(format!(
                "Type {marker} cannot store value of length {length} (limit is {})",
                prefix.max_value()
            )));
        }

        if prefix == LengthPrefix::Nibble {
            return Ok(self.write_marker_byte(marker::pack_nibble(marker.value(), length as u8)));
        }
        self.write_marker_byte(marker.value());
        prefix.write_to(self.inner_mut(), length)?;
        Ok(self)
    }

    /// Writes the first marker in `markers` able to hold `length`.
    ///
    /// `markers` must be ordered from smallest to largest capacity.
    pub fn write_marker_from(
        &mut self,
        markers: &[TypeMarker],
        length: i64,
    ) -> Result<&mut Self, PackstreamError> {
        if markers.is_empty() {
            return Err(PackstreamError::IllegalArgument(
                "Marker collection cannot be empty".into(),
            ));
        }
        if length < 0 {
            return Err(PackstreamError::IllegalArgument(format!(
                "Length {length} cannot be negative"
            )));
        }
        if let Some(marker) = markers
            .iter()
            .copied()
            .find(|m| m.can_encode_length(length as u64))
        {
            return self.write_marker_with_length(marker, length);
        }

        let max_lengths = markers
            .iter()
            .filter_map(|m| m.length_prefix().map(|p| format!("{} ({m})", p.max_value())))
            .collect::<Vec<_>>()
            .join(", ");
        Err(PackstreamError::IllegalArgument(format!(
            "Length {length} exceeds supported maximum lengths of {max_lengths}"
        )))
    }

    // -- Scalars --

    pub fn write_null(&mut self) -> &mut Self {
        self.write_marker_byte(marker::NULL)
    }

    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_marker_byte(if value { marker::TRUE } else { marker::FALSE })
    }

    /// Writes an integer using the smallest possible PackStream representation.
    pub fn write_int(&mut self, value: i64) -> &mut Self {
        if (marker::TINY_INT_MIN..=marker::TINY_INT_MAX).contains(&value) {
            self.write_marker_byte(value as u8)
        } else if (marker::INT8_MIN..=marker::INT8_MAX).contains(&value) {
            self.write_int8(value as i8)
        } else if (marker::INT16_MIN..=marker::INT16_MAX).contains(&value) {
            self.write_int16(value as i16)
        } else if (marker::INT32_MIN..=marker::INT32_MAX).contains(&value) {
            self.write_int32(value as i32)
        } else {
            self.write_int64(value)
        }
    }

    pub fn write_tiny_int(&mut self, value: i8) -> Result<&mut Self, PackstreamError> {
        if i64::from(value) < marker::TINY_INT_MIN {
            return Err(PackstreamError::IllegalArgument(format!(
                "Value is out of type bounds: {value}"
            )));
        }
        Ok(self.write_marker_byte(value as u8))
    }

    pub fn write_int8(&mut self, value: i8) -> &mut Self {
        self.write_marker_byte(marker::INT_8).write_i8(value)
    }

    pub fn write_int16(&mut self, value: i16) -> &mut Self {
        self.write_marker_byte(marker::INT_16).write_i16(value)
    }

    pub fn write_int32(&mut self, value: i32) -> &mut Self {
        self.write_marker_byte(marker::INT_32).write_i32(value)
    }

    pub fn write_int64(&mut self, value: i64) -> &mut Self {
        self.write_marker_byte(marker::INT_64).write_i64(value)
    }

    pub fn write_float(&mut self, value: f64) -> &mut Self {
        self.write_marker_byte(marker::FLOAT_64).write_f64(value)
    }

    // -- Bytes --

    pub fn write_bytes(&mut self, value: &[u8]) -> Result<&mut Self, PackstreamError> {
        self.write_marker_from(&TypeMarker::BYTES_MARKERS, length_of(value.len()))?;
        Ok(self.write_slice(value))
    }

    pub fn write_bytes8(&mut self, value: &[u8]) -> Result<&mut Self, PackstreamError> {
        self.write_sized(TypeMarker::Bytes8, value)
    }

    pub fn write_bytes16(&mut self, value: &[u8]) -> Result<&mut Self, PackstreamError> {
        self.write_sized(TypeMarker::Bytes16, value)
    }

    pub fn write_bytes32(&mut self, value: &[u8]) -> Result<&mut Self, PackstreamError> {
        self.write_sized(TypeMarker::Bytes32, value)
    }

    // -- Strings (size = UTF-8 byte length, not char count) --

    pub fn write_string(&mut self, value: &str) -> Result<&mut Self, PackstreamError> {
        self.write_marker_from(&TypeMarker::STRING_MARKERS, length_of(value.len()))?;
        Ok(self.write_slice(value.as_bytes()))
    }

    pub fn write_tiny_string(&mut self, value: &str) -> Result<&mut Self, PackstreamError> {
        self.write_sized(TypeMarker::TinyString, value.as_bytes())
    }

    pub fn write_string8(&mut self, value: &str) -> Result<&mut Self, PackstreamError> {
        self.write_sized(TypeMarker::String8, value.as_bytes())
    }

    pub fn write_string16(&mut self, value: &str) -> Result<&mut Self, PackstreamError> {
        self.write_sized(TypeMarker::String16, value.as_bytes())
    }

    pub fn write_string32(&mut self, value: &str) -> Result<&mut Self, PackstreamError> {
        self.write_sized(TypeMarker::String32, value.as_bytes())
    }

    fn write_sized(
        &mut self,
        marker: TypeMarker,
        payload: &[u8],
    ) -> Result<&mut Self, PackstreamError> {
        self.write_marker_with_length(marker, length_of(payload.len()))?;
        Ok(self.write_slice(payload))
    }

    // -- Lists --

    pub fn write_list_header(&mut self, size: usize) -> Result<&mut Self, PackstreamError> {
        self.write_marker_from(&TypeMarker::LIST_MARKERS, length_of(size))
    }

    /// Writes a list, invoking `writer` once per element in iteration order.
    pub fn write_list<I, F>(&mut self, items: I, writer: F) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(&mut Self, I::Item) -> Result<(), PackstreamError>,
    {
        let items = items.into_iter();
        self.write_list_header(items.len())?;
        self.write_elements(items, writer)
    }

    pub fn write_tiny_list<I, F>(
        &mut self,
        items: I,
        writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(&mut Self, I::Item) -> Result<(), PackstreamError>,
    {
        self.write_list_as(TypeMarker::TinyList, items, writer)
    }

    pub fn write_list8<I, F>(&mut self, items: I, writer: F) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(&mut Self, I::Item) -> Result<(), PackstreamError>,
    {
        self.write_list_as(TypeMarker::List8, items, writer)
    }

    pub fn write_list16<I, F>(&mut self, items: I, writer: F) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(&mut Self, I::Item) -> Result<(), PackstreamError>,
    {
        self.write_list_as(TypeMarker::List16, items, writer)
    }

    pub fn write_list32<I, F>(&mut self, items: I, writer: F) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(&mut Self, I::Item) -> Result<(), PackstreamError>,
    {
        self.write_list_as(TypeMarker::List32, items, writer)
    }

    fn write_list_as<I, F>(
        &mut self,
        marker: TypeMarker,
        items: I,
        writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(&mut Self, I::Item) -> Result<(), PackstreamError>,
    {
        let items = items.into_iter();
        self.write_marker_with_length(marker, length_of(items.len()))?;
        self.write_elements(items, writer)
    }

    fn write_elements<T, F>(
        &mut self,
        items: impl Iterator<Item = T>,
        mut writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        F: FnMut(&mut Self, T) -> Result<(), PackstreamError>,
    {
        for item in items {
            writer(self, item)?;
        }
        Ok(self)
    }

    // -- Maps --

    pub fn write_map_header(&mut self, length: usize) -> Result<&mut Self, PackstreamError> {
        if length as u64 > MAX_COLLECTION_LENGTH {
            return Err(PackstreamError::IllegalArgument(format!(
                "length exceeds limit of {MAX_COLLECTION_LENGTH}"
            )));
        }
        self.write_marker_from(&TypeMarker::MAP_MARKERS, length_of(length))
    }

    /// Writes a map, invoking `writer` once per value after writing its key.
    ///
    /// Entries are emitted in the iteration order of `entries`; the wire
    /// format imposes no order of its own.
    pub fn write_map<I, K, V, F>(
        &mut self,
        entries: I,
        writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
        K: AsRef<str>,
        F: FnMut(&mut Self, V) -> Result<(), PackstreamError>,
    {
        let entries = entries.into_iter();
        self.write_map_header(entries.len())?;
        self.write_entries(entries, writer)
    }

    pub fn write_tiny_map<I, K, V, F>(
        &mut self,
        entries: I,
        writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
        K: AsRef<str>,
        F: FnMut(&mut Self, V) -> Result<(), PackstreamError>,
    {
        self.write_map_as(TypeMarker::TinyMap, entries, writer)
    }

    pub fn write_map8<I, K, V, F>(
        &mut self,
        entries: I,
        writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
        K: AsRef<str>,
        F: FnMut(&mut Self, V) -> Result<(), PackstreamError>,
    {
        self.write_map_as(TypeMarker::Map8, entries, writer)
    }

    pub fn write_map16<I, K, V, F>(
        &mut self,
        entries: I,
        writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
        K: AsRef<str>,
        F: FnMut(&mut Self, V) -> Result<(), PackstreamError>,
    {
        self.write_map_as(TypeMarker::Map16, entries, writer)
    }

    pub fn write_map32<I, K, V, F>(
        &mut self,
        entries: I,
        writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
        K: AsRef<str>,
        F: FnMut(&mut Self, V) -> Result<(), PackstreamError>,
    {
        self.write_map_as(TypeMarker::Map32, entries, writer)
    }

    fn write_map_as<I, K, V, F>(
        &mut self,
        marker: TypeMarker,
        entries: I,
        writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        I: IntoIterator<Item = (K, V)>,
        I::IntoIter: ExactSizeIterator,
        K: AsRef<str>,
        F: FnMut(&mut Self, V) -> Result<(), PackstreamError>,
    {
        let entries = entries.into_iter();
        self.write_marker_with_length(marker, length_of(entries.len()))?;
        self.write_entries(entries, writer)
    }

    fn write_entries<K, V, F>(
        &mut self,
        entries: impl Iterator<Item = (K, V)>,
        mut writer: F,
    ) -> Result<&mut Self, PackstreamError>
    where
        K: AsRef<str>,
        F: FnMut(&mut Self, V) -> Result<(), PackstreamError>,
    {
        for (key, value) in entries {
            self.write_string(key.as_ref())?;
            writer(self, value)?;
        }
        Ok(self)
    }

    // -- Structs --

    /// Writes a struct header using the smallest struct marker.
    pub fn write_struct_header(
        &mut self,
        header: &StructHeader,
    ) -> Result<&mut Self, PackstreamError> {
        self.write_marker_from(&TypeMarker::STRUCT_MARKERS, i64::from(header.length))?;
        Ok(self.write_u8(header.tag))
    }

    /// Writes `payload` through the writer `registry` selects for it.
    pub fn write_struct<Ctx, S, R>(
        &mut self,
        ctx: &Ctx,
        registry: &R,
        payload: &S,
    ) -> Result<&mut Self, PackstreamError>
    where
        S: std::fmt::Debug,
        R: StructRegistry<Ctx, S>,
    {
        let writer = registry
            .writer(payload)
            .ok_or_else(|| PackstreamError::IllegalStruct(format!("{payload:?}")))?;
        let header = StructHeader::new(writer.length(payload), writer.tag(payload));
        self.write_struct_header(&header)?;
        writer.write(ctx, self, payload)?;
        Ok(self)
    }

    // -- Dynamic values --

    /// Writes any [`Value`], delegating struct variants to `registry`.
    pub fn write_value<Ctx, R>(
        &mut self,
        ctx: &Ctx,
        registry: &R,
        value: &Value,
    ) -> Result<&mut Self, PackstreamError>
    where
        R: StructRegistry<Ctx, Value>,
    {
        match value {
            Value::Null => Ok(self.write_null()),
            Value::Boolean(b) => Ok(self.write_bool(*b)),
            Value::Integer(i) => Ok(self.write_int(*i)),
            Value::Float(f) => Ok(self.write_float(*f)),
            Value::Bytes(b) => self.write_bytes(b),
            Value::String(s) => self.write_string(s),
            Value::List(items) => {
                self.write_list(items, |buf, item| buf.write_value(ctx, registry, item).map(|_| ()))
            }
            Value::Map(map) => {
                self.write_map(map, |buf, item| buf.write_value(ctx, registry, item).map(|_| ()))
            }
            _ => self.write_struct(ctx, registry, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use bytes::BytesMut;

    use super::*;

    fn written(f: impl FnOnce(&mut PackstreamBuf) -> &mut PackstreamBuf) -> BytesMut {
        let mut buf = PackstreamBuf::alloc_unpooled();
        f(&mut buf);
        buf.into_inner()
    }

    #[test]
    fn encode_null_marker() {
        assert_eq!(&written(|b| b.write_null())[..], &[0xC0]);
    }

    #[test]
    fn encode_booleans() {
        let out = written(|b| b.write_bool(true).write_bool(false));
        assert_eq!(&out[..], &[0xC3, 0xC2]);
    }

    #[test]
    fn encode_tiny_int() {
        for (value, byte) in [
            (0, 0x00),
            (1, 0x01),
            (16, 0x10),
            (127, 0x7F),
            (-1, 0xFF),
            (-16, 0xF0),
        ] {
            assert_eq!(&written(|b| b.write_int(value))[..], &[byte], "{value}");
        }
    }

    #[test]
    fn encode_int8() {
        assert_eq!(&written(|b| b.write_int(-17))[..], &[marker::INT_8, (-17i8) as u8]);
        assert_eq!(&written(|b| b.write_int(-128))[..], &[marker::INT_8, (-128i8) as u8]);
    }

    #[test]
    fn encode_int16() {
        assert_eq!(&written(|b| b.write_int(128))[..], &[marker::INT_16, 0x00, 0x80]);

        let expected = (-129i16).to_be_bytes();
        assert_eq!(
            &written(|b| b.write_int(-129))[..],
            &[marker::INT_16, expected[0], expected[1]]
        );
    }

    #[test]
    fn encode_int32() {
        let out = written(|b| b.write_int(32768));
        let expected = 32768i32.to_be_bytes();
        assert_eq!(
            &out[..],
            &[marker::INT_32, expected[0], expected[1], expected[2], expected[3]]
        );
    }

    #[test]
    fn encode_int64() {
        let val = i64::from(i32::MAX) + 1;
        let out = written(|b| b.write_int(val));
        assert_eq!(out[0], marker::INT_64);
        assert_eq!(&out[1..], &val.to_be_bytes());
    }

    #[test]
    fn tiny_int_rejects_values_below_range() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        let err = buf.write_tiny_int(-17).unwrap_err();
        assert_eq!(err.to_string(), "Value is out of type bounds: -17");
        buf.write_tiny_int(-16).unwrap();
        assert_eq!(&buf.get_ref()[..], &[0xF0]);
    }

    #[test]
    fn explicit_width_ints_keep_their_marker() {
        let out = written(|b| b.write_int8(1).write_int16(1).write_int32(1).write_int64(1));
        assert_eq!(
            &out[..],
            &[
                0xC8, 0x01, 0xC9, 0x00, 0x01, 0xCA, 0x00, 0x00, 0x00, 0x01, 0xCB, 0x00, 0x00, 0x00,
                0x00, 0x00, 0x00, 0x00, 0x01
            ]
        );
    }

    #[test]
    fn encode_float64() {
        let out = written(|b| b.write_float(1.23));
        assert_eq!(out[0], marker::FLOAT_64);
        assert_eq!(&out[1..], &1.23f64.to_be_bytes());
    }

    #[test]
    fn marker_without_length_rejects_length_markers() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        for marker in TypeMarker::ALL.into_iter().filter(|m| m.has_length_prefix()) {
            let err = buf.write_marker(marker).unwrap_err();
            assert_eq!(err.to_string(), format!("Type {marker} requires a length"));
        }
        assert!(buf.get_ref().is_empty());
    }

    #[test]
    fn marker_with_length_rejects_fixed_markers() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        for marker in TypeMarker::ALL.into_iter().filter(|m| !m.has_length_prefix()) {
            let err = buf.write_marker_with_length(marker, 15).unwrap_err();
            assert_eq!(err.to_string(), format!("Type {marker} does not provide length"));
        }
    }

    #[test]
    fn marker_with_length_rejects_oversized_lengths() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        for marker in TypeMarker::ALL.into_iter().filter(|m| m.has_length_prefix()) {
            let max = marker.length_prefix().unwrap().max_value();
            let length = max as i64 + 1;
            let err = buf.write_marker_with_length(marker, length).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Type {marker} cannot store value of length {length} (limit is {max})")
            );
        }
    }

    #[test]
    fn marker_with_length_rejects_negative_lengths() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        let err = buf.write_marker_with_length(TypeMarker::List8, -1).unwrap_err();
        assert!(matches!(err, PackstreamError::IllegalArgument(_)));
        let err = buf.write_marker_from(&TypeMarker::LIST_MARKERS, -1).unwrap_err();
        assert!(matches!(err, PackstreamError::IllegalArgument(_)));
        assert!(buf.get_ref().is_empty());
    }

    #[test]
    fn marker_from_picks_smallest_prefix() {
        for marker in TypeMarker::STRING_MARKERS {
            let max = marker.length_prefix().unwrap().max_value() as i64;
            let out = written(|b| b.write_marker_from(&TypeMarker::STRING_MARKERS, max).unwrap());
            if marker.is_nibble_marker() {
                assert_eq!(out[0], marker.value() ^ 15);
            } else {
                assert_eq!(out[0], marker.value());
            }
        }
    }

    #[test]
    fn marker_from_requires_candidates() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        let err = buf.write_marker_from(&[], 42).unwrap_err();
        assert_eq!(err.to_string(), "Marker collection cannot be empty");
    }

    #[test]
    fn marker_from_lists_every_maximum() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        let length = LengthPrefix::Uint32.max_value() as i64 + 1;
        let err = buf
            .write_marker_from(&TypeMarker::STRING_MARKERS, length)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "Length {length} exceeds supported maximum lengths of 15 (TINY_STRING), \
                 255 (STRING8), 65535 (STRING16), 4294967295 (STRING32)"
            )
        );
    }

    #[test]
    fn encode_empty_string() {
        assert_eq!(&written(|b| b.write_string("").unwrap())[..], &[0x80]);
    }

    #[test]
    fn encode_tiny_string() {
        assert_eq!(&written(|b| b.write_string("A").unwrap())[..], &[0x81, 0x41]);
    }

    #[test]
    fn encode_string_16_bytes() {
        let s = "0123456789abcdef"; // 16 bytes, exceeds tiny
        let out = written(|b| b.write_string(s).unwrap());
        assert_eq!(out[0], marker::STRING_8);
        assert_eq!(out[1], 16);
        assert_eq!(&out[2..], s.as_bytes());
    }

    #[test]
    fn string_length_counts_utf8_bytes() {
        // Five chars, ten bytes.
        let s = "ääääø";
        let out = written(|b| b.write_string(s).unwrap());
        assert_eq!(out[0], 0x80 | 10);
    }

    #[test]
    fn explicit_string_markers() {
        let out = written(|b| b.write_string16("hi").unwrap());
        assert_eq!(&out[..], &[marker::STRING_16, 0x00, 0x02, b'h', b'i']);

        let mut buf = PackstreamBuf::alloc_unpooled();
        let err = buf.write_tiny_string(&"x".repeat(16)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type TINY_STRING cannot store value of length 16 (limit is 15)"
        );
    }

    #[test]
    fn encode_bytes_data() {
        let out = written(|b| b.write_bytes(&[0xDE, 0xAD]).unwrap());
        assert_eq!(&out[..], &[marker::BYTES_8, 0x02, 0xDE, 0xAD]);

        let out = written(|b| b.write_bytes(&[]).unwrap());
        assert_eq!(&out[..], &[marker::BYTES_8, 0x00]);
    }

    #[test]
    fn bytes8_rejects_large_payloads() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        let err = buf.write_bytes8(&[0u8; 256]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Type BYTES8 cannot store value of length 256 (limit is 255)"
        );
    }

    #[test]
    fn encode_empty_list() {
        let out = written(|b| b.write_list(Vec::<i64>::new(), |_, _| Ok(())).unwrap());
        assert_eq!(&out[..], &[0x90]);
    }

    #[test]
    fn encode_tiny_list() {
        let out = written(|b| {
            b.write_list([1i64, 2, 3], |buf, i| {
                buf.write_int(i);
                Ok(())
            })
            .unwrap()
        });
        assert_eq!(&out[..], &[0x93, 0x01, 0x02, 0x03]);
    }

    #[test]
    fn list_writer_errors_propagate() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        let err = buf
            .write_list([1, 2], |_, _| {
                Err(PackstreamError::IllegalArgument("boom".into()))
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn list_uses_list8_past_nibble() {
        let out = written(|b| {
            b.write_list((0..16).collect::<Vec<i64>>(), |buf, i| {
                buf.write_int(i);
                Ok(())
            })
            .unwrap()
        });
        assert_eq!(&out[..2], &[marker::LIST_8, 16]);
    }

    #[test]
    fn encode_empty_map() {
        let out = written(|b| b.write_map(BTreeMap::<String, i64>::new(), |_, _| Ok(())).unwrap());
        assert_eq!(&out[..], &[0xA0]);
    }

    #[test]
    fn map_with_seventeen_entries_uses_map8() {
        let map: BTreeMap<String, i64> = (0..17).map(|i| (format!("k{i:02}"), i)).collect();
        let out = written(|b| {
            b.write_map(&map, |buf, v| {
                buf.write_int(*v);
                Ok(())
            })
            .unwrap()
        });
        assert_eq!(&out[..2], &[marker::MAP_8, 17]);
        // First entry: tiny string key "k00" then tiny int 0.
        assert_eq!(&out[2..7], &[0x83, b'k', b'0', b'0', 0x00]);
    }

    #[test]
    fn explicit_map_marker() {
        let out = written(|b| {
            b.write_map16([("a", true)], |buf, v| {
                buf.write_bool(v);
                Ok(())
            })
            .unwrap()
        });
        assert_eq!(&out[..], &[marker::MAP_16, 0x00, 0x01, 0x81, b'a', 0xC3]);
    }

    #[test]
    fn struct_header_uses_tiny_struct() {
        let out = written(|b| b.write_struct_header(&StructHeader::new(3, 0x58)).unwrap());
        assert_eq!(&out[..], &[0xB3, 0x58]);

        let out = written(|b| b.write_struct_header(&StructHeader::new(16, 0x42)).unwrap());
        assert_eq!(&out[..], &[marker::STRUCT_8, 16, 0x42]);
    }
}
