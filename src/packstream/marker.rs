//! PackStream marker bytes, their semantic types, and length-prefix grammar.
//!
//! Every value on the wire starts with a marker byte. Some markers are fixed
//! bytes (`NULL`, `TRUE`, `INT_32`, ...), others are "nibble" markers whose
//! high four bits identify the kind and whose low four bits carry an inline
//! length of 0..=15.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::PackstreamError;

// Null
pub const NULL: u8 = 0xC0;

// Boolean
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

// Float (IEEE 754 double-precision)
pub const FLOAT_64: u8 = 0xC1;

// Integer (beyond TINY_INT range)
pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

// TINY_INT: single byte, range -16..=127
// Positive: 0x00..=0x7F (0..127)
// Negative: 0xF0..=0xFF (-16..-1)

// Bytes
pub const BYTES_8: u8 = 0xCC;
pub const BYTES_16: u8 = 0xCD;
pub const BYTES_32: u8 = 0xCE;

// String
// TINY_STRING: 0x80..=0x8F (high nibble 0x8, low = byte length 0..15)
pub const STRING_8: u8 = 0xD0;
pub const STRING_16: u8 = 0xD1;
pub const STRING_32: u8 = 0xD2;

// List
// TINY_LIST: 0x90..=0x9F (high nibble 0x9, low = item count 0..15)
pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;

// Map
// TINY_MAP: 0xA0..=0xAF (high nibble 0xA, low = entry count 0..15)
pub const MAP_8: u8 = 0xD8;
pub const MAP_16: u8 = 0xD9;
pub const MAP_32: u8 = 0xDA;

// Structure
// TINY_STRUCT: 0xB0..=0xBF (high nibble 0xB, low = field count 0..15)
pub const STRUCT_8: u8 = 0xDC;
pub const STRUCT_16: u8 = 0xDD;

// High-nibble masks for tiny types.
pub const TINY_STRING_NIBBLE: u8 = 0x80;
pub const TINY_LIST_NIBBLE: u8 = 0x90;
pub const TINY_MAP_NIBBLE: u8 = 0xA0;
pub const TINY_STRUCT_NIBBLE: u8 = 0xB0;

// Integer bounds per encoding tier.
pub const TINY_INT_MIN: i64 = -16;
pub const TINY_INT_MAX: i64 = 127;
pub const INT8_MIN: i64 = i8::MIN as i64;
pub const INT8_MAX: i64 = i8::MAX as i64;
pub const INT16_MIN: i64 = i16::MIN as i64;
pub const INT16_MAX: i64 = i16::MAX as i64;
pub const INT32_MIN: i64 = i32::MIN as i64;
pub const INT32_MAX: i64 = i32::MAX as i64;
pub const INT64_MIN: i64 = i64::MIN;
pub const INT64_MAX: i64 = i64::MAX;

const NIBBLE_MASK: u8 = 0x0F;

/// Packs an inline length into the low nibble of a tiny marker.
///
/// The caller guarantees `len <= 15`; larger values are masked.
pub const fn pack_nibble(base: u8, len: u8) -> u8 {
    base ^ (len & NIBBLE_MASK)
}

/// Splits a tiny marker byte into its base value and inline length.
pub const fn unpack_nibble(byte: u8) -> (u8, u8) {
    (byte & !NIBBLE_MASK, byte & NIBBLE_MASK)
}

/// Semantic value category a marker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    None,
    Boolean,
    Int,
    Float,
    Bytes,
    String,
    List,
    Map,
    Struct,
}

impl Type {
    pub const ALL: [Type; 9] = [
        Type::None,
        Type::Boolean,
        Type::Int,
        Type::Float,
        Type::Bytes,
        Type::String,
        Type::List,
        Type::Map,
        Type::Struct,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Boolean => "BOOLEAN",
            Self::Int => "INT",
            Self::Float => "FLOAT",
            Self::Bytes => "BYTES",
            Self::String => "STRING",
            Self::List => "LIST",
            Self::Map => "MAP",
            Self::Struct => "STRUCT",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoding of the length that follows (or is packed into) a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthPrefix {
    Nibble,
    Uint8,
    Uint16,
    Uint32,
}

impl LengthPrefix {
    /// Largest length this prefix can represent.
    pub const fn max_value(self) -> u64 {
        match self {
            Self::Nibble => 0x0F,
            Self::Uint8 => u8::MAX as u64,
            Self::Uint16 => u16::MAX as u64,
            Self::Uint32 => u32::MAX as u64,
        }
    }

    /// Number of bytes written after the marker byte.
    pub const fn width(self) -> usize {
        match self {
            Self::Nibble => 0,
            Self::Uint8 => 1,
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }

    pub const fn can_encode(self, length: u64) -> bool {
        length <= self.max_value()
    }

    /// Writes `length` as an unsigned big-endian quantity of this prefix's width.
    ///
    /// Nibble lengths live inside the marker byte, so nothing is written for them.
    /// Lengths beyond [`max_value`](Self::max_value) fail with `LimitExceeded`
    /// and leave `buf` untouched.
    pub fn write_to(
        self,
        buf: &mut (impl BufMut + ?Sized),
        length: u64,
    ) -> Result<(), PackstreamError> {
        if !self.can_encode(length) {
            return Err(PackstreamError::LimitExceeded {
                limit: self.max_value(),
                actual: length,
            });
        }
        match self {
            Self::Nibble => {}
            Self::Uint8 => buf.put_u8(length as u8),
            Self::Uint16 => buf.put_u16(length as u16),
            Self::Uint32 => buf.put_u32(length as u32),
        }
        Ok(())
    }

    /// Reads an unsigned length of this prefix's width.
    ///
    /// Always returns zero for nibble prefixes; use [`unpack_nibble`] on the
    /// marker byte instead.
    pub fn read_from(self, buf: &mut (impl Buf + ?Sized)) -> Result<u64, PackstreamError> {
        let width = self.width();
        if buf.remaining() < width {
            return Err(PackstreamError::EndOfBuffer {
                needed: width,
                remaining: buf.remaining(),
            });
        }
        Ok(match self {
            Self::Nibble => 0,
            Self::Uint8 => u64::from(buf.get_u8()),
            Self::Uint16 => u64::from(buf.get_u16()),
            Self::Uint32 => u64::from(buf.get_u32()),
        })
    }
}

/// Every distinct wire marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeMarker {
    TinyInt,
    Int8,
    Int16,
    Int32,
    Int64,
    Float64,
    Null,
    True,
    False,
    Bytes8,
    Bytes16,
    Bytes32,
    TinyString,
    String8,
    String16,
    String32,
    TinyList,
    List8,
    List16,
    List32,
    TinyMap,
    Map8,
    Map16,
    Map32,
    TinyStruct,
    Struct8,
    Struct16,
    Reserved,
}

impl TypeMarker {
    pub const ALL: [TypeMarker; 28] = [
        TypeMarker::TinyInt,
        TypeMarker::Int8,
        TypeMarker::Int16,
        TypeMarker::Int32,
        TypeMarker::Int64,
        TypeMarker::Float64,
        TypeMarker::Null,
        TypeMarker::True,
        TypeMarker::False,
        TypeMarker::Bytes8,
        TypeMarker::Bytes16,
        TypeMarker::Bytes32,
        TypeMarker::TinyString,
        TypeMarker::String8,
        TypeMarker::String16,
        TypeMarker::String32,
        TypeMarker::TinyList,
        TypeMarker::List8,
        TypeMarker::List16,
        TypeMarker::List32,
        TypeMarker::TinyMap,
        TypeMarker::Map8,
        TypeMarker::Map16,
        TypeMarker::Map32,
        TypeMarker::TinyStruct,
        TypeMarker::Struct8,
        TypeMarker::Struct16,
        TypeMarker::Reserved,
    ];

    /// Markers usable for booleans.
    pub const BOOLEAN_MARKERS: [TypeMarker; 2] = [TypeMarker::True, TypeMarker::False];

    /// Integer markers, narrowest first.
    pub const INT_MARKERS: [TypeMarker; 5] = [
        TypeMarker::TinyInt,
        TypeMarker::Int8,
        TypeMarker::Int16,
        TypeMarker::Int32,
        TypeMarker::Int64,
    ];

    /// Byte-array markers ordered by length capacity.
    pub const BYTES_MARKERS: [TypeMarker; 3] =
        [TypeMarker::Bytes8, TypeMarker::Bytes16, TypeMarker::Bytes32];

    /// String markers ordered by length capacity.
    pub const STRING_MARKERS: [TypeMarker; 4] = [
        TypeMarker::TinyString,
        TypeMarker::String8,
        TypeMarker::String16,
        TypeMarker::String32,
    ];

    pub const LIST_MARKERS: [TypeMarker; 4] = [
        TypeMarker::TinyList,
        TypeMarker::List8,
        TypeMarker::List16,
        TypeMarker::List32,
    ];

    pub const MAP_MARKERS: [TypeMarker; 4] = [
        TypeMarker::TinyMap,
        TypeMarker::Map8,
        TypeMarker::Map16,
        TypeMarker::Map32,
    ];

    pub const STRUCT_MARKERS: [TypeMarker; 3] = [
        TypeMarker::TinyStruct,
        TypeMarker::Struct8,
        TypeMarker::Struct16,
    ];

    /// Classifies a raw marker byte. Undefined bytes map to `Reserved`.
    pub const fn for_byte(byte: u8) -> TypeMarker {
        match byte {
            0x00..=0x7F | 0xF0..=0xFF => Self::TinyInt,
            0x80..=0x8F => Self::TinyString,
            0x90..=0x9F => Self::TinyList,
            0xA0..=0xAF => Self::TinyMap,
            0xB0..=0xBF => Self::TinyStruct,
            NULL => Self::Null,
            FLOAT_64 => Self::Float64,
            FALSE => Self::False,
            TRUE => Self::True,
            INT_8 => Self::Int8,
            INT_16 => Self::Int16,
            INT_32 => Self::Int32,
            INT_64 => Self::Int64,
            BYTES_8 => Self::Bytes8,
            BYTES_16 => Self::Bytes16,
            BYTES_32 => Self::Bytes32,
            STRING_8 => Self::String8,
            STRING_16 => Self::String16,
            STRING_32 => Self::String32,
            LIST_8 => Self::List8,
            LIST_16 => Self::List16,
            LIST_32 => Self::List32,
            MAP_8 => Self::Map8,
            MAP_16 => Self::Map16,
            MAP_32 => Self::Map32,
            STRUCT_8 => Self::Struct8,
            STRUCT_16 => Self::Struct16,
            _ => Self::Reserved,
        }
    }

    /// Like [`for_byte`](Self::for_byte) but rejects reserved bytes.
    pub fn classify(byte: u8) -> Result<TypeMarker, PackstreamError> {
        match Self::for_byte(byte) {
            Self::Reserved => Err(PackstreamError::UnknownMarker(byte)),
            marker => Ok(marker),
        }
    }

    /// Wire value of this marker. For nibble markers this is the base value
    /// with an empty low nibble.
    pub const fn value(self) -> u8 {
        match self {
            Self::TinyInt => 0x00,
            Self::Int8 => INT_8,
            Self::Int16 => INT_16,
            Self::Int32 => INT_32,
            Self::Int64 => INT_64,
            Self::Float64 => FLOAT_64,
            Self::Null => NULL,
            Self::True => TRUE,
            Self::False => FALSE,
            Self::Bytes8 => BYTES_8,
            Self::Bytes16 => BYTES_16,
            Self::Bytes32 => BYTES_32,
            Self::TinyString => TINY_STRING_NIBBLE,
            Self::String8 => STRING_8,
            Self::String16 => STRING_16,
            Self::String32 => STRING_32,
            Self::TinyList => TINY_LIST_NIBBLE,
            Self::List8 => LIST_8,
            Self::List16 => LIST_16,
            Self::List32 => LIST_32,
            Self::TinyMap => TINY_MAP_NIBBLE,
            Self::Map8 => MAP_8,
            Self::Map16 => MAP_16,
            Self::Map32 => MAP_32,
            Self::TinyStruct => TINY_STRUCT_NIBBLE,
            Self::Struct8 => STRUCT_8,
            Self::Struct16 => STRUCT_16,
            Self::Reserved => 0xC4,
        }
    }

    pub const fn type_of(self) -> Type {
        match self {
            Self::TinyInt | Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64 => Type::Int,
            Self::Float64 => Type::Float,
            Self::Null | Self::Reserved => Type::None,
            Self::True | Self::False => Type::Boolean,
            Self::Bytes8 | Self::Bytes16 | Self::Bytes32 => Type::Bytes,
            Self::TinyString | Self::String8 | Self::String16 | Self::String32 => Type::String,
            Self::TinyList | Self::List8 | Self::List16 | Self::List32 => Type::List,
            Self::TinyMap | Self::Map8 | Self::Map16 | Self::Map32 => Type::Map,
            Self::TinyStruct | Self::Struct8 | Self::Struct16 => Type::Struct,
        }
    }

    pub const fn length_prefix(self) -> Option<LengthPrefix> {
        match self {
            Self::TinyString | Self::TinyList | Self::TinyMap | Self::TinyStruct => {
                Some(LengthPrefix::Nibble)
            }
            Self::Bytes8 | Self::String8 | Self::List8 | Self::Map8 | Self::Struct8 => {
                Some(LengthPrefix::Uint8)
            }
            Self::Bytes16 | Self::String16 | Self::List16 | Self::Map16 | Self::Struct16 => {
                Some(LengthPrefix::Uint16)
            }
            Self::Bytes32 | Self::String32 | Self::List32 | Self::Map32 => {
                Some(LengthPrefix::Uint32)
            }
            _ => None,
        }
    }

    pub const fn has_length_prefix(self) -> bool {
        self.length_prefix().is_some()
    }

    pub const fn is_nibble_marker(self) -> bool {
        matches!(self.length_prefix(), Some(LengthPrefix::Nibble))
    }

    pub const fn can_encode_length(self, length: u64) -> bool {
        match self.length_prefix() {
            Some(prefix) => prefix.can_encode(length),
            None => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TinyInt => "TINY_INT",
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Float64 => "FLOAT64",
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Bytes8 => "BYTES8",
            Self::Bytes16 => "BYTES16",
            Self::Bytes32 => "BYTES32",
            Self::TinyString => "TINY_STRING",
            Self::String8 => "STRING8",
            Self::String16 => "STRING16",
            Self::String32 => "STRING32",
            Self::TinyList => "TINY_LIST",
            Self::List8 => "LIST8",
            Self::List16 => "LIST16",
            Self::List32 => "LIST32",
            Self::TinyMap => "TINY_MAP",
            Self::Map8 => "MAP8",
            Self::Map16 => "MAP16",
            Self::Map32 => "MAP32",
            Self::TinyStruct => "TINY_STRUCT",
            Self::Struct8 => "STRUCT8",
            Self::Struct16 => "STRUCT16",
            Self::Reserved => "RESERVED",
        }
    }
}

impl fmt::Display for TypeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_classifies_consistently() {
        for byte in 0..=u8::MAX {
            let marker = TypeMarker::for_byte(byte);
            if marker == TypeMarker::TinyInt {
                continue;
            }
            if marker.is_nibble_marker() {
                let (base, _) = unpack_nibble(byte);
                assert_eq!(base, marker.value(), "byte 0x{byte:02X}");
            } else if marker != TypeMarker::Reserved {
                assert_eq!(byte, marker.value(), "byte 0x{byte:02X}");
            }
        }
    }

    #[test]
    fn tiny_int_covers_both_ranges() {
        assert_eq!(TypeMarker::for_byte(0x00), TypeMarker::TinyInt);
        assert_eq!(TypeMarker::for_byte(0x7F), TypeMarker::TinyInt);
        assert_eq!(TypeMarker::for_byte(0xF0), TypeMarker::TinyInt);
        assert_eq!(TypeMarker::for_byte(0xFF), TypeMarker::TinyInt);
    }

    #[test]
    fn reserved_bytes() {
        for byte in [0xC4, 0xC5, 0xC6, 0xC7, 0xCF, 0xD3, 0xD7, 0xDB, 0xDE, 0xDF, 0xE0, 0xEF] {
            assert_eq!(TypeMarker::for_byte(byte), TypeMarker::Reserved);
            assert!(matches!(
                TypeMarker::classify(byte),
                Err(PackstreamError::UnknownMarker(b)) if b == byte
            ));
        }
    }

    #[test]
    fn every_marker_has_one_type() {
        for marker in TypeMarker::ALL {
            let owners = Type::ALL.iter().filter(|t| **t == marker.type_of()).count();
            assert_eq!(owners, 1, "{marker}");
        }
    }

    #[test]
    fn groups_are_ordered_by_capacity() {
        for group in [
            &TypeMarker::STRING_MARKERS[..],
            &TypeMarker::LIST_MARKERS[..],
            &TypeMarker::MAP_MARKERS[..],
            &TypeMarker::BYTES_MARKERS[..],
            &TypeMarker::STRUCT_MARKERS[..],
        ] {
            let maxima: Vec<u64> = group
                .iter()
                .map(|m| m.length_prefix().map(LengthPrefix::max_value).unwrap_or(0))
                .collect();
            assert!(maxima.windows(2).all(|w| w[0] < w[1]), "{group:?}");
        }
    }

    #[test]
    fn nibble_helpers() {
        assert_eq!(pack_nibble(TINY_STRING_NIBBLE, 5), 0x85);
        assert_eq!(pack_nibble(TINY_STRUCT_NIBBLE, 15), 0xBF);
        assert_eq!(unpack_nibble(0xA3), (TINY_MAP_NIBBLE, 3));
        assert_eq!(unpack_nibble(0x90), (TINY_LIST_NIBBLE, 0));
    }

    #[test]
    fn length_prefix_io() {
        let mut out = Vec::new();
        LengthPrefix::Uint16.write_to(&mut out, 0x1234).unwrap();
        LengthPrefix::Uint32.write_to(&mut out, u64::from(u32::MAX)).unwrap();
        LengthPrefix::Nibble.write_to(&mut out, 7).unwrap();
        assert_eq!(out, [0x12, 0x34, 0xFF, 0xFF, 0xFF, 0xFF]);

        let mut cursor = &out[..];
        assert_eq!(LengthPrefix::Uint16.read_from(&mut cursor).unwrap(), 0x1234);
        assert_eq!(
            LengthPrefix::Uint32.read_from(&mut cursor).unwrap(),
            4_294_967_295
        );
        assert!(matches!(
            LengthPrefix::Uint8.read_from(&mut cursor),
            Err(PackstreamError::EndOfBuffer { needed: 1, remaining: 0 })
        ));
    }

    #[test]
    fn length_prefix_rejects_lengths_it_cannot_hold() {
        let prefixes = [
            LengthPrefix::Nibble,
            LengthPrefix::Uint8,
            LengthPrefix::Uint16,
            LengthPrefix::Uint32,
        ];
        for prefix in prefixes {
            let mut out = Vec::new();
            let length = prefix.max_value() + 1;
            assert!(matches!(
                prefix.write_to(&mut out, length),
                Err(PackstreamError::LimitExceeded { limit, actual })
                    if limit == prefix.max_value() && actual == length
            ));
            assert!(out.is_empty(), "{prefix:?} wrote {out:?}");
        }
    }
}
