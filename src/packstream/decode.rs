//! PackStream decoding: typed reads on a [`PackstreamBuf`].
//!
//! Generic reads (`read_int`, `read_string`, `read_list`, ...) accept any
//! marker of the requested [`Type`] and fail with `UnexpectedType` otherwise.
//! Width-specific reads (`read_int16`, `read_string8`, ...) accept only their
//! own marker and fail with `UnexpectedTypeMarker`.

use std::collections::HashMap;

use bytes::{Buf, Bytes};

use super::buf::PackstreamBuf;
use super::encode::MAX_COLLECTION_LENGTH;
use super::limits::{DEFAULT_MAX_DEPTH, ReadLimits};
use super::marker::{self, LengthPrefix, Type, TypeMarker};
use super::structure::{StructHeader, StructReader, StructRegistry, ensure_struct_length};
use crate::error::PackstreamError;
use crate::types::Value;

fn check_limit(limit: Option<u64>, length: u64) -> Result<(), PackstreamError> {
    match limit {
        Some(limit) if length > limit => Err(PackstreamError::LimitExceeded {
            limit,
            actual: length,
        }),
        _ => Ok(()),
    }
}

impl<B: Buf> PackstreamBuf<B> {
    // -- Markers --

    pub fn read_marker_byte(&mut self) -> Result<u8, PackstreamError> {
        self.read_u8()
    }

    /// Consumes and classifies one marker byte. Undefined bytes yield `Reserved`.
    pub fn read_marker(&mut self) -> Result<TypeMarker, PackstreamError> {
        Ok(TypeMarker::for_byte(self.read_marker_byte()?))
    }

    /// Consumes a marker and fails unless it is `expected`.
    ///
    /// Returns the signed value for `TINY_INT`, the inline length for other
    /// nibble markers, and the raw marker byte otherwise.
    pub fn read_expected_marker(&mut self, expected: TypeMarker) -> Result<i64, PackstreamError> {
        let byte = self.read_marker_byte()?;
        let actual = TypeMarker::for_byte(byte);
        if actual != expected {
            return Err(PackstreamError::unexpected_marker(expected, actual));
        }
        Ok(match expected {
            TypeMarker::TinyInt => i64::from(byte as i8),
            m if m.is_nibble_marker() => i64::from(marker::unpack_nibble(byte).1),
            _ => i64::from(byte),
        })
    }

    /// Consumes a length-carrying marker of the given type and returns its length.
    ///
    /// The length is reported as an unsigned quantity; a `UINT32` prefix of
    /// `0xFFFFFFFF` yields `4294967295`.
    pub fn read_length_prefix_marker(
        &mut self,
        expected: Type,
        limit: Option<u64>,
    ) -> Result<u64, PackstreamError> {
        let byte = self.read_marker_byte()?;
        let marker = TypeMarker::for_byte(byte);
        if marker.type_of() != expected {
            return Err(PackstreamError::unexpected_type(expected, marker));
        }
        let length = match marker.length_prefix() {
            Some(LengthPrefix::Nibble) => u64::from(marker::unpack_nibble(byte).1),
            Some(prefix) => prefix.read_from(self.get_mut())?,
            // Every marker of a length-carrying type has a prefix.
            None => return Err(PackstreamError::unexpected_type(expected, marker)),
        };
        check_limit(limit, length)?;
        Ok(length)
    }

    /// Runs `f` against a throwaway cursor over the unread bytes.
    ///
    /// Nothing `f` reads is consumed from `self`.
    pub fn peek<R>(&self, f: impl FnOnce(&mut PackstreamBuf<&[u8]>) -> R) -> R {
        let mut view = PackstreamBuf::wrap(self.get_ref().chunk());
        f(&mut view)
    }

    pub fn peek_marker_byte(&self) -> Result<u8, PackstreamError> {
        Ok(self.peek_slice(1)?[0])
    }

    pub fn peek_marker(&self) -> Result<TypeMarker, PackstreamError> {
        Ok(TypeMarker::for_byte(self.peek_marker_byte()?))
    }

    pub fn peek_type(&self) -> Result<Type, PackstreamError> {
        Ok(self.peek_marker()?.type_of())
    }

    // -- Scalars --

    pub fn read_null(&mut self) -> Result<(), PackstreamError> {
        self.read_expected_marker(TypeMarker::Null).map(|_| ())
    }

    pub fn read_bool(&mut self) -> Result<bool, PackstreamError> {
        let marker = self.read_marker()?;
        if marker.type_of() != Type::Boolean {
            return Err(PackstreamError::unexpected_type(Type::Boolean, marker));
        }
        Ok(marker == TypeMarker::True)
    }

    /// Reads an integer of any width.
    pub fn read_int(&mut self) -> Result<i64, PackstreamError> {
        let byte = self.read_marker_byte()?;
        match TypeMarker::for_byte(byte) {
            TypeMarker::TinyInt => Ok(i64::from(byte as i8)),
            TypeMarker::Int8 => Ok(i64::from(self.read_i8()?)),
            TypeMarker::Int16 => Ok(i64::from(self.read_i16()?)),
            TypeMarker::Int32 => Ok(i64::from(self.read_i32()?)),
            TypeMarker::Int64 => self.read_i64(),
            other => Err(PackstreamError::unexpected_type(Type::Int, other)),
        }
    }

    pub fn read_tiny_int(&mut self) -> Result<i8, PackstreamError> {
        Ok(self.read_expected_marker(TypeMarker::TinyInt)? as i8)
    }

    pub fn read_int8(&mut self) -> Result<i8, PackstreamError> {
        self.read_expected_marker(TypeMarker::Int8)?;
        self.read_i8()
    }

    pub fn read_int16(&mut self) -> Result<i16, PackstreamError> {
        self.read_expected_marker(TypeMarker::Int16)?;
        self.read_i16()
    }

    pub fn read_int32(&mut self) -> Result<i32, PackstreamError> {
        self.read_expected_marker(TypeMarker::Int32)?;
        self.read_i32()
    }

    pub fn read_int64(&mut self) -> Result<i64, PackstreamError> {
        self.read_expected_marker(TypeMarker::Int64)?;
        self.read_i64()
    }

    pub fn read_float(&mut self) -> Result<f64, PackstreamError> {
        self.read_expected_marker(TypeMarker::Float64)?;
        self.read_f64()
    }

    // -- Bytes --

    pub fn read_bytes(&mut self, limit: Option<u64>) -> Result<Bytes, PackstreamError> {
        let length = self.read_length_prefix_marker(Type::Bytes, limit)?;
        self.read_bytes_value(length)
    }

    pub fn read_bytes8(&mut self) -> Result<Bytes, PackstreamError> {
        let length = self.read_sized_marker(TypeMarker::Bytes8)?;
        self.read_bytes_value(length)
    }

    pub fn read_bytes16(&mut self) -> Result<Bytes, PackstreamError> {
        let length = self.read_sized_marker(TypeMarker::Bytes16)?;
        self.read_bytes_value(length)
    }

    pub fn read_bytes32(&mut self) -> Result<Bytes, PackstreamError> {
        let length = self.read_sized_marker(TypeMarker::Bytes32)?;
        self.read_bytes_value(length)
    }

    /// Consumes exactly `marker` and its explicit length prefix.
    fn read_sized_marker(&mut self, marker: TypeMarker) -> Result<u64, PackstreamError> {
        let inline = self.read_expected_marker(marker)?;
        match marker.length_prefix() {
            Some(LengthPrefix::Nibble) => Ok(inline as u64),
            Some(prefix) => prefix.read_from(self.get_mut()),
            None => Ok(0),
        }
    }

    fn read_bytes_value(&mut self, length: u64) -> Result<Bytes, PackstreamError> {
        check_limit(Some(MAX_COLLECTION_LENGTH), length)?;
        self.read_slice(length as usize)
    }

    // -- Strings --

    pub fn read_string(&mut self, limit: Option<u64>) -> Result<String, PackstreamError> {
        let length = self.read_length_prefix_marker(Type::String, limit)?;
        self.read_string_value(length)
    }

    pub fn read_tiny_string(&mut self) -> Result<String, PackstreamError> {
        let length = self.read_sized_marker(TypeMarker::TinyString)?;
        self.read_string_value(length)
    }

    pub fn read_string8(&mut self) -> Result<String, PackstreamError> {
        let length = self.read_sized_marker(TypeMarker::String8)?;
        self.read_string_value(length)
    }

    pub fn read_string16(&mut self) -> Result<String, PackstreamError> {
        let length = self.read_sized_marker(TypeMarker::String16)?;
        self.read_string_value(length)
    }

    pub fn read_string32(&mut self) -> Result<String, PackstreamError> {
        let length = self.read_sized_marker(TypeMarker::String32)?;
        self.read_string_value(length)
    }

    fn read_string_value(&mut self, length: u64) -> Result<String, PackstreamError> {
        let data = self.read_bytes_value(length)?;
        Ok(String::from_utf8(data.to_vec())?)
    }

    // -- Lists --

    /// Reads a list, invoking `reader` once per element.
    pub fn read_list<O, F>(
        &mut self,
        limit: Option<u64>,
        reader: F,
    ) -> Result<Vec<O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_length_prefix_marker(Type::List, limit)?;
        self.read_list_value(length, reader)
    }

    pub fn read_tiny_list<O, F>(&mut self, reader: F) -> Result<Vec<O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_sized_marker(TypeMarker::TinyList)?;
        self.read_list_value(length, reader)
    }

    pub fn read_list8<O, F>(&mut self, reader: F) -> Result<Vec<O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_sized_marker(TypeMarker::List8)?;
        self.read_list_value(length, reader)
    }

    pub fn read_list16<O, F>(&mut self, reader: F) -> Result<Vec<O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_sized_marker(TypeMarker::List16)?;
        self.read_list_value(length, reader)
    }

    pub fn read_list32<O, F>(&mut self, reader: F) -> Result<Vec<O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_sized_marker(TypeMarker::List32)?;
        self.read_list_value(length, reader)
    }

    fn read_list_value<O, F>(
        &mut self,
        length: u64,
        mut reader: F,
    ) -> Result<Vec<O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        check_limit(Some(MAX_COLLECTION_LENGTH), length)?;
        // Every element takes at least one byte.
        let mut items = Vec::with_capacity((length as usize).min(self.remaining()));
        for _ in 0..length {
            items.push(reader(self)?);
        }
        Ok(items)
    }

    // -- Maps --

    /// Reads a map, decoding each key as a string and invoking `reader` for
    /// its value. Repeated keys are rejected.
    pub fn read_map<O, F>(
        &mut self,
        limit: Option<u64>,
        reader: F,
    ) -> Result<HashMap<String, O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_length_prefix_marker(Type::Map, limit)?;
        self.read_map_value(length, reader)
    }

    pub fn read_tiny_map<O, F>(&mut self, reader: F) -> Result<HashMap<String, O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_sized_marker(TypeMarker::TinyMap)?;
        self.read_map_value(length, reader)
    }

    pub fn read_map8<O, F>(&mut self, reader: F) -> Result<HashMap<String, O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_sized_marker(TypeMarker::Map8)?;
        self.read_map_value(length, reader)
    }

    pub fn read_map16<O, F>(&mut self, reader: F) -> Result<HashMap<String, O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_sized_marker(TypeMarker::Map16)?;
        self.read_map_value(length, reader)
    }

    pub fn read_map32<O, F>(&mut self, reader: F) -> Result<HashMap<String, O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        let length = self.read_sized_marker(TypeMarker::Map32)?;
        self.read_map_value(length, reader)
    }

    fn read_map_value<O, F>(
        &mut self,
        length: u64,
        mut reader: F,
    ) -> Result<HashMap<String, O>, PackstreamError>
    where
        F: FnMut(&mut Self) -> Result<O, PackstreamError>,
    {
        check_limit(Some(MAX_COLLECTION_LENGTH), length)?;
        let mut entries = HashMap::with_capacity((length as usize).min(self.remaining()));
        for _ in 0..length {
            let key = self.read_string(None)?;
            if entries.contains_key(&key) {
                return Err(PackstreamError::DuplicateMapKey(key));
            }
            let value = reader(self)?;
            entries.insert(key, value);
        }
        Ok(entries)
    }

    // -- Structs --

    pub fn read_struct_header(&mut self) -> Result<StructHeader, PackstreamError> {
        let length = self.read_length_prefix_marker(Type::Struct, None)?;
        let tag = self.read_u8()?;
        // Struct prefixes are at most 16 bits wide.
        Ok(StructHeader::new(length as u32, tag))
    }

    pub fn peek_struct_header(&self) -> Result<StructHeader, PackstreamError> {
        self.peek(|view| view.read_struct_header())
    }

    /// Reads a struct through the reader `registry` holds for its tag.
    ///
    /// Errors raised by the reader are returned unchanged.
    pub fn read_struct<Ctx, O, R>(&mut self, ctx: &Ctx, registry: &R) -> Result<O, PackstreamError>
    where
        R: StructRegistry<Ctx, O>,
    {
        let header = self.read_struct_header()?;
        let reader = registry
            .reader(&header)
            .ok_or(PackstreamError::UnexpectedStruct {
                length: header.length,
                tag: header.tag,
            })?;
        if let Some(expected) = reader.expected_length() {
            ensure_struct_length(&header, expected)?;
        }
        tracing::trace!(tag = header.tag, length = header.length, "reading struct");
        reader.read(ctx, self, header)
    }

    // -- Skipping --

    /// Consumes one complete value of the given type.
    ///
    /// Nesting is bounded by [`DEFAULT_MAX_DEPTH`].
    pub fn skip(&mut self, expected: Type) -> Result<(), PackstreamError> {
        self.skip_at(expected, 0)
    }

    /// Consumes one complete value of whatever type comes next.
    pub fn skip_value(&mut self) -> Result<(), PackstreamError> {
        self.skip_value_at(0)
    }

    fn skip_value_at(&mut self, depth: usize) -> Result<(), PackstreamError> {
        let marker = TypeMarker::classify(self.peek_marker_byte()?)?;
        self.skip_at(marker.type_of(), depth)
    }

    fn skip_at(&mut self, expected: Type, depth: usize) -> Result<(), PackstreamError> {
        match expected {
            Type::None => self.read_null(),
            Type::Boolean => self.read_bool().map(|_| ()),
            Type::Int => self.read_int().map(|_| ()),
            Type::Float => self.read_float().map(|_| ()),
            Type::Bytes | Type::String => {
                let length = self.read_length_prefix_marker(expected, None)?;
                self.skip_bytes(length as usize)
            }
            Type::List => {
                let depth = descend(depth, DEFAULT_MAX_DEPTH)?;
                let length = self.read_length_prefix_marker(Type::List, None)?;
                for _ in 0..length {
                    self.skip_value_at(depth)?;
                }
                Ok(())
            }
            Type::Map => {
                let depth = descend(depth, DEFAULT_MAX_DEPTH)?;
                let length = self.read_length_prefix_marker(Type::Map, None)?;
                for _ in 0..length {
                    self.skip_at(Type::String, depth)?;
                    self.skip_value_at(depth)?;
                }
                Ok(())
            }
            Type::Struct => {
                let depth = descend(depth, DEFAULT_MAX_DEPTH)?;
                let header = self.read_struct_header()?;
                for _ in 0..header.length {
                    self.skip_value_at(depth)?;
                }
                Ok(())
            }
        }
    }

    // -- Dynamic values --

    /// Reads any [`Value`], delegating structs to `registry`.
    ///
    /// Lists, maps and structs nested deeper than `limits.max_depth` fail
    /// with `DepthExceeded`.
    pub fn read_value<Ctx, R>(
        &mut self,
        ctx: &Ctx,
        registry: &R,
        limits: &ReadLimits,
    ) -> Result<Value, PackstreamError>
    where
        R: StructRegistry<Ctx, Value>,
    {
        self.read_value_at(ctx, registry, limits, 0)
    }

    fn read_value_at<Ctx, R>(
        &mut self,
        ctx: &Ctx,
        registry: &R,
        limits: &ReadLimits,
        depth: usize,
    ) -> Result<Value, PackstreamError>
    where
        R: StructRegistry<Ctx, Value>,
    {
        let marker = TypeMarker::classify(self.peek_marker_byte()?)?;
        match marker.type_of() {
            Type::None => self.read_null().map(|()| Value::Null),
            Type::Boolean => self.read_bool().map(Value::Boolean),
            Type::Int => self.read_int().map(Value::Integer),
            Type::Float => self.read_float().map(Value::Float),
            Type::Bytes => self.read_bytes(limits.max_bytes_length).map(Value::Bytes),
            Type::String => self.read_string(limits.max_string_length).map(Value::String),
            Type::List => {
                let depth = descend(depth, limits.max_depth)?;
                self.read_list(limits.max_list_length, |buf| {
                    buf.read_value_at(ctx, registry, limits, depth)
                })
                .map(Value::List)
            }
            Type::Map => {
                let depth = descend(depth, limits.max_depth)?;
                self.read_map(limits.max_map_entries, |buf| {
                    buf.read_value_at(ctx, registry, limits, depth)
                })
                .map(Value::Map)
            }
            Type::Struct => {
                descend(depth, limits.max_depth)?;
                self.read_struct(ctx, registry)
            }
        }
    }
}

/// Enters one more level of nesting, failing once `limit` levels are open.
fn descend(depth: usize, limit: usize) -> Result<usize, PackstreamError> {
    if depth >= limit {
        return Err(PackstreamError::DepthExceeded { limit });
    }
    Ok(depth + 1)
}
