//! Struct headers and the registry extension point.
//!
//! A struct on the wire is a marker carrying its field count, a one-byte
//! tag, and then that many values. The codec itself knows nothing about what
//! a tag means; it looks tags up in a [`StructRegistry`] supplied by the
//! caller and hands the cursor to the matching [`StructReader`]. Writing goes
//! the other way: the registry picks a [`StructWriter`] for the payload, which
//! reports the tag and field count and then writes the fields.

use bytes::{Buf, BufMut};

use super::buf::PackstreamBuf;
use crate::error::PackstreamError;

/// Field count and tag read immediately after a struct marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructHeader {
    pub length: u32,
    pub tag: u8,
}

impl StructHeader {
    pub const fn new(length: u32, tag: u8) -> Self {
        Self { length, tag }
    }
}

/// Decodes the fields of one struct kind.
pub trait StructReader<Ctx, O> {
    /// Field count this reader requires. When set, the cursor rejects any
    /// header with a different length before the reader is invoked.
    fn expected_length(&self) -> Option<u32> {
        None
    }

    /// Reads the struct's fields. The header has already been consumed.
    fn read<B: Buf>(
        &self,
        ctx: &Ctx,
        buf: &mut PackstreamBuf<B>,
        header: StructHeader,
    ) -> Result<O, PackstreamError>;
}

/// Encodes one struct kind.
pub trait StructWriter<Ctx, S: ?Sized> {
    fn tag(&self, payload: &S) -> u8;

    /// Number of fields [`write`](Self::write) will emit.
    fn length(&self, payload: &S) -> u32;

    /// Writes the struct's fields. The header has already been written.
    fn write<B: BufMut>(
        &self,
        ctx: &Ctx,
        buf: &mut PackstreamBuf<B>,
        payload: &S,
    ) -> Result<(), PackstreamError>;
}

/// Read-only table of struct readers and writers.
///
/// Readers are found by header, writers by inspecting the payload. A
/// registry may hand out a writer for "null" payloads too; the cursor does
/// not treat them specially.
pub trait StructRegistry<Ctx, S> {
    type Reader: StructReader<Ctx, S>;
    type Writer: StructWriter<Ctx, S>;

    fn reader(&self, header: &StructHeader) -> Option<&Self::Reader>;

    fn writer(&self, payload: &S) -> Option<&Self::Writer>;
}

/// Fails with `IllegalStructSize` unless `header` carries `expected` fields.
pub fn ensure_struct_length(header: &StructHeader, expected: u32) -> Result<(), PackstreamError> {
    if header.length != expected {
        return Err(PackstreamError::IllegalStructSize {
            expected,
            actual: header.length,
        });
    }
    Ok(())
}
