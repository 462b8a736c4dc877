//! Bounds-checked cursor over a PackStream byte buffer.
//!
//! [`PackstreamBuf`] owns a single read/write cursor pair over some backing
//! storage:
//!
//! - `BytesMut`: growable, writes append at the end and reads consume from
//!   the front. Byte arrays read from it are split off without copying.
//! - `Bytes`: a reference-counted, read-only view. Several cursors may share
//!   one allocation (see [`PackstreamBuf::wrap_retained`]).
//! - `&[u8]`: a borrowed view tied to the caller's lifetime.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::PackstreamError;

/// Default capacity of freshly allocated buffers.
pub const DEFAULT_CAPACITY: usize = 256;

/// Source of fresh, empty write buffers.
pub trait BufferAllocator {
    fn allocate(&self) -> BytesMut;
}

/// Allocator handing out buffers with a fixed initial capacity.
#[derive(Debug, Clone, Copy)]
pub struct SizedAllocator {
    pub initial_capacity: usize,
}

impl Default for SizedAllocator {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl BufferAllocator for SizedAllocator {
    fn allocate(&self) -> BytesMut {
        BytesMut::with_capacity(self.initial_capacity)
    }
}

/// A PackStream cursor wrapping a byte buffer.
///
/// Typed reads are available whenever `B: Buf`, typed writes whenever
/// `B: BufMut`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackstreamBuf<B = BytesMut> {
    inner: B,
}

impl PackstreamBuf<BytesMut> {
    /// Creates an empty writable buffer obtained from `alloc`.
    pub fn alloc(alloc: &impl BufferAllocator) -> Self {
        Self::wrap(alloc.allocate())
    }

    /// Creates an empty writable buffer without going through an allocator.
    pub fn alloc_unpooled() -> Self {
        Self::wrap(BytesMut::new())
    }

    /// Freezes the written (and not yet read) bytes into a shareable buffer.
    pub fn freeze(self) -> Bytes {
        self.inner.freeze()
    }
}

impl PackstreamBuf<Bytes> {
    /// Creates a cursor sharing `source`'s storage.
    ///
    /// The allocation stays alive for as long as any cursor or any byte
    /// array read from it is alive; `source` itself is left untouched.
    pub fn wrap_retained(source: &Bytes) -> Self {
        Self::wrap(source.clone())
    }

    /// Returns a second cursor over the remaining bytes, sharing storage.
    pub fn retain(&self) -> Self {
        Self::wrap(self.inner.clone())
    }
}

impl<B> PackstreamBuf<B> {
    /// Wraps existing storage without copying it.
    pub fn wrap(inner: B) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &B {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

// -- Read primitives --

impl<B: Buf> PackstreamBuf<B> {
    pub fn remaining(&self) -> usize {
        self.inner.remaining()
    }

    pub fn has_remaining(&self) -> bool {
        self.inner.has_remaining()
    }

    pub(crate) fn ensure_remaining(&self, needed: usize) -> Result<(), PackstreamError> {
        if self.inner.remaining() < needed {
            Err(PackstreamError::EndOfBuffer {
                needed,
                remaining: self.inner.remaining(),
            })
        } else {
            Ok(())
        }
    }

    /// Returns the next `n` bytes without consuming them.
    ///
    /// The bytes must be contiguous in the backing storage, which is always
    /// the case for `BytesMut`, `Bytes`, and slices.
    pub fn peek_slice(&self, n: usize) -> Result<&[u8], PackstreamError> {
        self.ensure_remaining(n)?;
        let chunk = self.inner.chunk();
        if chunk.len() < n {
            return Err(PackstreamError::EndOfBuffer {
                needed: n,
                remaining: chunk.len(),
            });
        }
        Ok(&chunk[..n])
    }

    pub fn read_u8(&mut self) -> Result<u8, PackstreamError> {
        self.ensure_remaining(1)?;
        Ok(self.inner.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16, PackstreamError> {
        self.ensure_remaining(2)?;
        Ok(self.inner.get_u16())
    }

    pub fn read_u32(&mut self) -> Result<u32, PackstreamError> {
        self.ensure_remaining(4)?;
        Ok(self.inner.get_u32())
    }

    pub fn read_u64(&mut self) -> Result<u64, PackstreamError> {
        self.ensure_remaining(8)?;
        Ok(self.inner.get_u64())
    }

    pub fn read_i8(&mut self) -> Result<i8, PackstreamError> {
        self.ensure_remaining(1)?;
        Ok(self.inner.get_i8())
    }

    pub fn read_i16(&mut self) -> Result<i16, PackstreamError> {
        self.ensure_remaining(2)?;
        Ok(self.inner.get_i16())
    }

    pub fn read_i32(&mut self) -> Result<i32, PackstreamError> {
        self.ensure_remaining(4)?;
        Ok(self.inner.get_i32())
    }

    pub fn read_i64(&mut self) -> Result<i64, PackstreamError> {
        self.ensure_remaining(8)?;
        Ok(self.inner.get_i64())
    }

    pub fn read_f64(&mut self) -> Result<f64, PackstreamError> {
        self.ensure_remaining(8)?;
        Ok(self.inner.get_f64())
    }

    /// Takes the next `n` bytes. Zero-copy for `Bytes` and `BytesMut`.
    pub fn read_slice(&mut self, n: usize) -> Result<Bytes, PackstreamError> {
        self.ensure_remaining(n)?;
        Ok(self.inner.copy_to_bytes(n))
    }

    pub fn skip_bytes(&mut self, n: usize) -> Result<(), PackstreamError> {
        self.ensure_remaining(n)?;
        self.inner.advance(n);
        Ok(())
    }
}

// -- Write primitives --

impl<B: BufMut> PackstreamBuf<B> {
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.inner.put_u8(value);
        self
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.inner.put_u16(value);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.inner.put_u32(value);
        self
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.inner.put_u64(value);
        self
    }

    pub fn write_i8(&mut self, value: i8) -> &mut Self {
        self.inner.put_i8(value);
        self
    }

    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        self.inner.put_i16(value);
        self
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.inner.put_i32(value);
        self
    }

    pub fn write_i64(&mut self, value: i64) -> &mut Self {
        self.inner.put_i64(value);
        self
    }

    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.inner.put_f64(value);
        self
    }

    pub fn write_slice(&mut self, value: &[u8]) -> &mut Self {
        self.inner.put_slice(value);
        self
    }

    pub(crate) fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }
}

impl From<BytesMut> for PackstreamBuf<BytesMut> {
    fn from(inner: BytesMut) -> Self {
        Self::wrap(inner)
    }
}

impl From<Bytes> for PackstreamBuf<Bytes> {
    fn from(inner: Bytes) -> Self {
        Self::wrap(inner)
    }
}

impl<'a> From<&'a [u8]> for PackstreamBuf<&'a [u8]> {
    fn from(inner: &'a [u8]) -> Self {
        Self::wrap(inner)
    }
}
