//! PackStream binary encoding format.
//!
//! PackStream is a binary presentation format for the exchange of richly-typed
//! data. It uses big-endian byte ordering exclusively.

pub mod buf;
pub mod decode;
pub mod encode;
pub mod limits;
pub mod marker;
pub mod structure;

pub use buf::{BufferAllocator, PackstreamBuf, SizedAllocator};
pub use encode::MAX_COLLECTION_LENGTH;
pub use limits::{DEFAULT_MAX_DEPTH, ReadLimits};
pub use marker::{LengthPrefix, Type, TypeMarker};
pub use structure::{
    StructHeader, StructReader, StructRegistry, StructWriter, ensure_struct_length,
};
