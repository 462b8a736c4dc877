//! A pure-Rust PackStream codec.
//!
//! PackStream is the binary value format spoken by Bolt-compatible graph
//! databases. This crate implements the format itself and the built-in
//! spatial and temporal structs, without any of the transport around it.
//!
//! # Architecture
//!
//! - **`packstream`** — Marker grammar, the [`PackstreamBuf`] cursor, typed
//!   reads and writes, and the struct registry extension point
//! - **`types`** — Dynamic [`Value`]s and the native struct types
//! - **`native`** — Registry decoding and encoding the native structs
//! - **`error`** — The [`PackstreamError`] returned by every fallible operation
//!
//! # Example
//!
//! ```
//! use boltr_packstream::{NativeStructRegistry, PackstreamBuf, ReadLimits, Value};
//! use boltr_packstream::types::Date;
//!
//! let registry = NativeStructRegistry::default();
//! let mut buf = PackstreamBuf::alloc_unpooled();
//! let value = Value::List(vec![Value::from("day"), Date { epoch_day: 19_782 }.into()]);
//! buf.write_value(&(), &registry, &value)?;
//!
//! let decoded = buf.read_value(&(), &registry, &ReadLimits::default())?;
//! assert_eq!(decoded, value);
//! # Ok::<(), boltr_packstream::PackstreamError>(())
//! ```

pub mod error;
pub mod native;
pub mod packstream;
pub mod types;

pub use error::{PackstreamError, StructFieldCause};
pub use native::{DateTimeEncoding, NativeStruct, NativeStructRegistry};
pub use packstream::{PackstreamBuf, ReadLimits, StructHeader, Type, TypeMarker};
pub use types::Value;
