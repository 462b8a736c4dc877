//! Error types for the PackStream codec.

use crate::packstream::marker::{Type, TypeMarker};
use crate::types::Crs;

/// Errors that can occur while reading or writing PackStream values.
#[derive(Debug, thiserror::Error)]
pub enum PackstreamError {
    #[error("unexpected type: expected {expected} but got {actual}")]
    UnexpectedType { expected: Type, actual: Type },

    #[error("expected marker {expected_marker} ({expected}), got {actual_marker} ({actual})")]
    UnexpectedTypeMarker {
        expected: Type,
        actual: Type,
        expected_marker: TypeMarker,
        actual_marker: TypeMarker,
    },

    #[error("value of length {actual} exceeds limit of {limit}")]
    LimitExceeded { limit: u64, actual: u64 },

    #[error("values nested deeper than {limit} levels")]
    DepthExceeded { limit: usize },

    #[error("unexpected struct with tag 0x{tag:02X} and {length} fields")]
    UnexpectedStruct { length: u32, tag: u8 },

    #[error("illegal value for field \"{field}\": {message}")]
    IllegalStructArgument {
        field: &'static str,
        message: String,
        #[source]
        cause: Option<StructFieldCause>,
    },

    #[error("illegal struct size: expected {expected} fields but got {actual}")]
    IllegalStructSize { expected: u32, actual: u32 },

    #[error("illegal struct: {0}")]
    IllegalStruct(String),

    #[error("{0}")]
    IllegalArgument(String),

    #[error("need {needed} bytes but only {remaining} remaining")]
    EndOfBuffer { needed: usize, remaining: usize },

    #[error("invalid UTF-8 string: {0}")]
    InvalidString(#[from] std::string::FromUtf8Error),

    #[error("duplicate map key: \"{0}\"")]
    DuplicateMapKey(String),

    #[error("unknown PackStream marker: 0x{0:02X}")]
    UnknownMarker(u8),
}

impl PackstreamError {
    /// Builds an `IllegalStructArgument` without a cause.
    pub fn illegal_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::IllegalStructArgument {
            field,
            message: message.into(),
            cause: None,
        }
    }

    /// Builds an `IllegalStructArgument` wrapping a semantic cause.
    pub fn illegal_field_caused_by(
        field: &'static str,
        message: impl Into<String>,
        cause: StructFieldCause,
    ) -> Self {
        Self::IllegalStructArgument {
            field,
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub(crate) fn unexpected_type(expected: Type, actual: TypeMarker) -> Self {
        Self::UnexpectedType {
            expected,
            actual: actual.type_of(),
        }
    }

    pub(crate) fn unexpected_marker(expected: TypeMarker, actual: TypeMarker) -> Self {
        Self::UnexpectedTypeMarker {
            expected: expected.type_of(),
            actual: actual.type_of(),
            expected_marker: expected,
            actual_marker: actual,
        }
    }
}

/// Underlying reason a struct field failed semantic validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StructFieldCause {
    #[error("unknown coordinate reference system code: {0}")]
    UnknownCrs(i64),

    #[error("{crs} expects {expected} coordinates but {actual} were given")]
    DimensionMismatch {
        crs: Crs,
        expected: usize,
        actual: usize,
    },

    #[error("unknown time zone: {0}")]
    UnknownZone(String),

    #[error("local date-time {0} does not exist in the given time zone")]
    NonexistentLocalTime(i64),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn unexpected_marker_carries_both_types() {
        let err = PackstreamError::unexpected_marker(TypeMarker::Int8, TypeMarker::String8);
        match &err {
            PackstreamError::UnexpectedTypeMarker {
                expected,
                actual,
                expected_marker,
                actual_marker,
            } => {
                assert_eq!(*expected, Type::Int);
                assert_eq!(*actual, Type::String);
                assert_eq!(*expected_marker, TypeMarker::Int8);
                assert_eq!(*actual_marker, TypeMarker::String8);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "expected marker INT8 (INT), got STRING8 (STRING)"
        );
    }

    #[test]
    fn illegal_field_exposes_cause() {
        let err = PackstreamError::illegal_field_caused_by(
            "crs",
            "Illegal CRS code: 1",
            StructFieldCause::UnknownCrs(1),
        );
        assert_eq!(err.to_string(), "illegal value for field \"crs\": Illegal CRS code: 1");
        let source = err.source().expect("cause should be exposed");
        assert_eq!(source.to_string(), "unknown coordinate reference system code: 1");

        let err = PackstreamError::illegal_field("nanoseconds", "Value is out of bounds");
        assert!(err.source().is_none());
    }

    #[test]
    fn limit_exceeded_display() {
        let err = PackstreamError::LimitExceeded {
            limit: 2_147_483_647,
            actual: 4_294_967_295,
        };
        assert!(err.to_string().contains("4294967295"));
    }

    #[test]
    fn depth_exceeded_display() {
        let err = PackstreamError::DepthExceeded { limit: 64 };
        assert_eq!(err.to_string(), "values nested deeper than 64 levels");
    }
}
