//! Point2D / Point3D structs: `[crs, x, y]` and `[crs, x, y, z]`.

use bytes::{Buf, BufMut};

use crate::error::{PackstreamError, StructFieldCause};
use crate::packstream::PackstreamBuf;
use crate::types::{Crs, Point2D, Point3D, Value};

fn resolve_crs(code: i64) -> Result<Crs, PackstreamError> {
    let code = i32::try_from(code)
        .ok()
        .filter(|c| *c >= 0)
        .ok_or_else(|| PackstreamError::illegal_field("crs", "crs code exceeds valid bounds"))?;
    Crs::from_code(code).ok_or_else(|| {
        PackstreamError::illegal_field_caused_by(
            "crs",
            format!("Illegal CRS code: {code}"),
            StructFieldCause::UnknownCrs(i64::from(code)),
        )
    })
}

fn coords_mismatch(crs: Crs, coords: &[f64]) -> PackstreamError {
    let listed = ["x", "y", "z"]
        .iter()
        .zip(coords)
        .map(|(axis, value)| format!("{axis}={value}"))
        .collect::<Vec<_>>()
        .join(", ");
    PackstreamError::illegal_field_caused_by(
        "coords",
        format!("Illegal CRS/coords combination (crs={crs}, {listed})"),
        StructFieldCause::DimensionMismatch {
            crs,
            expected: crs.dimension(),
            actual: coords.len(),
        },
    )
}

/// Reads a point with `dimension` coordinates and checks it against its CRS.
pub(super) fn read_point<B: Buf>(
    buf: &mut PackstreamBuf<B>,
    dimension: usize,
) -> Result<Value, PackstreamError> {
    let crs = resolve_crs(buf.read_int()?)?;
    let mut coords = [0.0; 3];
    for coord in coords.iter_mut().take(dimension) {
        *coord = buf.read_float()?;
    }
    if crs.dimension() != dimension {
        return Err(coords_mismatch(crs, &coords[..dimension]));
    }

    let [x, y, z] = coords;
    Ok(if dimension == 2 {
        Value::Point2D(Point2D { crs, x, y })
    } else {
        Value::Point3D(Point3D { crs, x, y, z })
    })
}

pub(super) fn write_point2d<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    point: &Point2D,
) -> Result<(), PackstreamError> {
    if point.crs.dimension() != 2 {
        return Err(coords_mismatch(point.crs, &[point.x, point.y]));
    }
    buf.write_int(i64::from(point.crs.code()))
        .write_float(point.x)
        .write_float(point.y);
    Ok(())
}

pub(super) fn write_point3d<B: BufMut>(
    buf: &mut PackstreamBuf<B>,
    point: &Point3D,
) -> Result<(), PackstreamError> {
    if point.crs.dimension() != 3 {
        return Err(coords_mismatch(point.crs, &[point.x, point.y, point.z]));
    }
    buf.write_int(i64::from(point.crs.code()))
        .write_float(point.x)
        .write_float(point.y)
        .write_float(point.z);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::packstream::StructHeader;
    use crate::types::tag;

    fn point_fields(code: i64, coords: &[f64]) -> PackstreamBuf {
        let mut buf = PackstreamBuf::alloc_unpooled();
        buf.write_int(code);
        for c in coords {
            buf.write_float(*c);
        }
        buf
    }

    #[test]
    fn reads_each_crs() {
        for crs in Crs::ALL {
            let coords = [1.0, 2.0, 3.0];
            let mut buf = point_fields(i64::from(crs.code()), &coords[..crs.dimension()]);
            let value = read_point(&mut buf, crs.dimension()).unwrap();
            match value {
                Value::Point2D(p) => assert_eq!((p.crs, p.x, p.y), (crs, 1.0, 2.0)),
                Value::Point3D(p) => assert_eq!((p.crs, p.z), (crs, 3.0)),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn crs_code_out_of_bounds() {
        for code in [-1, i64::from(i32::MAX) + 1, i64::MIN] {
            let mut buf = point_fields(code, &[1.0, 2.0]);
            let err = read_point(&mut buf, 2).unwrap_err();
            match err {
                PackstreamError::IllegalStructArgument {
                    field,
                    ref message,
                    ref cause,
                } => {
                    assert_eq!(field, "crs");
                    assert_eq!(message, "crs code exceeds valid bounds");
                    assert!(cause.is_none());
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_crs_code() {
        let mut buf = point_fields(1234, &[1.0, 2.0]);
        let err = read_point(&mut buf, 2).unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal value for field \"crs\": Illegal CRS code: 1234"
        );
        let cause = err.source().unwrap();
        assert_eq!(
            cause.to_string(),
            "unknown coordinate reference system code: 1234"
        );
    }

    #[test]
    fn three_coordinates_for_two_dimensional_crs() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        buf.write_struct_header(&StructHeader::new(4, tag::POINT_3D))
            .unwrap()
            .write_int(4326)
            .write_float(1.0)
            .write_float(2.5)
            .write_float(3.0);
        buf.read_struct_header().unwrap();

        let err = read_point(&mut buf, 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal value for field \"coords\": \
             Illegal CRS/coords combination (crs=wgs-84 (4326), x=1, y=2.5, z=3)"
        );
        match err {
            PackstreamError::IllegalStructArgument {
                cause: Some(StructFieldCause::DimensionMismatch { crs, expected, actual }),
                ..
            } => {
                assert_eq!(crs, Crs::Wgs84);
                assert_eq!((expected, actual), (2, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn two_coordinates_for_three_dimensional_crs() {
        let mut buf = point_fields(9157, &[1.0, 2.0]);
        let err = read_point(&mut buf, 2).unwrap_err();
        assert!(err.to_string().ends_with("(crs=cartesian-3d (9157), x=1, y=2)"));
    }

    #[test]
    fn writer_rejects_mismatched_dimension() {
        let mut buf = PackstreamBuf::alloc_unpooled();
        let point = Point2D {
            crs: Crs::CartesianThreeD,
            x: 0.0,
            y: 0.0,
        };
        assert!(matches!(
            write_point2d(&mut buf, &point),
            Err(PackstreamError::IllegalStructArgument { field: "coords", .. })
        ));
        assert!(!buf.has_remaining());
    }
}
