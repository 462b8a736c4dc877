//! Coordinate reference systems understood by the native point structs.

use std::fmt;

/// A known coordinate reference system, identified on the wire by its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Crs {
    Wgs84,
    Wgs84ThreeD,
    Cartesian,
    CartesianThreeD,
}

impl Crs {
    pub const ALL: [Crs; 4] = [Crs::Wgs84, Crs::Wgs84ThreeD, Crs::Cartesian, Crs::CartesianThreeD];

    pub const fn code(self) -> i32 {
        match self {
            Self::Wgs84 => 4326,
            Self::Wgs84ThreeD => 4979,
            Self::Cartesian => 7203,
            Self::CartesianThreeD => 9157,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Wgs84 => "wgs-84",
            Self::Wgs84ThreeD => "wgs-84-3d",
            Self::Cartesian => "cartesian",
            Self::CartesianThreeD => "cartesian-3d",
        }
    }

    /// Number of coordinates a point in this system carries.
    pub const fn dimension(self) -> usize {
        match self {
            Self::Wgs84 | Self::Cartesian => 2,
            Self::Wgs84ThreeD | Self::CartesianThreeD => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Crs> {
        Self::ALL.into_iter().find(|crs| crs.code() == code)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_code() {
        assert_eq!(Crs::from_code(4326), Some(Crs::Wgs84));
        assert_eq!(Crs::from_code(9157), Some(Crs::CartesianThreeD));
        assert_eq!(Crs::from_code(0), None);
        assert_eq!(Crs::from_code(4327), None);
    }

    #[test]
    fn dimensions() {
        assert_eq!(Crs::Wgs84.dimension(), 2);
        assert_eq!(Crs::Wgs84ThreeD.dimension(), 3);
        assert_eq!(Crs::Cartesian.dimension(), 2);
        assert_eq!(Crs::CartesianThreeD.dimension(), 3);
    }

    #[test]
    fn display_names_code() {
        assert_eq!(Crs::CartesianThreeD.to_string(), "cartesian-3d (9157)");
    }
}
