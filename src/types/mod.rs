//! PackStream value model and the native spatial and temporal structs.

mod convert;
mod crs;
mod value;

pub use crs::Crs;
pub use value::{
    Date, DateTime, DateTimeZoneId, Duration, LocalDateTime, LocalTime, Point2D, Point3D, Time,
    Value, ValueMap,
};

pub(crate) use convert::{epoch_of_naive, naive_from_epoch};

/// PackStream structure tag bytes for the native structs.
pub mod tag {
    pub const POINT_2D: u8 = 0x58;
    pub const POINT_3D: u8 = 0x59;
    pub const DURATION: u8 = 0x45;
    pub const DATE: u8 = 0x44;
    pub const LOCAL_TIME: u8 = 0x74;
    pub const TIME: u8 = 0x54;
    pub const LOCAL_DATE_TIME: u8 = 0x64;
    /// Offset date-time carrying local epoch seconds.
    pub const DATE_TIME_LEGACY: u8 = 0x46;
    /// Zoned date-time carrying local epoch seconds.
    pub const DATE_TIME_ZONE_ID_LEGACY: u8 = 0x66;
    /// Offset date-time carrying UTC epoch seconds.
    pub const DATE_TIME: u8 = 0x49;
    /// Zoned date-time carrying UTC epoch seconds.
    pub const DATE_TIME_ZONE_ID: u8 = 0x69;
}
