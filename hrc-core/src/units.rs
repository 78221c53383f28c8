//! Unit conversions and track-map display units
//!
//! Telemetry speed arrives in km/h and is stored in mph. Map coordinates are
//! abstract display units on a 100x100 canvas.

/// km/h to mph factor applied at ingestion time
pub const KMH_TO_MPH: f64 = 0.621371;

/// Lower edge of the projected map square
pub const MAP_MIN: f64 = 5.0;

/// Upper edge of the projected map square
pub const MAP_MAX: f64 = 95.0;

/// Centre of the map canvas, used for samples without a usable GPS fix
pub const MAP_CENTER: f64 = 50.0;

/// Full extent of the map canvas (the y axis is inverted against it)
pub const MAP_EXTENT: f64 = 100.0;

pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh * KMH_TO_MPH
}

/// Round f64 to 4 decimal places for compact JSON serialization
pub(crate) fn round4<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((*val * 10000.0).round() / 10000.0)
}
