//! Replayed telemetry data model
//!
//! Defines the TelemetrySample record produced by trace ingestion and the
//! immutable RaceTrace that owns a full recording.
//!
//! Map coordinate system: 100x100 display canvas, north-up
//! - map_x: grows eastwards (longitude)
//! - map_y: grows southwards (latitude inverted)

use crate::units::{round4, MAP_CENTER};
use serde::{Deserialize, Serialize};

/// One normalized telemetry row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Source row number (header is row 0)
    pub index: usize,

    /// Vehicle speed in mph
    #[serde(serialize_with = "round4")]
    pub speed: f64,

    /// Engine RPM
    #[serde(serialize_with = "round4")]
    pub rpm: f64,

    /// Lateral acceleration in G (signed)
    #[serde(serialize_with = "round4")]
    pub lateral_g: f64,

    /// Longitudinal acceleration in G (negative = braking)
    #[serde(serialize_with = "round4")]
    pub longitudinal_g: f64,

    /// Brake line pressure in bar
    #[serde(serialize_with = "round4")]
    pub brake_pressure: f64,

    /// Throttle position in percent (0-100)
    #[serde(serialize_with = "round4")]
    pub throttle: f64,

    /// Steering angle as recorded by the logger
    #[serde(serialize_with = "round4")]
    pub steering_angle: f64,

    /// Decimal degrees, 0 when the row had no usable fix
    pub latitude: f64,

    /// Decimal degrees, 0 when the row had no usable fix
    pub longitude: f64,

    #[serde(serialize_with = "round4")]
    pub map_x: f64,

    #[serde(serialize_with = "round4")]
    pub map_y: f64,
}

impl TelemetrySample {
    /// Placeholder sample shown while no trace is loaded: all channels at
    /// rest and the car parked at the map centre.
    pub fn idle() -> Self {
        Self {
            index: 0,
            speed: 0.0,
            rpm: 0.0,
            lateral_g: 0.0,
            longitudinal_g: 0.0,
            brake_pressure: 0.0,
            throttle: 0.0,
            steering_angle: 0.0,
            latitude: 0.0,
            longitude: 0.0,
            map_x: MAP_CENTER,
            map_y: MAP_CENTER,
        }
    }
}

/// Latitude/longitude extent of the rows that had a GPS fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    /// Start an empty box that the first included point will collapse
    pub fn empty() -> Self {
        Self {
            min_lat: 90.0,
            max_lat: -90.0,
            min_lon: 180.0,
            max_lon: -180.0,
        }
    }

    pub fn include(&mut self, lat: f64, lon: f64) {
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);
    }

    pub fn lat_range(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_range(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    /// True when the box has positive extent on both axes
    pub fn is_projectable(&self) -> bool {
        self.lat_range() > 0.0 && self.lon_range() > 0.0
    }
}

/// A point on the display canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

/// Simplified outline of the recorded track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackPath {
    /// Decimated outline points, in drawing order
    pub points: Vec<MapPoint>,

    /// The same outline as an SVG path (`M x y L x y ...`)
    pub svg: String,
}

/// A fully loaded, immutable recording
///
/// Reloading always builds a new trace; nothing mutates an existing one.
#[derive(Debug, Clone)]
pub struct RaceTrace {
    trace_id: String,
    samples: Vec<TelemetrySample>,
    path: TrackPath,
    bounds: Option<GeoBounds>,
}

impl RaceTrace {
    pub fn new(
        trace_id: String,
        samples: Vec<TelemetrySample>,
        path: TrackPath,
        bounds: Option<GeoBounds>,
    ) -> Self {
        Self {
            trace_id,
            samples,
            path,
            bounds,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample(&self, index: usize) -> Option<&TelemetrySample> {
        self.samples.get(index)
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn path(&self) -> &TrackPath {
        &self.path
    }

    pub fn bounds(&self) -> Option<&GeoBounds> {
        self.bounds.as_ref()
    }

    pub fn info(&self) -> TraceInfo {
        TraceInfo {
            trace_id: self.trace_id.clone(),
            total_samples: self.samples.len(),
            has_gps: self.bounds.map(|b| b.is_projectable()).unwrap_or(false),
            bounds: self.bounds,
            path: self.path.svg.clone(),
        }
    }
}

/// Serializable trace summary for the API
#[derive(Debug, Clone, Serialize)]
pub struct TraceInfo {
    pub trace_id: String,
    pub total_samples: usize,
    pub has_gps: bool,
    pub bounds: Option<GeoBounds>,
    pub path: String,
}
