//! CSV trace ingestion
//!
//! Turns the text of a logger CSV export into an immutable [`RaceTrace`]:
//! - header columns are located by substring match
//! - speed is converted from km/h to mph
//! - GPS positions are projected into the map square `[5,95] x [5,95]`
//! - a decimated outline of the track is built for display

use crate::coordinates::parse_coordinate;
use hrc_core::model::{GeoBounds, MapPoint, RaceTrace, TelemetrySample, TrackPath};
use hrc_core::units::{kmh_to_mph, MAP_CENTER, MAP_EXTENT, MAP_MAX, MAP_MIN};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Keep every Nth sample in the track outline
const PATH_STRIDE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("CSV has no header row")]
    MissingHeader,

    #[error("CSV has no data rows after the header")]
    NoRows,
}

/// Column positions resolved from the header row
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct ColumnMap {
    speed: Option<usize>,
    rpm: Option<usize>,
    lateral_g: Option<usize>,
    longitudinal_g: Option<usize>,
    brake_pressure: Option<usize>,
    throttle: Option<usize>,
    steering: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &str) -> Self {
        let headers: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |needles: &[&str]| {
            headers
                .iter()
                .position(|h| needles.iter().any(|needle| h.contains(needle)))
        };

        Self {
            speed: find(&["Speed (km/h)"]),
            rpm: find(&["Engine Speed", "rpm"]),
            lateral_g: find(&["Lateral acceleration"]),
            longitudinal_g: find(&["Longitudinal acceleration"]),
            brake_pressure: find(&["Brake Pressure"]),
            throttle: find(&["Throttle"]),
            steering: find(&["Steering"]),
            latitude: find(&["Latitude"]),
            longitude: find(&["Longitude"]),
        }
    }
}

fn cell<'a>(cols: &[&'a str], idx: Option<usize>) -> &'a str {
    idx.and_then(|i| cols.get(i).copied()).unwrap_or("")
}

/// Unmatched columns, missing cells and unparseable numbers all read as 0
fn numeric(cols: &[&str], idx: Option<usize>) -> f64 {
    cell(cols, idx)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse CSV text into a trace.
///
/// Fails without producing anything when there is no header or no data row,
/// so callers never see a partial trace.
pub fn parse_trace(text: &str) -> Result<RaceTrace, IngestError> {
    let mut lines = text.lines();
    let header = lines
        .next()
        .filter(|h| !h.trim().is_empty())
        .ok_or(IngestError::MissingHeader)?;
    let columns = ColumnMap::from_header(header);

    let mut samples = Vec::new();
    let mut bounds = GeoBounds::empty();
    let mut has_fix = false;

    for (offset, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split(',').collect();

        let latitude = parse_coordinate(cell(&cols, columns.latitude));
        let longitude = parse_coordinate(cell(&cols, columns.longitude));

        // A latitude of exactly 0 means "no fix" and stays out of the box
        if latitude != 0.0 {
            bounds.include(latitude, longitude);
            has_fix = true;
        }

        samples.push(TelemetrySample {
            index: offset + 1,
            speed: kmh_to_mph(numeric(&cols, columns.speed)),
            rpm: numeric(&cols, columns.rpm),
            lateral_g: numeric(&cols, columns.lateral_g),
            longitudinal_g: numeric(&cols, columns.longitudinal_g),
            brake_pressure: numeric(&cols, columns.brake_pressure),
            throttle: numeric(&cols, columns.throttle),
            steering_angle: numeric(&cols, columns.steering),
            latitude,
            longitude,
            map_x: MAP_CENTER,
            map_y: MAP_CENTER,
        });
    }

    if samples.is_empty() {
        return Err(IngestError::NoRows);
    }

    let bounds = has_fix.then_some(bounds);
    if let Some(b) = bounds.filter(GeoBounds::is_projectable) {
        for sample in &mut samples {
            let (x, y) = project(&b, sample.latitude, sample.longitude);
            sample.map_x = x;
            sample.map_y = y;
        }
    }

    let path = build_track_path(&samples);
    let trace_id = trace_id(text, samples.len());

    tracing::info!(
        "Ingested trace {} ({} samples, gps={})",
        trace_id,
        samples.len(),
        bounds.map(|b| b.is_projectable()).unwrap_or(false)
    );

    Ok(RaceTrace::new(trace_id, samples, path, bounds))
}

/// Project a fix into the map square, north up
pub fn project(bounds: &GeoBounds, latitude: f64, longitude: f64) -> (f64, f64) {
    let span = MAP_MAX - MAP_MIN;
    let x = (longitude - bounds.min_lon) / bounds.lon_range() * span + MAP_MIN;
    let y = MAP_EXTENT - ((latitude - bounds.min_lat) / bounds.lat_range() * span + MAP_MIN);
    // Rows without a fix sit outside the box; pin them to its edge
    (x.clamp(MAP_MIN, MAP_MAX), y.clamp(MAP_MIN, MAP_MAX))
}

/// Decimate the samples into a display outline: every 5th point plus the
/// last one, as `M x y L x y ...` with two decimals.
pub fn build_track_path(samples: &[TelemetrySample]) -> TrackPath {
    let last = samples.len().saturating_sub(1);
    let points: Vec<MapPoint> = samples
        .iter()
        .enumerate()
        .filter(|(i, _)| i % PATH_STRIDE == 0 || *i == last)
        .map(|(_, s)| MapPoint {
            x: s.map_x,
            y: s.map_y,
        })
        .collect();

    let svg = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let cmd = if i == 0 { "M" } else { "L" };
            format!("{} {:.2} {:.2}", cmd, p.x, p.y)
        })
        .collect::<Vec<_>>()
        .join(" ");

    TrackPath { points, svg }
}

/// Loads since process start; keeps ids distinct when the same file is reloaded
static LOAD_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Trace ID: a content fingerprint followed by the load sequence number.
///
/// The fingerprint only has to agree within one process.
fn trace_id(text: &str, sample_count: usize) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    sample_count.hash(&mut hasher);
    let load = LOAD_SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1;
    format!("{:016x}-{}", hasher.finish(), load)
}
