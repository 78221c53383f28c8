//! Demo trace that generates a synthetic logger export
//!
//! Simulates a lap around a circuit with straights, braking zones, corners,
//! and acceleration phases, and writes it out as CSV text in the same layout
//! a real data logger produces (including degrees/minutes GPS columns), so
//! the whole ingestion path runs without a recorded file.

use crate::csv_trace::{parse_trace, IngestError};
use hrc_core::model::RaceTrace;
use std::fmt::Write as _;

/// Rows per second; one row per playback tick
pub const SAMPLE_RATE_HZ: f32 = 20.0;

const GRAVITY: f32 = 9.81;
const METERS_PER_DEGREE: f64 = 111_320.0;

// =============================================================================
// Track definition: a sequence of segments that form a lap
// =============================================================================

#[derive(Clone, Copy)]
enum SegmentKind {
    Straight,
    Braking,
    Corner,
    Accel,
}

#[derive(Clone, Copy)]
struct TrackSegment {
    kind: SegmentKind,
    duration: f32,     // seconds to traverse at representative pace
    target_speed: f32, // m/s at end of segment
    steering: f32,     // peak steering angle in radians (signed: + = right)
    lateral_g: f32,    // peak lateral G
}

const fn seg(
    kind: SegmentKind,
    duration: f32,
    target_speed: f32,
    steering: f32,
    lateral_g: f32,
) -> TrackSegment {
    TrackSegment {
        kind,
        duration,
        target_speed,
        steering,
        lateral_g,
    }
}

/// ~85s lap, mix of corners and straights
fn demo_track() -> Vec<TrackSegment> {
    use SegmentKind::*;
    vec![
        // Start/finish straight
        seg(Straight, 8.0, 75.0, 0.0, 0.0),
        // T1: heavy braking into slow right-hander
        seg(Braking, 3.0, 28.0, 0.02, 0.1),
        seg(Corner, 4.0, 25.0, 0.35, 1.8),
        seg(Accel, 3.5, 55.0, 0.1, 0.4),
        seg(Straight, 4.0, 62.0, 0.0, 0.0),
        // T2: trail braking into fast left-hander
        seg(Braking, 2.0, 45.0, -0.12, -0.7),
        seg(Corner, 3.5, 42.0, -0.22, -1.2),
        seg(Accel, 3.0, 58.0, -0.05, -0.3),
        // Back straight
        seg(Straight, 10.0, 80.0, 0.0, 0.0),
        // T3: chicane
        seg(Braking, 2.5, 35.0, 0.05, 0.2),
        seg(Corner, 2.0, 32.0, 0.30, 1.6),
        seg(Corner, 2.0, 30.0, -0.32, -1.7),
        seg(Accel, 3.0, 50.0, -0.05, -0.2),
        seg(Straight, 6.0, 68.0, 0.0, 0.0),
        // T4: long sweeping right
        seg(Braking, 1.5, 52.0, 0.03, 0.1),
        seg(Corner, 5.0, 50.0, 0.18, 1.1),
        seg(Accel, 3.0, 60.0, 0.05, 0.3),
        // T5: tight hairpin left
        seg(Braking, 3.5, 22.0, -0.03, -0.1),
        seg(Corner, 4.5, 20.0, -0.42, -1.2),
        seg(Accel, 4.0, 55.0, -0.1, -0.3),
        // Run to start/finish
        seg(Straight, 6.0, 72.0, 0.0, 0.0),
    ]
}

// =============================================================================
// Interpolation state, derived from track position
// =============================================================================

struct LapState {
    speed: f32,
    throttle: f32,
    brake: f32,
    steering: f32,
    lateral_g: f32,
    longitudinal_g: f32,
    rpm: f32,
}

fn compute_lap_state(track: &[TrackSegment], lap_duration: f32, lap_time: f32) -> LapState {
    let t = lap_time % lap_duration;

    let mut elapsed = 0.0_f32;
    let mut seg_idx = 0;
    for (i, seg) in track.iter().enumerate() {
        if elapsed + seg.duration > t || i == track.len() - 1 {
            seg_idx = i;
            break;
        }
        elapsed += seg.duration;
    }

    let seg = track[seg_idx];
    let seg_t = ((t - elapsed) / seg.duration).clamp(0.0, 1.0);

    let prev_target_speed = track[(seg_idx + track.len() - 1) % track.len()].target_speed;

    let smooth_t = smoothstep(seg_t);
    let speed = lerp(prev_target_speed, seg.target_speed, smooth_t);

    let (throttle, brake) = match seg.kind {
        SegmentKind::Straight => (0.95 + 0.05 * (1.0 - seg_t), 0.0), // slight lift approaching end
        SegmentKind::Braking => (0.0, (1.0 - smooth_t * 0.3).clamp(0.0, 1.0)),
        SegmentKind::Corner => (0.2 + 0.3 * seg_t, 0.0),
        SegmentKind::Accel => (0.5 + 0.5 * smooth_t, 0.0),
    };

    // Ramp in during first half, ramp out during second half
    let envelope = if seg_t < 0.5 {
        smoothstep(seg_t * 2.0)
    } else {
        smoothstep((1.0 - seg_t) * 2.0)
    };

    let speed_rate = (seg.target_speed - prev_target_speed) / seg.duration;

    LapState {
        speed,
        throttle,
        brake,
        steering: seg.steering * envelope,
        lateral_g: seg.lateral_g * envelope,
        longitudinal_g: speed_rate / GRAVITY,
        rpm: speed_to_rpm(speed),
    }
}

fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn speed_to_rpm(speed_ms: f32) -> f32 {
    let kph = speed_ms * 3.6;
    // Lower gear = higher RPM for same speed
    let ratio = match kph {
        x if x < 40.0 => 130.0,
        x if x < 80.0 => 85.0,
        x if x < 120.0 => 60.0,
        x if x < 170.0 => 45.0,
        x if x < 230.0 => 36.0,
        _ => 30.0,
    };
    (speed_ms * ratio + 1200.0).clamp(1200.0, 8000.0)
}

/// Simple deterministic noise from a seed
fn noise(seed: f32) -> f32 {
    let x = (seed * 12.9898 + 78.233).sin() * 43_758.547;
    x - x.floor()
}

/// Small jitter centered around 0
fn jitter(seed: f32, amplitude: f32) -> f32 {
    (noise(seed) - 0.5) * 2.0 * amplitude
}

/// Format signed decimal degrees as `DD°MM.MMMM H`
fn degrees_minutes(value: f64, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let abs = value.abs();
    let degrees = abs.floor();
    let minutes = (abs - degrees) * 60.0;
    format!("{}°{:.4} {}", degrees as u32, minutes, hemisphere)
}

// =============================================================================
// DemoTrace
// =============================================================================

pub const CSV_HEADER: &str = "Time (s),Speed (km/h),Engine Speed (rpm),Lateral acceleration (g),\
Longitudinal acceleration (g),Brake Pressure (bar),Throttle (%),Steering Angle (deg),Latitude,Longitude";

/// Deterministic synthetic recording; the same settings always produce the
/// same CSV text.
pub struct DemoTrace {
    track: Vec<TrackSegment>,
    lap_duration: f32,
    laps: u32,
    origin_lat: f64,
    origin_lon: f64,
}

impl DemoTrace {
    pub fn new() -> Self {
        let track = demo_track();
        let lap_duration: f32 = track.iter().map(|s| s.duration).sum();
        Self {
            track,
            lap_duration,
            laps: 1,
            origin_lat: 40.6171,
            origin_lon: -3.5859,
        }
    }

    pub fn with_laps(mut self, laps: u32) -> Self {
        self.laps = laps.max(1);
        self
    }

    pub fn lap_duration(&self) -> f32 {
        self.lap_duration
    }

    pub fn row_count(&self) -> usize {
        (self.lap_duration * SAMPLE_RATE_HZ).round() as usize * self.laps as usize
    }

    /// Render the recording as logger CSV text
    pub fn to_csv(&self) -> String {
        let dt = 1.0 / SAMPLE_RATE_HZ;
        let mut out = String::with_capacity(self.row_count() * 96);
        out.push_str(CSV_HEADER);
        out.push('\n');

        // Dead-reckoned position in metres east/north of the origin
        let mut heading = 0.0_f64;
        let mut east = 0.0_f64;
        let mut north = 0.0_f64;

        for row in 0..self.row_count() {
            let t = row as f32 * dt;
            let n = row as f32 + 1.0;
            let state = compute_lap_state(&self.track, self.lap_duration, t);

            let speed = (state.speed + jitter(n, 0.3)).max(0.0);
            let rpm = (state.rpm + jitter(n * 1.1, 30.0)).clamp(1200.0, 8000.0);
            let throttle = (state.throttle + jitter(n * 1.2, 0.02)).clamp(0.0, 1.0);
            let brake = (state.brake + jitter(n * 1.3, 0.02)).clamp(0.0, 1.0);
            let steering = state.steering + jitter(n * 1.4, 0.005);
            let lat_g = state.lateral_g + jitter(n * 1.5, 0.05);
            let long_g = state.longitudinal_g + jitter(n * 1.6, 0.03);

            // Yaw rate from lateral acceleration: a = v * omega
            if speed > 1.0 {
                heading += f64::from(lat_g * GRAVITY / speed) * f64::from(dt);
            }
            let step = f64::from(speed * dt);
            east += step * heading.sin();
            north += step * heading.cos();

            let lat = self.origin_lat + north / METERS_PER_DEGREE;
            let lon = self.origin_lon
                + east / (METERS_PER_DEGREE * self.origin_lat.to_radians().cos());

            let _ = writeln!(
                out,
                "{:.3},{:.2},{:.0},{:.3},{:.3},{:.1},{:.1},{:.2},{},{}",
                t,
                speed * 3.6,
                rpm,
                lat_g,
                long_g,
                brake * 80.0,
                throttle * 100.0,
                steering.to_degrees(),
                degrees_minutes(lat, 'N', 'S'),
                degrees_minutes(lon, 'E', 'W'),
            );
        }

        out
    }

    /// Render and ingest in one step
    pub fn to_trace(&self) -> Result<RaceTrace, IngestError> {
        parse_trace(&self.to_csv())
    }
}

impl Default for DemoTrace {
    fn default() -> Self {
        Self::new()
    }
}
