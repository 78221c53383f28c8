//! Playback position and cadence bookkeeping
//!
//! Tracks where in the loaded trace the replay is, whether it is advancing,
//! and how many ticks the current playback run has produced. The run
//! ordinal decides which ticks feed the hot and cold engines.

use serde::Serialize;
use std::time::Duration;

/// Scheduler period
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Hot path runs on every Nth tick of a run
pub const HOT_EVERY: u64 = 2;

/// Cold path runs on every Nth tick of a run
pub const COLD_EVERY: u64 = 100;

/// One scheduler advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tick {
    /// New playback position
    pub index: usize,

    /// 1-based count of advances since the last play or reload
    pub ordinal: u64,
}

impl Tick {
    pub fn is_hot(&self) -> bool {
        self.ordinal.saturating_sub(1) % HOT_EVERY == 0
    }

    pub fn is_cold(&self) -> bool {
        self.ordinal.saturating_sub(1) % COLD_EVERY == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    tick_index: usize,
    playing: bool,
    run_ticks: u64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_index(&self) -> usize {
        self.tick_index
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Returns false when already playing
    pub fn play(&mut self) -> bool {
        if self.playing {
            return false;
        }
        self.playing = true;
        self.run_ticks = 0;
        true
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Back to the first sample for a new trace; the play flag is kept
    pub fn reset(&mut self) {
        self.tick_index = 0;
        self.run_ticks = 0;
    }

    /// Move one sample forward, wrapping at `len`
    pub fn advance(&mut self, len: usize) -> Option<Tick> {
        if !self.playing || len == 0 {
            return None;
        }

        self.tick_index = (self.tick_index + 1) % len;
        self.run_ticks += 1;

        Some(Tick {
            index: self.tick_index,
            ordinal: self.run_ticks,
        })
    }

    pub fn info(&self, total_samples: usize) -> PlaybackInfo {
        PlaybackInfo {
            tick_index: self.tick_index,
            is_playing: self.playing,
            total_samples,
        }
    }
}

/// Serializable playback info for the API
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackInfo {
    pub tick_index: usize,
    pub is_playing: bool,
    pub total_samples: usize,
}
