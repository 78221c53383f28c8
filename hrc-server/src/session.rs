//! Coaching session state
//!
//! Everything that changes while the coach runs lives here, behind a single
//! lock: the loaded trace, playback position, active persona, latest
//! advisories, the placeholder delta, and the arbitrator.

use crate::arbitrator::Arbitrator;
use crate::event_log::EventLogEntry;
use crate::hot_path::BackendKind;
use crate::replay::{PlaybackInfo, PlaybackState, Tick};
use hrc_core::advisory::{ColdAdvisory, HotAdvisory};
use hrc_core::model::{RaceTrace, TelemetrySample};
use hrc_core::persona::PersonaId;
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    #[error("No trace loaded")]
    NoTrace,
}

pub struct Session {
    trace: Option<Arc<RaceTrace>>,
    playback: PlaybackState,
    persona: PersonaId,
    hot: HotAdvisory,
    cold: Option<ColdAdvisory>,
    delta: f64,
    arbitrator: Arbitrator,
}

/// A tick together with the data its evaluations need
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub tick: Tick,
    pub sample: TelemetrySample,
    pub persona: PersonaId,
}

impl Session {
    pub fn new(arbitrator: Arbitrator, persona: PersonaId) -> Self {
        Self {
            trace: None,
            playback: PlaybackState::new(),
            persona,
            hot: HotAdvisory::loading(),
            cold: None,
            delta: 0.0,
            arbitrator,
        }
    }

    pub fn trace(&self) -> Option<&Arc<RaceTrace>> {
        self.trace.as_ref()
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    pub fn persona(&self) -> PersonaId {
        self.persona
    }

    pub fn set_persona(&mut self, persona: PersonaId) {
        self.persona = persona;
    }

    pub fn hot(&self) -> HotAdvisory {
        self.hot
    }

    pub fn cold(&self) -> Option<&ColdAdvisory> {
        self.cold.as_ref()
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn arbitrator(&self) -> &Arbitrator {
        &self.arbitrator
    }

    pub fn arbitrator_mut(&mut self) -> &mut Arbitrator {
        &mut self.arbitrator
    }

    /// Sample at the playback position, or the parked placeholder
    pub fn current_sample(&self) -> TelemetrySample {
        self.trace
            .as_ref()
            .and_then(|t| t.sample(self.playback.tick_index()).copied())
            .unwrap_or_else(TelemetrySample::idle)
    }

    /// Swap in a new trace and start over from its first sample
    pub fn load(&mut self, trace: Arc<RaceTrace>) {
        self.trace = Some(trace);
        self.playback.reset();
        self.delta = 0.0;
        self.arbitrator.reset();
        self.arbitrator.system("System ready: waiting for start");
    }

    pub fn play(&mut self) -> Result<bool, PlaybackError> {
        match &self.trace {
            Some(trace) if !trace.is_empty() => Ok(self.playback.play()),
            _ => Err(PlaybackError::NoTrace),
        }
    }

    pub fn pause(&mut self) {
        self.playback.pause();
    }

    /// Advance playback one step and capture what the engines need
    pub fn advance(&mut self) -> Option<TickContext> {
        let trace = self.trace.as_ref()?;
        let tick = self.playback.advance(trace.len())?;
        let sample = *trace.sample(tick.index)?;

        self.delta += (rand::thread_rng().gen::<f64>() - 0.45) * 0.1;

        Some(TickContext {
            tick,
            sample,
            persona: self.persona,
        })
    }

    /// Probing finished; the engine is ready to evaluate
    pub fn backend_ready(&mut self, on_device: bool) {
        self.hot = HotAdvisory::ready();
        self.arbitrator.announce_hot(self.hot);
        self.arbitrator.system(if on_device {
            "On-device model ready"
        } else {
            "On-device model not found (simulation)"
        });
    }

    pub fn apply_hot(&mut self, advisory: HotAdvisory, speed: f64) {
        self.hot = advisory;
        self.arbitrator.on_hot(advisory, speed, self.persona);
    }

    /// `persona` is the one captured when the request was dispatched
    pub fn apply_cold(&mut self, advisory: ColdAdvisory, persona: PersonaId) {
        self.cold = Some(advisory.clone());
        self.arbitrator.on_cold(advisory, persona);
    }

    pub fn snapshot(&self, backend: BackendKind, cold_processing: bool) -> SessionSnapshot {
        SessionSnapshot {
            trace_id: self.trace.as_ref().map(|t| t.trace_id().to_string()),
            playback: self
                .playback
                .info(self.trace.as_ref().map(|t| t.len()).unwrap_or(0)),
            sample: self.current_sample(),
            hot: self.hot,
            cold: self.cold.clone(),
            cold_processing,
            persona: self.persona,
            audio_enabled: self.arbitrator.audio_enabled(),
            backend,
            delta: self.delta,
            log: self.arbitrator.log().snapshot(),
        }
    }
}

/// Serializable view of the session for the API
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub trace_id: Option<String>,
    pub playback: PlaybackInfo,
    pub sample: TelemetrySample,
    pub hot: HotAdvisory,
    pub cold: Option<ColdAdvisory>,
    pub cold_processing: bool,
    pub persona: PersonaId,
    pub audio_enabled: bool,
    pub backend: BackendKind,
    pub delta: f64,
    pub log: Vec<EventLogEntry>,
}
