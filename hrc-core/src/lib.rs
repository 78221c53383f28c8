//! Hybrid Race Coach Core Library
//!
//! This crate provides the core data model for replayed telemetry traces,
//! the advisory vocabulary shared by the hot and cold coaching paths, the
//! persona registry, and the traits every inference/voice backend implements.

pub mod advisory;
pub mod backend;
pub mod model;
pub mod persona;
pub mod units;

pub use advisory::{ColdAdvisory, HotAction, HotAdvisory, Severity};
pub use backend::{BackendError, CloudModel, OnDeviceModel, OnDeviceSession, VoiceOutput};
pub use model::{RaceTrace, TelemetrySample};
pub use persona::{Persona, PersonaId};
