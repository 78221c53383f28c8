//! Hot-path advisory engine
//!
//! Classifies a telemetry sample into one urgent racing command. The backend
//! is chosen once at startup: an on-device model session when one can be
//! opened in time, otherwise a rule-based heuristic.

use hrc_core::advisory::{HotAction, HotAdvisory};
use hrc_core::backend::{Availability, OnDeviceModel, OnDeviceSession, SessionOptions};
use hrc_core::model::TelemetrySample;
use hrc_core::persona::SUPER_AJ;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_HEURISTIC_DELAY: Duration = Duration::from_millis(25);

const COMMAND_DIRECTIVE: &str =
    "Output ONE word racing commands: STABILIZE, TRAIL_BRAKE, THRESHOLD, PUSH, or MAINTAIN.";

pub enum HotBackend {
    OnDevice(Box<dyn OnDeviceSession>),
    Heuristic,
}

impl HotBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            HotBackend::OnDevice(_) => BackendKind::OnDevice,
            HotBackend::Heuristic => BackendKind::Heuristic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Probing,
    OnDevice,
    Heuristic,
}

/// Instruction attached to the on-device session
pub fn system_instruction() -> String {
    format!("{}\n{}", SUPER_AJ.prompt_template, COMMAND_DIRECTIVE)
}

/// JSON schema every on-device answer must satisfy
pub fn response_schema() -> Value {
    let vocabulary: Vec<&str> = HotAction::VOCABULARY.iter().map(|a| a.as_str()).collect();
    json!({
        "type": "object",
        "properties": {
            "action": { "type": "string", "enum": vocabulary }
        },
        "required": ["action"]
    })
}

pub fn build_prompt(sample: &TelemetrySample) -> String {
    format!(
        "Speed:{:.0} LatG:{:.2} Brake:{:.0} Throttle:{:.0}\n\
         Respond in JSON format: {{ \"action\": \"<COMMAND>\" }}",
        sample.speed, sample.lateral_g, sample.brake_pressure, sample.throttle
    )
}

/// Read the `action` field of a model answer
///
/// Anything unreadable or outside the vocabulary is a model error.
pub fn parse_action(raw: &str) -> HotAction {
    serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(|v| v.get("action").and_then(Value::as_str).map(str::to_owned))
        .and_then(|word| HotAction::from_model_output(&word))
        .unwrap_or(HotAction::NanoErr)
}

/// Rule-based fallback; first match wins
pub fn heuristic(sample: &TelemetrySample) -> HotAction {
    let lat = sample.lateral_g.abs();
    if lat > 1.3 {
        HotAction::Stabilize
    } else if sample.brake_pressure > 40.0 && lat > 0.5 {
        HotAction::TrailBrake
    } else if sample.throttle > 90.0 {
        HotAction::Push
    } else if sample.longitudinal_g < -0.8 {
        HotAction::Threshold
    } else {
        HotAction::Maintain
    }
}

pub struct HotEngine {
    backend: OnceLock<HotBackend>,
    heuristic_delay: Duration,
}

impl HotEngine {
    pub fn new(heuristic_delay: Duration) -> Self {
        Self {
            backend: OnceLock::new(),
            heuristic_delay,
        }
    }

    pub fn kind(&self) -> BackendKind {
        self.backend
            .get()
            .map(HotBackend::kind)
            .unwrap_or(BackendKind::Probing)
    }

    /// Fix the backend. Only the first call has any effect.
    pub fn install(&self, backend: HotBackend) -> BackendKind {
        if self.backend.set(backend).is_err() {
            warn!("Hot backend already decided, ignoring");
        }
        self.kind()
    }

    /// Two-phase probe of the on-device model, bounded by `timeout`
    pub async fn probe(&self, model: &dyn OnDeviceModel, timeout: Duration) -> BackendKind {
        let attempt = async {
            match model.availability().await {
                Availability::Available => {
                    let options = SessionOptions {
                        system_instruction: system_instruction(),
                        languages: vec!["en".to_string()],
                    };
                    model.create_session(options).await.map(Some)
                }
                other => {
                    info!("On-device model {} is {:?}", model.name(), other);
                    Ok(None)
                }
            }
        };

        let backend = match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(Some(session))) => HotBackend::OnDevice(session),
            Ok(Ok(None)) => HotBackend::Heuristic,
            Ok(Err(e)) => {
                warn!("Could not open on-device session: {}", e);
                HotBackend::Heuristic
            }
            Err(_) => {
                warn!("On-device probe timed out after {:?}", timeout);
                HotBackend::Heuristic
            }
        };

        self.install(backend)
    }

    /// Classify one sample. `None` until a backend has been decided.
    pub async fn evaluate(&self, sample: &TelemetrySample) -> Option<HotAdvisory> {
        let backend = self.backend.get()?;
        let started = Instant::now();

        let action = match backend {
            HotBackend::OnDevice(session) => {
                match session.prompt(&build_prompt(sample), &response_schema()).await {
                    Ok(raw) => parse_action(&raw),
                    Err(e) => {
                        warn!("On-device inference failed: {}", e);
                        HotAction::NanoErr
                    }
                }
            }
            HotBackend::Heuristic => {
                tokio::time::sleep(self.heuristic_delay).await;
                heuristic(sample)
            }
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        debug!("Hot path: {} in {:.1}ms", action, latency_ms);

        Some(HotAdvisory::evaluated(action, latency_ms))
    }
}
