//! Cold-path advisory engine
//!
//! Asks the cloud model for one sentence of persona-styled coaching. At most
//! one request is outstanding at a time; every failure becomes an error
//! advisory instead of propagating.

use hrc_core::advisory::ColdAdvisory;
use hrc_core::backend::{BackendError, CloudModel, GenerateRequest, SafetySetting};
use hrc_core::model::TelemetrySample;
use hrc_core::persona::{Persona, PersonaId};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Fields expected inside the model's JSON answer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ColdReply {
    pub message: String,
    #[serde(default)]
    pub reasoning: String,
}

pub fn build_prompt(persona: &Persona, sample: &TelemetrySample) -> String {
    format!(
        "{}\n\n\
         CURRENT TELEMETRY:\n\
         Speed: {:.0} mph\n\
         LatG: {:.2} G\n\
         Brake Pressure: {:.0} bar\n\
         Throttle: {:.0} %\n\n\
         INSTRUCTION: Provide 1 sentence of coaching advice in JSON format.\n\
         OUTPUT SCHEMA: {{ \"message\": \"The advice\", \"reasoning\": \"Technical justification\" }}",
        persona.prompt_template,
        sample.speed,
        sample.lateral_g,
        sample.brake_pressure,
        sample.throttle
    )
}

pub fn generate_request(prompt: String) -> GenerateRequest {
    GenerateRequest {
        prompt,
        safety_settings: vec![
            SafetySetting::block_none("HARM_CATEGORY_HARASSMENT"),
            SafetySetting::block_none("HARM_CATEGORY_DANGEROUS_CONTENT"),
        ],
        json_output: true,
        max_output_tokens: MAX_OUTPUT_TOKENS,
    }
}

/// Parse the span from the first `{` to the last `}` of `text`
pub fn extract_reply(text: &str) -> Result<ColdReply, BackendError> {
    let start = text.find('{').ok_or(BackendError::MissingJson)?;
    let end = text.rfind('}').ok_or(BackendError::MissingJson)?;
    if end < start {
        return Err(BackendError::MissingJson);
    }

    serde_json::from_str(&text[start..=end]).map_err(|e| BackendError::Parse(e.to_string()))
}

/// Marks the cold path busy until dropped
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ColdEngine {
    model: Arc<dyn CloudModel>,
    in_flight: Arc<AtomicBool>,
}

impl ColdEngine {
    pub fn new(model: Arc<dyn CloudModel>) -> Self {
        Self {
            model,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the single request slot, or `None` if a request is outstanding
    pub fn try_begin(&self) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: Arc::clone(&self.in_flight),
            })
    }

    /// Run one request for `persona`; never fails
    pub async fn evaluate(&self, sample: &TelemetrySample, persona: PersonaId) -> ColdAdvisory {
        let started = Instant::now();
        let request = generate_request(build_prompt(persona.persona(), sample));

        let result = match self.model.generate(&request).await {
            Ok(text) => extract_reply(&text),
            Err(e) => Err(e),
        };
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match result {
            Ok(reply) => {
                debug!("Cold path ({}) answered in {:.0}ms", persona, latency_ms);
                ColdAdvisory::success(reply.message, reply.reasoning, latency_ms, self.model.label())
            }
            Err(e) => {
                warn!("Cold path failed after {:.0}ms: {}", latency_ms, e);
                ColdAdvisory::failure(&e.to_string(), latency_ms)
            }
        }
    }
}
