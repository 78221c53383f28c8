//! Test doubles shared by the server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use hrc_core::backend::{
    Availability, BackendError, CloudModel, GenerateRequest, OnDeviceModel, OnDeviceSession,
    SessionOptions, Utterance, VoiceDescriptor, VoiceOutput,
};
use hrc_core::persona::PersonaId;
use hrc_server::state::AppState;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub const TRACE_CSV: &str = "\
Time (s),Speed (km/h),Engine Speed (rpm),Lateral acceleration (g),Longitudinal acceleration (g),Brake Pressure (bar),Throttle (%),Steering Angle (deg),Latitude,Longitude
0.00,100.0,6000,0.10,0.00,0,50,0,40.6171,-3.5859
0.05,100.0,6000,1.50,0.00,0,50,0,40.6172,-3.5860
0.10,100.0,6000,0.20,0.00,0,50,0,40.6173,-3.5861
";

/// GPS spans a 0.01 x 0.01 degree box corner to corner
pub const BOX_TRACE_CSV: &str = "\
Time (s),Speed (km/h),Engine Speed (rpm),Lateral acceleration (g),Longitudinal acceleration (g),Brake Pressure (bar),Throttle (%),Steering Angle (deg),Latitude,Longitude
0.00,120.0,6500,0.20,0.00,0,60,0,40.610,-3.590
0.05,120.0,6500,1.40,0.00,0,60,0,40.615,-3.585
0.10,120.0,6500,0.30,0.00,0,60,0,40.620,-3.580
";

pub const GOOD_REPLY: &str =
    r#"{"message": "Good exit, now commit.", "reasoning": "Lateral load is settling."}"#;

/// Cloud model returning a canned body, optionally held until released
pub struct FakeCloud {
    reply: Result<String, BackendError>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl FakeCloud {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn failing(error: BackendError) -> Self {
        Self {
            reply: Err(error),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Every call waits for a `notify_one` on the returned handle
    pub fn gated(text: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let cloud = Self {
            gate: Some(gate.clone()),
            ..Self::replying(text)
        };
        (cloud, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudModel for FakeCloud {
    fn label(&self) -> &str {
        "Fake Cloud"
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone()
    }
}

/// Voice engine that records everything it is asked to say
#[derive(Default)]
pub struct FakeVoice {
    spoken: Mutex<Vec<Utterance>>,
    cancels: AtomicUsize,
}

impl FakeVoice {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().iter().map(|u| u.text.clone()).collect()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

impl VoiceOutput for FakeVoice {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        hrc_adapters::speech::default_voices()
    }

    fn is_speaking(&self) -> bool {
        false
    }

    fn speak(&self, utterance: Utterance) {
        self.spoken.lock().push(utterance);
    }

    fn cancel_all(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// On-device model with a fixed availability and scripted answers
pub struct FakeOnDevice {
    availability: Availability,
    answer: String,
    delay: Duration,
}

impl FakeOnDevice {
    pub fn unavailable() -> Self {
        Self {
            availability: Availability::Unavailable,
            answer: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn answering(answer: &str) -> Self {
        Self {
            availability: Availability::Available,
            answer: answer.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Availability check that takes `delay` to answer
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::answering(r#"{"action": "PUSH"}"#)
        }
    }
}

struct FakeSession {
    answer: String,
}

#[async_trait]
impl OnDeviceSession for FakeSession {
    async fn prompt(
        &self,
        _prompt: &str,
        _constraint: &serde_json::Value,
    ) -> Result<String, BackendError> {
        Ok(self.answer.clone())
    }
}

#[async_trait]
impl OnDeviceModel for FakeOnDevice {
    fn name(&self) -> &str {
        "fake"
    }

    async fn availability(&self) -> Availability {
        tokio::time::sleep(self.delay).await;
        self.availability
    }

    async fn create_session(
        &self,
        _options: SessionOptions,
    ) -> Result<Box<dyn OnDeviceSession>, BackendError> {
        Ok(Box::new(FakeSession {
            answer: self.answer.clone(),
        }))
    }
}

/// State wired to fakes, heuristic running without simulated delay
pub fn state_with(cloud: Arc<FakeCloud>, voice: Arc<FakeVoice>) -> AppState {
    AppState::new(cloud, voice, Duration::ZERO, PersonaId::default())
}

pub fn state() -> AppState {
    state_with(
        Arc::new(FakeCloud::replying(GOOD_REPLY)),
        Arc::new(FakeVoice::default()),
    )
}
