//! Voice output that narrates through the log
//!
//! Stands in for a TTS engine on a headless server. Each utterance is logged
//! and the speaker counts as busy for as long as the text would take to say
//! at the requested rate, so interrupt and drop rules behave as they would
//! against a real engine.

use hrc_core::backend::{Utterance, VoiceDescriptor, VoiceOutput};
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Speaking pace at rate 1.0
const WORDS_PER_SECOND: f32 = 2.5;

/// Voices advertised when none are configured
pub fn default_voices() -> Vec<VoiceDescriptor> {
    [
        ("Google UK English Female", "en-GB"),
        ("Google UK English Male", "en-GB"),
        ("Google US English", "en-US"),
        ("US English Male", "en-US"),
        ("US English Female", "en-US"),
        ("Samantha", "en-US"),
    ]
    .into_iter()
    .map(|(name, lang)| VoiceDescriptor {
        name: name.to_string(),
        lang: lang.to_string(),
    })
    .collect()
}

/// How long `text` takes to say at `rate`
pub fn speaking_time(text: &str, rate: f32) -> Duration {
    let words = text.split_whitespace().count().max(1) as f32;
    let rate = if rate > 0.0 { rate } else { 1.0 };
    Duration::from_secs_f32(words / (WORDS_PER_SECOND * rate))
}

pub struct TracingVoice {
    voices: Vec<VoiceDescriptor>,
    busy_until: Mutex<Option<Instant>>,
}

impl TracingVoice {
    pub fn new() -> Self {
        Self::with_voices(default_voices())
    }

    pub fn with_voices(voices: Vec<VoiceDescriptor>) -> Self {
        Self {
            voices,
            busy_until: Mutex::new(None),
        }
    }
}

impl Default for TracingVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceOutput for TracingVoice {
    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.clone()
    }

    fn is_speaking(&self) -> bool {
        self.busy_until
            .lock()
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }

    fn speak(&self, utterance: Utterance) {
        let duration = speaking_time(&utterance.text, utterance.rate);
        *self.busy_until.lock() = Some(Instant::now() + duration);

        info!(
            voice = utterance.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            rate = utterance.rate,
            pitch = utterance.pitch,
            "Speaking: {}",
            utterance.text
        );
    }

    fn cancel_all(&self) {
        if self.busy_until.lock().take().is_some() {
            debug!("Speech cancelled");
        }
    }
}
