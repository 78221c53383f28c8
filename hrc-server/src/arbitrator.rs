//! Advisory arbitration
//!
//! The single place where advisories turn into side effects: log entries,
//! speech and published events. Runs under the session lock, so log
//! appends and voice triggers happen in one serial order.

use crate::event_log::{EventLog, EventLogEntry, LogSource};
use hrc_core::advisory::{ColdAdvisory, HotAction, HotAdvisory};
use hrc_core::backend::{Priority, Utterance, VoiceOutput};
use hrc_core::persona::{PersonaId, VoicePolicy, URGENT_VOICE};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// Event published to stream subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum CoachEvent {
    Hot(HotAdvisory),
    Cold(ColdAdvisory),
    Log(EventLogEntry),
}

impl CoachEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CoachEvent::Hot(_) => "hot",
            CoachEvent::Cold(_) => "cold",
            CoachEvent::Log(_) => "log",
        }
    }
}

pub struct Arbitrator {
    log: EventLog,
    last_hot: Option<HotAction>,
    audio_enabled: bool,
    voice: Arc<dyn VoiceOutput>,
    events: broadcast::Sender<CoachEvent>,
}

impl Arbitrator {
    pub fn new(voice: Arc<dyn VoiceOutput>, events: broadcast::Sender<CoachEvent>) -> Self {
        Self {
            log: EventLog::new(),
            last_hot: None,
            audio_enabled: true,
            voice,
            events,
        }
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn last_hot(&self) -> Option<HotAction> {
        self.last_hot
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    fn publish(&self, event: CoachEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn append(&mut self, source: LogSource, text: String) {
        let entry = self.log.push(source, text);
        self.publish(CoachEvent::Log(entry));
    }

    pub fn system(&mut self, text: impl Into<String>) {
        self.append(LogSource::System, text.into());
    }

    /// A new trace starts without repeat history
    pub fn reset(&mut self) {
        self.last_hot = None;
    }

    pub fn set_audio(&mut self, enabled: bool) {
        self.audio_enabled = enabled;
        if !enabled {
            self.voice.cancel_all();
        }
    }

    /// Announce an advisory state change that carries no side effects
    pub fn announce_hot(&self, advisory: HotAdvisory) {
        self.publish(CoachEvent::Hot(advisory));
    }

    pub fn on_hot(&mut self, advisory: HotAdvisory, speed: f64, persona: PersonaId) {
        self.publish(CoachEvent::Hot(advisory));

        let action = advisory.action;
        if action == HotAction::Maintain {
            self.last_hot = Some(action);
            return;
        }
        if self.last_hot == Some(action) {
            return;
        }

        self.append(LogSource::Hot, format!("[NANO] {} ({:.0}mph)", action, speed));

        let priority = if advisory.severity.is_urgent() {
            Priority::High
        } else {
            Priority::Low
        };
        self.speak(action.as_str(), priority, persona);
        self.last_hot = Some(action);
    }

    pub fn on_cold(&mut self, advisory: ColdAdvisory, persona: PersonaId) {
        if !advisory.is_error {
            self.append(LogSource::Persona(persona), format!("\"{}\"", advisory.message));
            self.speak(&advisory.message, Priority::Low, persona);
        }
        self.publish(CoachEvent::Cold(advisory));
    }

    fn speak(&self, text: &str, priority: Priority, persona: PersonaId) {
        if !self.audio_enabled || text.is_empty() {
            return;
        }

        let policy: &VoicePolicy = match priority {
            Priority::High => &URGENT_VOICE,
            Priority::Low => &persona.persona().voice,
        };

        match priority {
            Priority::High => self.voice.cancel_all(),
            Priority::Low if self.voice.is_speaking() => {
                debug!("Dropping low-priority speech while busy: {}", text);
                return;
            }
            Priority::Low => {}
        }

        let voices = self.voice.voices();
        self.voice.speak(Utterance {
            text: text.to_string(),
            voice: policy.select(&voices).cloned(),
            rate: policy.rate,
            pitch: policy.pitch,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrc_core::advisory::Severity;
    use hrc_core::backend::VoiceDescriptor;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingVoice {
        speaking: Mutex<bool>,
        spoken: Mutex<Vec<Utterance>>,
        cancels: Mutex<usize>,
    }

    impl VoiceOutput for RecordingVoice {
        fn voices(&self) -> Vec<VoiceDescriptor> {
            vec![
                VoiceDescriptor {
                    name: "Google UK English Female".into(),
                    lang: "en-GB".into(),
                },
                VoiceDescriptor {
                    name: "Google US English".into(),
                    lang: "en-US".into(),
                },
            ]
        }

        fn is_speaking(&self) -> bool {
            *self.speaking.lock()
        }

        fn speak(&self, utterance: Utterance) {
            *self.speaking.lock() = true;
            self.spoken.lock().push(utterance);
        }

        fn cancel_all(&self) {
            *self.speaking.lock() = false;
            *self.cancels.lock() += 1;
        }
    }

    fn arbitrator() -> (Arbitrator, Arc<RecordingVoice>, broadcast::Receiver<CoachEvent>) {
        let voice = Arc::new(RecordingVoice::default());
        let (tx, rx) = broadcast::channel(64);
        (Arbitrator::new(voice.clone(), tx), voice, rx)
    }

    fn hot(action: HotAction) -> HotAdvisory {
        HotAdvisory::evaluated(action, 1.0)
    }

    #[test]
    fn test_repeat_is_suppressed() {
        let (mut arb, voice, _rx) = arbitrator();
        arb.on_hot(hot(HotAction::Stabilize), 61.7, PersonaId::Tony);
        arb.on_hot(hot(HotAction::Stabilize), 60.0, PersonaId::Tony);

        assert_eq!(arb.log().count(LogSource::Hot), 1);
        assert_eq!(arb.log().iter().next().unwrap().text, "[NANO] STABILIZE (62mph)");
        assert_eq!(voice.spoken.lock().len(), 1);
    }

    #[test]
    fn test_maintain_is_silent_but_resets_repeat() {
        let (mut arb, voice, _rx) = arbitrator();
        arb.on_hot(hot(HotAction::Push), 90.0, PersonaId::Tony);
        arb.on_hot(hot(HotAction::Maintain), 90.0, PersonaId::Tony);
        assert_eq!(arb.last_hot(), Some(HotAction::Maintain));

        *voice.speaking.lock() = false;
        arb.on_hot(hot(HotAction::Push), 90.0, PersonaId::Tony);

        assert_eq!(arb.log().count(LogSource::Hot), 2);
        assert_eq!(voice.spoken.lock().len(), 2);
    }

    #[test]
    fn test_urgent_action_preempts_with_system_voice() {
        let (mut arb, voice, _rx) = arbitrator();
        *voice.speaking.lock() = true;

        arb.on_hot(hot(HotAction::TrailBrake), 50.0, PersonaId::Garmin);

        assert_eq!(*voice.cancels.lock(), 1);
        let spoken = voice.spoken.lock();
        assert_eq!(spoken[0].text, "TRAIL_BRAKE");
        assert_eq!(spoken[0].voice.as_ref().unwrap().name, "Google UK English Female");
        assert_eq!(spoken[0].rate, 1.3);
        assert_eq!(spoken[0].pitch, 1.2);
    }

    #[test]
    fn test_low_priority_dropped_while_speaking() {
        let (mut arb, voice, _rx) = arbitrator();
        *voice.speaking.lock() = true;

        arb.on_hot(hot(HotAction::Push), 90.0, PersonaId::Garmin);

        assert!(voice.spoken.lock().is_empty());
        assert_eq!(arb.log().count(LogSource::Hot), 1, "still logged");
    }

    #[test]
    fn test_cold_success_uses_persona_voice() {
        let (mut arb, voice, _rx) = arbitrator();
        let advisory = ColdAdvisory::success("Smooth hands".into(), "r".into(), 900.0, "Gemini");

        arb.on_cold(advisory, PersonaId::Garmin);

        assert_eq!(arb.log().iter().next().unwrap().text, "\"Smooth hands\"");
        assert_eq!(
            arb.log().iter().next().unwrap().source,
            LogSource::Persona(PersonaId::Garmin)
        );
        let spoken = voice.spoken.lock();
        assert_eq!(spoken[0].voice.as_ref().unwrap().name, "Google US English");
        assert_eq!(spoken[0].rate, 1.05);
    }

    #[test]
    fn test_cold_error_is_silent() {
        let (mut arb, voice, mut rx) = arbitrator();
        arb.on_cold(ColdAdvisory::failure("timeout", 10.0), PersonaId::Tony);

        assert!(arb.log().is_empty());
        assert!(voice.spoken.lock().is_empty());
        assert!(matches!(rx.try_recv(), Ok(CoachEvent::Cold(a)) if a.is_error));
    }

    #[test]
    fn test_audio_gate() {
        let (mut arb, voice, _rx) = arbitrator();
        arb.set_audio(false);
        assert_eq!(*voice.cancels.lock(), 1, "disabling cancels speech");

        arb.on_hot(hot(HotAction::Stabilize), 70.0, PersonaId::Tony);
        assert!(voice.spoken.lock().is_empty());
        assert_eq!(arb.log().count(LogSource::Hot), 1);
    }

    #[test]
    fn test_reset_clears_repeat_history() {
        let (mut arb, _voice, _rx) = arbitrator();
        arb.on_hot(hot(HotAction::Threshold), 70.0, PersonaId::Tony);
        arb.reset();
        arb.on_hot(hot(HotAction::Threshold), 70.0, PersonaId::Tony);
        assert_eq!(arb.log().count(LogSource::Hot), 2);
    }

    #[test]
    fn test_events_published() {
        let (mut arb, _voice, mut rx) = arbitrator();
        arb.on_hot(hot(HotAction::Stabilize), 70.0, PersonaId::Tony);

        let first = rx.try_recv().unwrap();
        assert!(matches!(first, CoachEvent::Hot(a) if a.severity == Severity::Red));
        assert_eq!(rx.try_recv().unwrap().name(), "log");
    }
}
