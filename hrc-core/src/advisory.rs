//! Advisory vocabulary shared by the hot and cold coaching paths

use serde::{Deserialize, Serialize};
use std::fmt;

/// Urgent command emitted by the hot path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HotAction {
    Stabilize,
    TrailBrake,
    Threshold,
    Push,
    Maintain,
    /// Backend probing has not finished yet
    Loading,
    /// Backend decided, no evaluation has run yet
    Ready,
    /// The on-device model failed during a live call
    NanoErr,
}

impl HotAction {
    /// Actions an inference backend is allowed to answer with
    pub const VOCABULARY: [HotAction; 5] = [
        HotAction::Stabilize,
        HotAction::TrailBrake,
        HotAction::Threshold,
        HotAction::Push,
        HotAction::Maintain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HotAction::Stabilize => "STABILIZE",
            HotAction::TrailBrake => "TRAIL_BRAKE",
            HotAction::Threshold => "THRESHOLD",
            HotAction::Push => "PUSH",
            HotAction::Maintain => "MAINTAIN",
            HotAction::Loading => "LOADING",
            HotAction::Ready => "READY",
            HotAction::NanoErr => "NANO_ERR",
        }
    }

    /// Map a raw model answer onto the vocabulary.
    ///
    /// Only the first whitespace-separated word counts, case-insensitively
    /// and cut to 12 characters. Anything outside [`Self::VOCABULARY`] is
    /// rejected.
    pub fn from_model_output(raw: &str) -> Option<HotAction> {
        let word: String = raw
            .split_whitespace()
            .next()?
            .to_uppercase()
            .chars()
            .take(12)
            .collect();

        Self::VOCABULARY
            .into_iter()
            .find(|action| action.as_str() == word)
    }

    pub fn severity(&self) -> Severity {
        match self {
            HotAction::Stabilize | HotAction::Threshold => Severity::Red,
            HotAction::TrailBrake => Severity::Yellow,
            HotAction::Push
            | HotAction::Maintain
            | HotAction::Loading
            | HotAction::Ready
            | HotAction::NanoErr => Severity::Green,
        }
    }
}

impl fmt::Display for HotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Green,
    Yellow,
    Red,
}

impl Severity {
    /// Red and yellow advice interrupts whatever is being said
    pub fn is_urgent(&self) -> bool {
        matches!(self, Severity::Red | Severity::Yellow)
    }
}

/// Latest hot-path result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HotAdvisory {
    pub action: HotAction,
    pub severity: Severity,
    pub latency_ms: f64,
}

impl HotAdvisory {
    /// Shown until backend probing completes
    pub fn loading() -> Self {
        Self {
            action: HotAction::Loading,
            severity: Severity::Yellow,
            latency_ms: 0.0,
        }
    }

    pub fn ready() -> Self {
        Self::evaluated(HotAction::Ready, 0.0)
    }

    pub fn evaluated(action: HotAction, latency_ms: f64) -> Self {
        Self {
            action,
            severity: action.severity(),
            latency_ms,
        }
    }
}

/// Latest cold-path result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColdAdvisory {
    pub message: String,
    pub reasoning: String,
    pub latency_ms: f64,
    pub backend_label: String,
    pub is_error: bool,
}

impl ColdAdvisory {
    pub const STATIC_MESSAGE: &'static str = "RADIO STATIC...";
    pub const OFFLINE_LABEL: &'static str = "Offline";

    pub fn success(
        message: String,
        reasoning: String,
        latency_ms: f64,
        backend_label: &str,
    ) -> Self {
        Self {
            message,
            reasoning,
            latency_ms,
            backend_label: backend_label.to_string(),
            is_error: false,
        }
    }

    pub fn failure(reason: &str, latency_ms: f64) -> Self {
        Self {
            message: Self::STATIC_MESSAGE.to_string(),
            reasoning: format!("Connection lost: {}", reason),
            latency_ms,
            backend_label: Self::OFFLINE_LABEL.to_string(),
            is_error: true,
        }
    }
}
