//! Backend trait definitions
//!
//! Narrow request/response contracts for the three external collaborators:
//! the on-device model used by the hot path, the cloud text-generation model
//! used by the cold path, and the voice output shared by both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a backend call. The engines convert every variant into
/// advisory state; none of them reach the scheduler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("{0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The backend answered with an explicit error payload
    #[error("{0}")]
    Api(String),

    #[error("Empty response from API")]
    EmptyResponse,

    #[error("Invalid JSON structure")]
    MissingJson,

    #[error("{0}")]
    Parse(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Result of probing the on-device model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Available,
    Downloadable,
    Downloading,
    Unavailable,
}

/// Options for opening an on-device session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Instruction attached to every prompt of the session
    pub system_instruction: String,

    /// Languages the session is expected to read and write
    pub languages: Vec<String>,
}

/// Trait for the on-device (local, low-latency) model
///
/// Probing is two-phase: `availability()` first, then `create_session()`
/// only when the model reports itself available.
#[async_trait]
pub trait OnDeviceModel: Send + Sync {
    /// Get the name of this backend (e.g., "local:gemma3:1b")
    fn name(&self) -> &str;

    /// Check whether the model can be used right now
    async fn availability(&self) -> Availability;

    /// Open a session carrying the system instruction
    async fn create_session(
        &self,
        options: SessionOptions,
    ) -> Result<Box<dyn OnDeviceSession>, BackendError>;
}

#[async_trait]
pub trait OnDeviceSession: Send + Sync {
    /// Run one prompt whose answer must satisfy `constraint` (a JSON schema)
    ///
    /// Returns the raw JSON text produced by the model.
    async fn prompt(
        &self,
        prompt: &str,
        constraint: &serde_json::Value,
    ) -> Result<String, BackendError>;
}

/// Safety category relaxed for the coaching domain ("commit", "attack")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

impl SafetySetting {
    pub fn block_none(category: &str) -> Self {
        Self {
            category: category.to_string(),
            threshold: "BLOCK_NONE".to_string(),
        }
    }
}

/// One cold-path generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub safety_settings: Vec<SafetySetting>,
    /// Ask the backend for a JSON body rather than free text
    pub json_output: bool,
    pub max_output_tokens: u32,
}

/// Trait for the cloud text-generation model
#[async_trait]
pub trait CloudModel: Send + Sync {
    /// Human-readable backend label shown next to cold advice
    fn label(&self) -> &str;

    /// Returns the first candidate's text
    async fn generate(&self, request: &GenerateRequest) -> Result<String, BackendError>;
}

/// An installed voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub name: String,
    pub lang: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Low,
}

/// A fully resolved utterance handed to the voice backend
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// None lets the engine use its default voice
    pub voice: Option<VoiceDescriptor>,
    pub rate: f32,
    pub pitch: f32,
}

/// Trait for text-to-speech output
///
/// Interrupt and drop rules live in the caller; implementations simply
/// speak, report whether they are speaking, and cancel.
pub trait VoiceOutput: Send + Sync {
    /// Voices installed on this engine
    fn voices(&self) -> Vec<VoiceDescriptor>;

    fn is_speaking(&self) -> bool;

    fn speak(&self, utterance: Utterance);

    fn cancel_all(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_messages() {
        assert_eq!(BackendError::EmptyResponse.to_string(), "Empty response from API");
        assert_eq!(BackendError::MissingJson.to_string(), "Invalid JSON structure");
        assert_eq!(
            BackendError::Http {
                status: 503,
                message: "overloaded".to_string()
            }
            .to_string(),
            "HTTP 503: overloaded"
        );
        assert_eq!(BackendError::Api("quota".to_string()).to_string(), "quota");
    }

    #[test]
    fn test_safety_setting_block_none() {
        let s = SafetySetting::block_none("HARM_CATEGORY_HARASSMENT");
        assert_eq!(s.threshold, "BLOCK_NONE");
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["category"], "HARM_CATEGORY_HARASSMENT");
    }

    #[test]
    fn test_availability_serialization() {
        let json = serde_json::to_string(&Availability::Available).unwrap();
        assert_eq!(json, "\"available\"");
    }
}
