//! Gemini `generateContent` client for the cold coaching path
//!
//! Sends one prompt per call and returns the first candidate's text. The
//! API key comes from configuration; it is passed as the `key` query
//! parameter the way the public REST endpoint expects.

use async_trait::async_trait;
use hrc_core::backend::{BackendError, CloudModel, GenerateRequest, SafetySetting};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-09-2025";
pub const DEFAULT_LABEL: &str = "Gemini 2.5 Flash";

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    safety_settings: &'a [SafetySetting],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|t| !t.trim().is_empty())
    }
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    label: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.to_string(),
            label: DEFAULT_LABEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// Bound each request. Without this the connection's own lifecycle
    /// decides when a call gives up.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, BackendError> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }
}

fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Network(e.to_string())
    }
}

#[async_trait]
impl CloudModel for GeminiClient {
    fn label(&self) -> &str {
        &self.label
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, BackendError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            safety_settings: &request.safety_settings,
            generation_config: GenerationConfig {
                response_mime_type: request.json_output.then_some("application/json"),
                max_output_tokens: request.max_output_tokens,
            },
        };

        debug!("Sending generateContent request to {}", self.model);

        let resp = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let raw = resp.text().await.map_err(transport_error)?;

        let parsed = match serde_json::from_str::<GenerateContentResponse>(&raw) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(BackendError::Http {
                    status: status.as_u16(),
                    message: raw,
                });
            }
            Err(e) => return Err(BackendError::Parse(e.to_string())),
        };

        if let Some(err) = parsed.error {
            warn!("Gemini returned an error payload: {}", err.message);
            return Err(BackendError::Api(err.message));
        }

        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
                message: raw,
            });
        }

        parsed.first_text().ok_or(BackendError::EmptyResponse)
    }
}
