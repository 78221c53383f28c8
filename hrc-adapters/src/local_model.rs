//! On-device model reached through a local Ollama-style server
//!
//! Availability comes from `GET /api/tags`; prompts go to `POST /api/generate`
//! with the JSON schema passed as `format` so the answer is constrained to
//! the hot-path vocabulary.

use async_trait::async_trait;
use hrc_core::backend::{
    Availability, BackendError, OnDeviceModel, OnDeviceSession, SessionOptions,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_MODEL: &str = "gemma3:1b";

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    format: &'a serde_json::Value,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    response: String,
    error: Option<String>,
}

pub struct LocalModel {
    http: reqwest::Client,
    base_url: Option<String>,
    model: String,
    name: String,
}

impl LocalModel {
    /// `base_url` of `None` means no local server is configured; the model
    /// then always reports itself unavailable.
    pub fn new(base_url: Option<&str>, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            model: model.to_string(),
            name: format!("local:{}", model),
        }
    }

    /// A tag matches the configured model exactly or with an implicit
    /// `:latest` suffix.
    fn tag_matches(&self, tag: &str) -> bool {
        tag == self.model || tag.strip_suffix(":latest") == Some(self.model.as_str())
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
impl OnDeviceModel for LocalModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn availability(&self) -> Availability {
        let Some(base) = &self.base_url else {
            return Availability::Unavailable;
        };

        let resp = match self.http.get(format!("{}/api/tags", base)).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!("Local model server answered {}", resp.status());
                return Availability::Unavailable;
            }
            Err(e) => {
                debug!("Local model server not reachable: {}", e);
                return Availability::Unavailable;
            }
        };

        match resp.json::<TagsResponse>().await {
            Ok(tags) if tags.models.iter().any(|m| self.tag_matches(&m.name)) => {
                Availability::Available
            }
            // Server is up but the model still has to be pulled
            Ok(_) => Availability::Downloadable,
            Err(e) => {
                warn!("Unreadable model list from local server: {}", e);
                Availability::Unavailable
            }
        }
    }

    async fn create_session(
        &self,
        options: SessionOptions,
    ) -> Result<Box<dyn OnDeviceSession>, BackendError> {
        let base = self
            .base_url
            .clone()
            .ok_or_else(|| BackendError::Unavailable("no local model server configured".into()))?;

        info!(
            "Opened local session on {} (languages: {})",
            self.model,
            options.languages.join(",")
        );

        Ok(Box::new(LocalSession {
            http: self.http.clone(),
            endpoint: format!("{}/api/generate", base),
            model: self.model.clone(),
            system_instruction: options.system_instruction,
        }))
    }
}

/// One open session; the system instruction is sent with every prompt
pub struct LocalSession {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    system_instruction: String,
}

#[async_trait]
impl OnDeviceSession for LocalSession {
    async fn prompt(
        &self,
        prompt: &str,
        constraint: &serde_json::Value,
    ) -> Result<String, BackendError> {
        let body = GenerateBody {
            model: &self.model,
            system: &self.system_instruction,
            prompt,
            format: constraint,
            stream: false,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateReply = resp
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        if let Some(err) = reply.error {
            return Err(BackendError::Api(err));
        }
        if reply.response.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(reply.response)
    }
}
