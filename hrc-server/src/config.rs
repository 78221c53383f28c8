//! Server configuration
//!
//! Every option is a command-line flag that can also be set through the
//! environment.

use clap::Parser;
use hrc_adapters::{gemini, local_model, GeminiClient, LocalModel};
use hrc_core::persona::PersonaId;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be an http(s) URL, got {value:?}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("cloud client: {0}")]
    CloudClient(String),
}

#[derive(Debug, Clone, Parser)]
#[command(name = "hrc-server", version, about = "Hybrid Race Coach server")]
pub struct CoachConfig {
    /// Address for the operator API
    #[arg(long, env = "HRC_BIND", default_value = "0.0.0.0:9100")]
    pub bind: SocketAddr,

    /// API key for the cloud model
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "HRC_GEMINI_MODEL", default_value = gemini::DEFAULT_MODEL)]
    pub gemini_model: String,

    #[arg(long, env = "HRC_GEMINI_BASE_URL", default_value = gemini::DEFAULT_BASE_URL)]
    pub gemini_base_url: String,

    /// Give up on a cloud request after this many milliseconds
    #[arg(long, env = "HRC_CLOUD_TIMEOUT_MS")]
    pub cloud_timeout_ms: Option<u64>,

    /// Local model server; without it the hot path uses the heuristic
    #[arg(long, env = "HRC_LOCAL_MODEL_URL")]
    pub local_model_url: Option<String>,

    #[arg(long, env = "HRC_LOCAL_MODEL", default_value = local_model::DEFAULT_MODEL)]
    pub local_model_name: String,

    #[arg(long, env = "HRC_PROBE_TIMEOUT_MS", default_value_t = 1000)]
    pub probe_timeout_ms: u64,

    /// Simulated compute time of the heuristic fallback
    #[arg(long, env = "HRC_HEURISTIC_DELAY_MS", default_value_t = 25)]
    pub heuristic_delay_ms: u64,

    /// Preload a synthetic demo lap
    #[arg(long, env = "HRC_DEMO")]
    pub demo: bool,

    /// Initial coaching persona
    #[arg(long, env = "HRC_PERSONA", default_value = "SUPER_AJ")]
    pub persona: PersonaId,
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

impl CoachConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_http_url(&self.gemini_base_url) {
            return Err(ConfigError::InvalidUrl {
                name: "gemini-base-url",
                value: self.gemini_base_url.clone(),
            });
        }
        if let Some(url) = &self.local_model_url {
            if !is_http_url(url) {
                return Err(ConfigError::InvalidUrl {
                    name: "local-model-url",
                    value: url.clone(),
                });
            }
        }
        if self.probe_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("probe-timeout-ms"));
        }
        if self.cloud_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroDuration("cloud-timeout-ms"));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn heuristic_delay(&self) -> Duration {
        Duration::from_millis(self.heuristic_delay_ms)
    }

    pub fn cloud_timeout(&self) -> Option<Duration> {
        self.cloud_timeout_ms.map(Duration::from_millis)
    }

    pub fn cloud_model(&self) -> Result<GeminiClient, ConfigError> {
        let client = GeminiClient::new(self.gemini_api_key.as_deref().unwrap_or_default())
            .with_base_url(&self.gemini_base_url)
            .with_model(&self.gemini_model);
        match self.cloud_timeout() {
            Some(timeout) => client
                .with_timeout(timeout)
                .map_err(|e| ConfigError::CloudClient(e.to_string())),
            None => Ok(client),
        }
    }

    pub fn local_model(&self) -> LocalModel {
        LocalModel::new(self.local_model_url.as_deref(), &self.local_model_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CoachConfig {
        let mut argv = vec!["hrc-server"];
        argv.extend_from_slice(args);
        CoachConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]);
        assert_eq!(config.bind, "0.0.0.0:9100".parse().unwrap());
        assert_eq!(config.gemini_model, "gemini-2.5-flash-preview-09-2025");
        assert_eq!(config.local_model_name, "gemma3:1b");
        assert_eq!(config.probe_timeout(), Duration::from_millis(1000));
        assert_eq!(config.heuristic_delay(), Duration::from_millis(25));
        assert_eq!(config.persona, PersonaId::SuperAj);
        assert!(!config.demo);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_flags() {
        let config = parse(&[
            "--bind",
            "127.0.0.1:8080",
            "--persona",
            "tony",
            "--cloud-timeout-ms",
            "5000",
            "--local-model-url",
            "http://localhost:11434",
            "--demo",
        ]);
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.persona, PersonaId::Tony);
        assert_eq!(config.cloud_timeout(), Some(Duration::from_millis(5000)));
        assert!(config.demo);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_unknown_persona_is_rejected() {
        assert!(CoachConfig::try_parse_from(["hrc-server", "--persona", "LEWIS"]).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = parse(&[]);
        config.local_model_url = Some("localhost:11434".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUrl { .. })));

        let mut config = parse(&[]);
        config.probe_timeout_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("probe-timeout-ms"))
        );

        let mut config = parse(&[]);
        config.cloud_timeout_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cloud_model_with_timeout_builds() {
        let config = parse(&["--cloud-timeout-ms", "2500", "--gemini-model", "gemini-test"]);
        let client = config.cloud_model().unwrap();
        assert_eq!(hrc_core::backend::CloudModel::label(&client), gemini::DEFAULT_LABEL);

        let config = parse(&[]);
        assert!(config.cloud_model().is_ok());
    }
}
