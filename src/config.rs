// Provider configuration, resolved from the environment

use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MISTRAL_CHAT_MODEL: &str = "mistral-large-latest";
pub const DEFAULT_MISTRAL_BASE_URL: &str = "https://api.mistral.ai";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not configured. Please add it as an environment variable for your deployment.")]
    MissingCredential(&'static str),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Could not initialise HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub mistral_api_key: Option<String>,
    pub mistral_agent_id: Option<String>,
    pub mistral_chat_model: String,
    pub mistral_base_url: String,
    pub timeout_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            mistral_api_key: None,
            mistral_agent_id: None,
            mistral_chat_model: DEFAULT_MISTRAL_CHAT_MODEL.to_string(),
            mistral_base_url: DEFAULT_MISTRAL_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let timeout_ms = match get("AI_STAYS_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().ok().filter(|ms| *ms > 0).ok_or(
                ConfigError::InvalidValue {
                    key: "AI_STAYS_TIMEOUT_MS",
                    value: raw,
                },
            )?,
            None => defaults.timeout_ms,
        };

        Ok(Self {
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            mistral_api_key: get("MISTRAL_API_KEY"),
            mistral_agent_id: get("MISTRAL_AGENT_ID"),
            mistral_chat_model: get("MISTRAL_CHAT_MODEL").unwrap_or(defaults.mistral_chat_model),
            mistral_base_url: get("MISTRAL_BASE_URL").unwrap_or(defaults.mistral_base_url),
            timeout_ms,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn require_gemini_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential("Gemini API key"))
    }

    pub fn require_mistral_key(&self) -> Result<&str, ConfigError> {
        self.mistral_api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential("Mistral API key"))
    }

    pub fn require_mistral_agent(&self) -> Result<&str, ConfigError> {
        self.mistral_agent_id
            .as_deref()
            .ok_or(ConfigError::MissingCredential("Mistral Agent ID"))
    }

    pub fn has_mistral_key(&self) -> bool {
        self.mistral_api_key.is_some()
    }

    /// Joins `path` onto a configured base URL.
    pub fn endpoint(base: &str, path: &str, key: &'static str) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|_| ConfigError::InvalidValue { key, value: joined })
    }

    /// One client shared by every provider built from this config.
    pub fn http_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.timeout())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = ProviderConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_reads_credentials_and_overrides() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("API_KEY", "legacy-key"),
            ("MISTRAL_API_KEY", "mk"),
            ("MISTRAL_AGENT_ID", "ag:123"),
            ("MISTRAL_BASE_URL", "http://localhost:9000"),
            ("AI_STAYS_TIMEOUT_MS", "1500"),
        ]))
        .unwrap();

        assert_eq!(config.require_gemini_key(), Ok("legacy-key"));
        assert_eq!(config.require_mistral_key(), Ok("mk"));
        assert_eq!(config.require_mistral_agent(), Ok("ag:123"));
        assert_eq!(config.mistral_base_url, "http://localhost:9000");
        assert_eq!(config.timeout_ms, 1500);
    }

    #[test]
    fn test_gemini_key_takes_precedence_over_legacy_key() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("API_KEY", "legacy-key"),
            ("GEMINI_API_KEY", "gemini-key"),
        ]))
        .unwrap();
        assert_eq!(config.require_gemini_key(), Ok("gemini-key"));
    }

    #[test]
    fn test_blank_values_are_missing() {
        let config = ProviderConfig::from_lookup(lookup(&[("MISTRAL_API_KEY", "  ")])).unwrap();
        let err = config.require_mistral_key().unwrap_err();
        assert_eq!(err, ConfigError::MissingCredential("Mistral API key"));
        assert!(err.to_string().starts_with("Mistral API key is not configured"));
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let url = ProviderConfig::endpoint(
            "https://api.mistral.ai/",
            "/v1/chat/completions",
            "MISTRAL_BASE_URL",
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.mistral.ai/v1/chat/completions");

        let err = ProviderConfig::endpoint("not a url", "v1", "MISTRAL_BASE_URL").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "MISTRAL_BASE_URL",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = ProviderConfig::from_lookup(lookup(&[("AI_STAYS_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "AI_STAYS_TIMEOUT_MS",
                ..
            }
        ));
    }
}
