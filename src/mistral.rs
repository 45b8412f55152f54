// Mistral call conventions: a named agent endpoint and plain chat completions.
// Both ask for a JSON object and hand back the message content as raw text.

use crate::config::{ConfigError, ProviderConfig};
use crate::error::ProviderError;
use crate::provider::{completion_content, ensure_prompt, send, ListingProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

const AGENT_PROVIDER: &str = "Mistral Agent API";
const CHAT_PROVIDER: &str = "Mistral Chat API";

fn json_object_format() -> Value {
    json!({ "type": "json_object" })
}

pub struct MistralAgentClient {
    client: Client,
    api_key: String,
    agent_id: String,
    url: Url,
}

impl MistralAgentClient {
    pub fn new(config: &ProviderConfig, client: Client) -> Result<Self, ConfigError> {
        let api_key = config.require_mistral_key()?.to_string();
        let agent_id = config.require_mistral_agent()?.to_string();
        let url = ProviderConfig::endpoint(
            &config.mistral_base_url,
            &format!("v1/agents/{}/complete", agent_id),
            "MISTRAL_BASE_URL",
        )?;

        Ok(Self {
            client,
            api_key,
            agent_id,
            url,
        })
    }
}

#[async_trait]
impl ListingProvider for MistralAgentClient {
    fn name(&self) -> &str {
        AGENT_PROVIDER
    }

    async fn complete(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        ensure_prompt(AGENT_PROVIDER, prompt)?;
        info!(agent_id = %self.agent_id, "Requesting listings from Mistral agent");

        let request = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&json!({
                "prompt": prompt,
                "response_format": json_object_format()
            }));

        let body = send(AGENT_PROVIDER, request, cancel).await?;
        completion_content(AGENT_PROVIDER, &body)
    }
}

pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    model: String,
    url: Url,
}

impl ChatCompletionsClient {
    pub fn new(config: &ProviderConfig, client: Client) -> Result<Self, ConfigError> {
        let api_key = config.require_mistral_key()?.to_string();
        let url = ProviderConfig::endpoint(
            &config.mistral_base_url,
            "v1/chat/completions",
            "MISTRAL_BASE_URL",
        )?;

        Ok(Self {
            client,
            api_key,
            model: config.mistral_chat_model.clone(),
            url,
        })
    }
}

#[async_trait]
impl ListingProvider for ChatCompletionsClient {
    fn name(&self) -> &str {
        CHAT_PROVIDER
    }

    async fn complete(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        ensure_prompt(CHAT_PROVIDER, prompt)?;
        info!(model = %self.model, "Requesting listings from Mistral chat completions");

        let request = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
                "response_format": json_object_format()
            }));

        let body = send(CHAT_PROVIDER, request, cancel).await?;
        completion_content(CHAT_PROVIDER, &body)
    }
}
