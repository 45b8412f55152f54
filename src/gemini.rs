// Structured-output provider: the generateContent endpoint constrains its own output
// to the envelope schema.

use crate::config::{ConfigError, ProviderConfig};
use crate::error::{MalformedReason, ProviderError};
use crate::provider::{ensure_prompt, send, ListingProvider};
use crate::schema::envelope_schema;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

const PROVIDER: &str = "Gemini API";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    url: Url,
}

impl GeminiClient {
    pub fn new(config: &ProviderConfig, client: Client) -> Result<Self, ConfigError> {
        let api_key = config.require_gemini_key()?.to_string();
        let url = ProviderConfig::endpoint(
            &config.gemini_base_url,
            &format!("v1beta/models/{}:generateContent", config.gemini_model),
            "GEMINI_BASE_URL",
        )?;

        Ok(Self {
            client,
            api_key,
            model: config.gemini_model.clone(),
            url,
        })
    }

    fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": envelope_schema()
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

fn candidate_text(body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        error!(provider = PROVIDER, error = %e, body, "generateContent body is not JSON");
        ProviderError::malformed(PROVIDER, MalformedReason::Unparseable, body)
    })?;

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        error!(provider = PROVIDER, body, "generateContent returned no candidate text");
        return Err(ProviderError::malformed(
            PROVIDER,
            MalformedReason::MissingContent,
            body,
        ));
    }

    Ok(text)
}

#[async_trait]
impl ListingProvider for GeminiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError> {
        ensure_prompt(PROVIDER, prompt)?;
        info!(model = %self.model, "Requesting structured listings from Gemini");

        let request = self
            .client
            .post(self.url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt));

        let body = send(PROVIDER, request, cancel).await?;
        candidate_text(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::fixtures::lisbon_envelope;
    use mockito::{Matcher, Server};
    use tokio_test::assert_err;

    const PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

    fn config(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            gemini_api_key: Some("gemini-test-key".to_string()),
            gemini_base_url: base_url.to_string(),
            ..ProviderConfig::default()
        }
    }

    fn client(base_url: &str) -> GeminiClient {
        GeminiClient::new(&config(base_url), Client::new()).unwrap()
    }

    fn candidate_body(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[test]
    fn test_missing_key_fails_before_any_request() {
        let err = GeminiClient::new(&ProviderConfig::default(), Client::new())
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::MissingCredential("Gemini API key"));
    }

    #[tokio::test]
    async fn test_sends_prompt_with_response_schema() {
        let mut server = Server::new_async().await;
        let payload = serde_json::to_string(&lisbon_envelope()).unwrap();
        let mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "gemini-test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Find stays in Lisbon" }] }],
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(candidate_body(&payload))
            .create_async()
            .await;

        let text = client(&server.url())
            .complete("Find stays in Lisbon", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, payload);
        mock.assert_async().await;
    }

    #[test]
    fn test_request_body_embeds_schema() {
        let body = GeminiClient::request_body("prompt");
        assert_eq!(
            body["generationConfig"]["responseSchema"],
            envelope_schema()
        );
    }

    #[tokio::test]
    async fn test_error_statuses_are_classified() {
        let mut server = Server::new_async().await;
        let gemini = client(&server.url());

        for (status, expected) in [(403, "Authorization"), (404, "NotFound"), (503, "Service")] {
            let mock = server
                .mock("POST", PATH)
                .with_status(status)
                .with_body("{\"error\": {\"message\": \"nope\"}}")
                .create_async()
                .await;

            let err = gemini
                .complete("prompt", &CancellationToken::new())
                .await
                .unwrap_err();
            assert_eq!(format!("{:?}", err.kind()), expected);
            assert_eq!(err.status(), Some(status as u16));
            mock.remove_async().await;
        }
    }

    #[tokio::test]
    async fn test_empty_candidates_are_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_body("{\"candidates\": []}")
            .create_async()
            .await;

        let result = client(&server.url())
            .complete("prompt", &CancellationToken::new())
            .await;
        let err = assert_err!(result);
        assert!(matches!(
            err,
            ProviderError::MalformedResponse {
                reason: MalformedReason::MissingContent,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let server = Server::new_async().await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client(&server.url())
            .complete("prompt", &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }
}
