// Provider client seam. Every call convention implements `ListingProvider` and
// normalises its failures onto `ProviderError` before the orchestrator sees them.

use crate::error::{MalformedReason, ProviderError};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Accepts a prompt, returns the raw response text.
///
/// One outbound request per call; retries belong to the orchestrator.
#[async_trait]
pub trait ListingProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, ProviderError>;
}

pub(crate) fn ensure_prompt(provider: &str, prompt: &str) -> Result<(), ProviderError> {
    if prompt.trim().is_empty() {
        return Err(ProviderError::Service {
            provider: provider.to_string(),
            status: None,
            message: "refusing to send an empty prompt".to_string(),
        });
    }
    Ok(())
}

/// Sends `request` and returns the body of a 2xx response. Non-success statuses are
/// classified; the body is logged and kept on the error.
pub(crate) async fn send(
    provider: &str,
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<String, ProviderError> {
    let exchange = async move {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(provider, &e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(provider, &e))?;
        Ok::<_, ProviderError>((status, body))
    };

    let (status, body) = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!(provider, "Request cancelled before completion");
            return Err(ProviderError::Cancelled);
        }
        result = exchange => result?,
    };

    if status.is_success() {
        debug!(provider, status = status.as_u16(), bytes = body.len(), "Provider responded");
        return Ok(body);
    }

    error!(provider, status = status.as_u16(), body = %body, "Provider returned an error body");
    Err(ProviderError::from_status(provider, status.as_u16(), body))
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Pulls `choices[0].message.content` out of a chat-style completion body.
pub(crate) fn completion_content(provider: &str, body: &str) -> Result<String, ProviderError> {
    let parsed: CompletionBody = serde_json::from_str(body).map_err(|e| {
        error!(provider, error = %e, body, "Completion body is not JSON");
        ProviderError::malformed(provider, MalformedReason::Unparseable, body)
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| {
            error!(provider, body, "Invalid response structure: no message content");
            ProviderError::malformed(provider, MalformedReason::MissingContent, body)
        })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_content_extracts_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"hotels\":[]}"}}]}"#;
        assert_eq!(
            completion_content("Mistral Chat API", body).unwrap(),
            "{\"hotels\":[]}"
        );
    }

    #[test]
    fn test_completion_content_missing_fields() {
        for body in [
            r#"{}"#,
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{"content":""}}]}"#,
        ] {
            let err = completion_content("Mistral Chat API", body).unwrap_err();
            assert!(matches!(
                err,
                ProviderError::MalformedResponse {
                    reason: MalformedReason::MissingContent,
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_completion_content_not_json() {
        let err = completion_content("Mistral Agent API", "<html>").unwrap_err();
        assert!(matches!(
            err,
            ProviderError::MalformedResponse {
                reason: MalformedReason::Unparseable,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_prompt_is_rejected() {
        assert!(ensure_prompt("Gemini API", "  \n").is_err());
        assert!(ensure_prompt("Gemini API", "Lisbon").is_ok());
    }
}
