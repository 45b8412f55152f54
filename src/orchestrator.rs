// Fallback orchestration: one prompt, a primary provider, and at most one fallback hop

use crate::config::{ConfigError, ProviderConfig};
use crate::error::{FailureKind, ProviderError};
use crate::gemini::GeminiClient;
use crate::listing::{ListingEnvelope, SearchQuery};
use crate::mistral::{ChatCompletionsClient, MistralAgentClient};
use crate::prompt::build_prompt;
use crate::provider::ListingProvider;
use crate::validator::parse_envelope;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Progress of a single search. Lives only for the duration of one `run` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    NotStarted,
    PrimaryAttempted,
    FallbackAttempted,
    Succeeded,
    Failed,
}

/// Which primary failures hand over to the fallback provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Only a missing endpoint/agent.
    #[default]
    NotFoundOnly,
    /// Missing endpoint or any other service failure. Credential, configuration and
    /// payload failures still end the search.
    AnyServiceFailure,
}

impl FallbackPolicy {
    pub fn allows(self, kind: FailureKind) -> bool {
        match self {
            FallbackPolicy::NotFoundOnly => kind == FailureKind::NotFound,
            FallbackPolicy::AnyServiceFailure => {
                matches!(kind, FailureKind::NotFound | FailureKind::Service)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Primary,
    Fallback,
}

/// The single failure a search reports. `Display` is safe to show to the user; the
/// provider diagnostic stays reachable through `source()` for logging.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct SearchError {
    message: String,
    stage: Stage,
    calls: usize,
    #[source]
    diagnostic: ProviderError,
}

impl SearchError {
    fn new(stage: Stage, calls: usize, diagnostic: ProviderError) -> Self {
        Self {
            message: user_message(stage, &diagnostic),
            stage,
            calls,
            diagnostic,
        }
    }

    pub fn user_message(&self) -> &str {
        &self.message
    }

    pub fn diagnostic(&self) -> &ProviderError {
        &self.diagnostic
    }

    pub fn kind(&self) -> FailureKind {
        self.diagnostic.kind()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Outbound provider calls made before the search failed.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

fn user_message(stage: Stage, err: &ProviderError) -> String {
    let provider = err.provider().unwrap_or("AI service");
    let status = err
        .status()
        .map_or_else(|| "no response".to_string(), |s| s.to_string());

    match (err, stage) {
        (ProviderError::Configuration(config), _) => config.to_string(),
        (ProviderError::Authorization { .. }, _) => format!(
            "{} error ({}): Unauthorized. Please check your API Key.",
            provider, status
        ),
        (ProviderError::NotFound { .. } | ProviderError::Service { .. }, Stage::Primary) => {
            format!("{} error ({}): Could not fetch data.", provider, status)
        }
        (ProviderError::NotFound { .. } | ProviderError::Service { .. }, Stage::Fallback) => {
            format!("{} error ({}): Fallback failed.", provider, status)
        }
        (ProviderError::MalformedResponse { .. }, Stage::Primary) => {
            "Could not understand the response from the AI. Please try again.".to_string()
        }
        (ProviderError::MalformedResponse { .. }, Stage::Fallback) => {
            "The AI returned an invalid format on fallback. Please try your search again."
                .to_string()
        }
        (ProviderError::Cancelled, _) => "The search was cancelled.".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub envelope: ListingEnvelope,
    pub served_by: String,
    pub used_fallback: bool,
}

/// Which provider family a config-built orchestrator talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Structured output first; Mistral chat as fallback when a Mistral key exists.
    #[default]
    Gemini,
    /// Named agent first, chat completions as fallback.
    Mistral,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gemini" => Ok(Backend::Gemini),
            "mistral" => Ok(Backend::Mistral),
            other => Err(format!("Unknown backend: {}", other)),
        }
    }
}

pub struct FallbackOrchestrator {
    primary: Arc<dyn ListingProvider>,
    fallback: Option<Arc<dyn ListingProvider>>,
    policy: FallbackPolicy,
}

impl FallbackOrchestrator {
    pub fn new(primary: Arc<dyn ListingProvider>) -> Self {
        Self {
            primary,
            fallback: None,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ListingProvider>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builds the provider chain for `backend`. Missing credentials fail here, before
    /// any request is made.
    pub fn from_config(config: &ProviderConfig, backend: Backend) -> Result<Self, ConfigError> {
        let client = config.http_client()?;

        let orchestrator = match backend {
            Backend::Gemini => {
                let primary = Self::new(Arc::new(GeminiClient::new(config, client.clone())?));
                if config.has_mistral_key() {
                    primary.with_fallback(Arc::new(ChatCompletionsClient::new(config, client)?))
                } else {
                    primary
                }
            }
            Backend::Mistral => {
                let agent = MistralAgentClient::new(config, client.clone())?;
                let chat = ChatCompletionsClient::new(config, client)?;
                Self::new(Arc::new(agent)).with_fallback(Arc::new(chat))
            }
        };

        Ok(orchestrator)
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    pub fn fallback_name(&self) -> Option<&str> {
        self.fallback.as_deref().map(|provider| provider.name())
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub async fn generate_listings(
        &self,
        query: &SearchQuery,
    ) -> Result<ListingEnvelope, SearchError> {
        self.run(query, &CancellationToken::new())
            .await
            .map(|outcome| outcome.envelope)
    }

    pub async fn run(
        &self,
        query: &SearchQuery,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome, SearchError> {
        let mut state = SearchState::NotStarted;
        let prompt = build_prompt(query);
        info!(
            destination = query.destination(),
            primary = self.primary.name(),
            "Generating listings"
        );

        if cancel.is_cancelled() {
            return Err(self.fail(&mut state, Stage::Primary, 0, ProviderError::Cancelled));
        }

        advance(&mut state, SearchState::PrimaryAttempted);
        let primary_err = match self.primary.complete(&prompt, cancel).await {
            Ok(raw) => {
                return match parse_envelope(self.primary.name(), &raw) {
                    Ok(envelope) => {
                        Ok(self.succeed(&mut state, envelope, self.primary.as_ref(), false))
                    }
                    Err(err) => Err(self.fail(&mut state, Stage::Primary, 1, err)),
                };
            }
            Err(err) => err,
        };

        let fallback = match &self.fallback {
            Some(fallback) if self.policy.allows(primary_err.kind()) => fallback,
            _ => return Err(self.fail(&mut state, Stage::Primary, 1, primary_err)),
        };

        warn!(
            primary = self.primary.name(),
            fallback = fallback.name(),
            error = %primary_err,
            "Primary provider unavailable, falling back"
        );

        if cancel.is_cancelled() {
            return Err(self.fail(&mut state, Stage::Fallback, 1, ProviderError::Cancelled));
        }

        advance(&mut state, SearchState::FallbackAttempted);
        match fallback.complete(&prompt, cancel).await {
            Ok(raw) => match parse_envelope(fallback.name(), &raw) {
                Ok(envelope) => Ok(self.succeed(&mut state, envelope, &**fallback, true)),
                Err(err) => Err(self.fail(&mut state, Stage::Fallback, 2, err)),
            },
            Err(err) => Err(self.fail(&mut state, Stage::Fallback, 2, err)),
        }
    }

    fn succeed(
        &self,
        state: &mut SearchState,
        envelope: ListingEnvelope,
        provider: &dyn ListingProvider,
        used_fallback: bool,
    ) -> SearchOutcome {
        advance(state, SearchState::Succeeded);

        for violation in envelope.pick_violations() {
            warn!(
                provider = provider.name(),
                %violation,
                "Listing envelope breaks the AI pick rules"
            );
        }
        for (listing, label) in envelope.unknown_labels() {
            warn!(
                provider = provider.name(),
                listing,
                label,
                "Listing uses a label outside the vocabulary"
            );
        }
        info!(
            provider = provider.name(),
            listings = envelope.hotels.len(),
            ai_pick = envelope.ai_pick().map(|pick| pick.name.as_str()),
            used_fallback,
            "Listings generated"
        );

        SearchOutcome {
            envelope,
            served_by: provider.name().to_string(),
            used_fallback,
        }
    }

    fn fail(
        &self,
        state: &mut SearchState,
        stage: Stage,
        calls: usize,
        err: ProviderError,
    ) -> SearchError {
        advance(state, SearchState::Failed);
        let search_err = SearchError::new(stage, calls, err);
        error!(
            stage = ?stage,
            calls,
            diagnostic = %search_err.diagnostic(),
            source = ?search_err.source(),
            "Listing generation failed"
        );
        search_err
    }
}

fn advance(state: &mut SearchState, next: SearchState) {
    debug!(from = ?*state, to = ?next, "Search state transition");
    *state = next;
}
