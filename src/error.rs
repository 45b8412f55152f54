// Failure taxonomy shared by every provider client and the orchestrator

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// Body is not JSON at all.
    Unparseable,
    /// JSON without a `hotels` array.
    MissingListings,
    /// `hotels` present but an entry is not a listing object.
    InvalidListing,
    /// The provider's own response envelope is missing the content field.
    MissingContent,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            MalformedReason::Unparseable => "response is not valid JSON",
            MalformedReason::MissingListings => "the 'hotels' array is missing",
            MalformedReason::InvalidListing => "a 'hotels' entry is not a listing object",
            MalformedReason::MissingContent => "response envelope has no message content",
        };
        f.write_str(text)
    }
}

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("{provider} rejected the credentials ({status}): {body}")]
    Authorization {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} endpoint not found ({status}): {body}")]
    NotFound {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider} service error ({}): {message}", .status.map_or("no status".to_string(), |s| s.to_string()))]
    Service {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed response from {provider}: {reason}")]
    MalformedResponse {
        provider: String,
        reason: MalformedReason,
        raw: String,
    },

    #[error("Request cancelled")]
    Cancelled,
}

/// What the orchestrator looks at when deciding whether to continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Authorization,
    NotFound,
    Service,
    MalformedResponse,
    Cancelled,
}

impl ProviderError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProviderError::Configuration(_) => FailureKind::Configuration,
            ProviderError::Authorization { .. } => FailureKind::Authorization,
            ProviderError::NotFound { .. } => FailureKind::NotFound,
            ProviderError::Service { .. } => FailureKind::Service,
            ProviderError::MalformedResponse { .. } => FailureKind::MalformedResponse,
            ProviderError::Cancelled => FailureKind::Cancelled,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Authorization { status, .. }
            | ProviderError::NotFound { status, .. } => Some(*status),
            ProviderError::Service { status, .. } => *status,
            _ => None,
        }
    }

    pub fn provider(&self) -> Option<&str> {
        match self {
            ProviderError::Authorization { provider, .. }
            | ProviderError::NotFound { provider, .. }
            | ProviderError::Service { provider, .. }
            | ProviderError::MalformedResponse { provider, .. } => Some(provider.as_str()),
            ProviderError::Configuration(_) | ProviderError::Cancelled => None,
        }
    }

    /// Maps a non-success HTTP status onto the taxonomy.
    pub fn from_status(provider: &str, status: u16, body: String) -> Self {
        match status {
            401 | 403 => ProviderError::Authorization {
                provider: provider.to_string(),
                status,
                body,
            },
            404 => ProviderError::NotFound {
                provider: provider.to_string(),
                status,
                body,
            },
            _ => ProviderError::Service {
                provider: provider.to_string(),
                status: Some(status),
                message: body,
            },
        }
    }

    pub fn from_transport(provider: &str, err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("could not connect: {}", err)
        } else {
            err.to_string()
        };

        ProviderError::Service {
            provider: provider.to_string(),
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }

    pub fn malformed(provider: &str, reason: MalformedReason, raw: impl Into<String>) -> Self {
        ProviderError::MalformedResponse {
            provider: provider.to_string(),
            reason,
            raw: raw.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(401, FailureKind::Authorization; "unauthorized")]
    #[test_case(403, FailureKind::Authorization; "forbidden")]
    #[test_case(404, FailureKind::NotFound; "not found")]
    #[test_case(429, FailureKind::Service; "rate limited")]
    #[test_case(500, FailureKind::Service; "server error")]
    fn test_status_classification(status: u16, expected: FailureKind) {
        let err = ProviderError::from_status("Mistral Agent API", status, "body".to_string());
        assert_eq!(err.kind(), expected);
        assert_eq!(err.status(), Some(status));
        assert_eq!(err.provider(), Some("Mistral Agent API"));
    }

    #[test]
    fn test_configuration_error_is_transparent() {
        let err: ProviderError = ConfigError::MissingCredential("Mistral API key").into();
        assert_eq!(err.kind(), FailureKind::Configuration);
        assert!(err.to_string().starts_with("Mistral API key is not configured"));
        assert!(err.provider().is_none());
    }

    #[test]
    fn test_service_error_without_status() {
        let err = ProviderError::Service {
            provider: "Gemini API".to_string(),
            status: None,
            message: "could not connect".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Gemini API service error (no status): could not connect"
        );
    }
}
