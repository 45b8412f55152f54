// AI stays: generated accommodation listings with provider fallback

pub mod config;
pub mod error;
pub mod filter;
pub mod gemini;
pub mod listing;
pub mod mistral;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod schema;
pub mod session;
pub mod validator;

// Re-export key types for convenience
pub use config::{ConfigError, ProviderConfig};
pub use error::{FailureKind, MalformedReason, ProviderError};
pub use filter::{FilterCriteria, PRICE_CEILING, RATING_LEVELS};
pub use gemini::GeminiClient;
pub use listing::{
    Amenity, HotelStyle, Listing, ListingEnvelope, PickViolation, QueryError, SearchQuery,
};
pub use mistral::{ChatCompletionsClient, MistralAgentClient};
pub use orchestrator::{
    Backend, FallbackOrchestrator, FallbackPolicy, SearchError, SearchOutcome, SearchState,
};
pub use prompt::build_prompt;
pub use provider::ListingProvider;
pub use session::{AuthEvent, AuthFeed, AuthView, IdentityUser, SearchSession, User};
pub use validator::parse_envelope;
