// Response validation: parse the raw provider text and check the envelope shape

use crate::error::{MalformedReason, ProviderError};
use crate::listing::ListingEnvelope;
use crate::schema::LISTINGS_FIELD;
use serde_json::Value;
use tracing::{debug, error};

/// Trims whitespace and strips one surrounding Markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };

    // Drop the info string (```json) on the opening line
    match body.split_once('\n') {
        Some((info, content)) if info.trim().chars().all(|c| c.is_ascii_alphanumeric()) => {
            content.trim()
        }
        _ => body.trim(),
    }
}

/// Parses `raw` into a listing envelope. `provider` only labels the error.
///
/// Only the envelope shape is enforced: a `hotels` array of objects. Listing fields
/// are read leniently and off-vocabulary labels are kept, so field types, enum
/// membership, listing count and the AI-pick rules never fail a search here.
pub fn parse_envelope(provider: &str, raw: &str) -> Result<ListingEnvelope, ProviderError> {
    let text = strip_code_fence(raw);

    let value: Value = serde_json::from_str(text).map_err(|e| {
        error!(provider, error = %e, raw, "Failed to parse AI response");
        ProviderError::malformed(provider, MalformedReason::Unparseable, raw)
    })?;

    if !value.get(LISTINGS_FIELD).is_some_and(Value::is_array) {
        error!(provider, raw, "AI response has no '{}' array", LISTINGS_FIELD);
        return Err(ProviderError::malformed(
            provider,
            MalformedReason::MissingListings,
            raw,
        ));
    }

    let envelope: ListingEnvelope = serde_json::from_value(value).map_err(|e| {
        error!(provider, error = %e, raw, "AI response 'hotels' holds a non-object entry");
        ProviderError::malformed(provider, MalformedReason::InvalidListing, raw)
    })?;

    debug!(provider, listings = envelope.hotels.len(), "Parsed listing envelope");
    Ok(envelope)
}
