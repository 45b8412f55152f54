// Structured-output schema mirroring `ListingEnvelope`, in the OpenAPI subset
// accepted by the generateContent endpoint.

use crate::listing::{Amenity, HotelStyle};
use serde_json::{json, Value};

pub const LISTINGS_FIELD: &str = "hotels";

const REQUIRED_FIELDS: [&str; 10] = [
    "name",
    "tagline",
    "pricePerNight",
    "amenities",
    "rating",
    "reviewCount",
    "guestHighlight",
    "location",
    "style",
    "isAiSuggested",
];

pub fn listing_schema() -> Value {
    let amenities: Vec<String> = Amenity::ALL.iter().map(|a| a.label().to_string()).collect();
    let styles: Vec<String> = HotelStyle::ALL.iter().map(|s| s.label().to_string()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING", "description": "The name of the hotel." },
            "tagline": { "type": "STRING", "description": "A short, catchy tagline for the accommodation." },
            "pricePerNight": { "type": "NUMBER", "description": "The average price per night in British pounds (£)." },
            "amenities": {
                "type": "ARRAY",
                "description": "A list of key amenities offered.",
                "items": { "type": "STRING", "enum": amenities }
            },
            "rating": { "type": "NUMBER", "description": "The average guest rating out of 5." },
            "reviewCount": { "type": "INTEGER", "description": "The total number of reviews." },
            "guestHighlight": { "type": "STRING", "description": "A short, positive quote from a guest review." },
            "location": { "type": "STRING", "description": "A brief description of the location and proximity to attractions." },
            "style": {
                "type": "STRING",
                "description": "The style or vibe of the hotel.",
                "enum": styles
            },
            "specialOffer": { "type": "STRING", "description": "Any special offer or promotion currently available. Optional." },
            "isAiSuggested": { "type": "BOOLEAN", "description": "Set to true for exactly one hotel that is the top AI pick." }
        },
        "required": REQUIRED_FIELDS
    })
}

pub fn envelope_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "hotels": {
                "type": "ARRAY",
                "description": "A list of four top recommended hotels.",
                "items": listing_schema()
            }
        },
        "required": ["hotels"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_carries_full_vocabularies() {
        let schema = envelope_schema();
        let listing = &schema["properties"]["hotels"]["items"];

        let amenities = listing["properties"]["amenities"]["items"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(amenities.len(), Amenity::ALL.len());
        assert!(amenities.contains(&json!("Pet-friendly")));

        let styles = listing["properties"]["style"]["enum"].as_array().unwrap();
        assert_eq!(styles.len(), HotelStyle::ALL.len());
        assert!(styles.contains(&json!("Family-Friendly")));
    }

    #[test]
    fn test_special_offer_is_optional() {
        let schema = listing_schema();
        let required = schema["required"].as_array().unwrap();
        assert!(!required.contains(&json!("specialOffer")));
        assert!(required.contains(&json!("isAiSuggested")));
        assert_eq!(envelope_schema()["required"], json!(["hotels"]));
    }
}
