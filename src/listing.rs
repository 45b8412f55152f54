// Listing data model shared by the prompt builder, the validator and the filters

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Amenity {
    Wifi,
    Breakfast,
    Parking,
    Pool,
    Gym,
    PetFriendly,
    AirConditioning,
    Restaurant,
    Spa,
    /// Outside the fixed vocabulary, kept as sent.
    Other(String),
}

impl Amenity {
    pub const ALL: [Amenity; 9] = [
        Amenity::Wifi,
        Amenity::Breakfast,
        Amenity::Parking,
        Amenity::Pool,
        Amenity::Gym,
        Amenity::PetFriendly,
        Amenity::AirConditioning,
        Amenity::Restaurant,
        Amenity::Spa,
    ];

    // Wire label
    pub fn label(&self) -> &str {
        match self {
            Amenity::Wifi => "Wi-Fi",
            Amenity::Breakfast => "Breakfast",
            Amenity::Parking => "Parking",
            Amenity::Pool => "Pool",
            Amenity::Gym => "Gym",
            Amenity::PetFriendly => "Pet-friendly",
            Amenity::AirConditioning => "Air Conditioning",
            Amenity::Restaurant => "Restaurant",
            Amenity::Spa => "Spa",
            Amenity::Other(label) => label,
        }
    }

    /// Vocabulary lookup, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|amenity| amenity.label().eq_ignore_ascii_case(label))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Amenity::Other(_))
    }
}

impl From<&str> for Amenity {
    fn from(label: &str) -> Self {
        Self::from_label(label).unwrap_or_else(|| Amenity::Other(label.trim().to_string()))
    }
}

impl std::fmt::Display for Amenity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Amenity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Amenity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Amenity::from(lenient::label(&value).as_str()))
    }
}

/// The "vibe" of a stay.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HotelStyle {
    Luxury,
    Boutique,
    FamilyFriendly,
    Budget,
    /// Outside the fixed vocabulary, kept as sent. Empty when the provider omitted it.
    Other(String),
}

impl Default for HotelStyle {
    fn default() -> Self {
        HotelStyle::Other(String::new())
    }
}

impl HotelStyle {
    pub const ALL: [HotelStyle; 4] = [
        HotelStyle::Luxury,
        HotelStyle::Boutique,
        HotelStyle::FamilyFriendly,
        HotelStyle::Budget,
    ];

    pub fn label(&self) -> &str {
        match self {
            HotelStyle::Luxury => "Luxury",
            HotelStyle::Boutique => "Boutique",
            HotelStyle::FamilyFriendly => "Family-Friendly",
            HotelStyle::Budget => "Budget",
            HotelStyle::Other(label) => label,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|style| style.label().eq_ignore_ascii_case(label))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, HotelStyle::Other(_))
    }
}

impl From<&str> for HotelStyle {
    fn from(label: &str) -> Self {
        Self::from_label(label).unwrap_or_else(|| HotelStyle::Other(label.trim().to_string()))
    }
}

impl std::fmt::Display for HotelStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for HotelStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for HotelStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(HotelStyle::from(lenient::label(&value).as_str()))
    }
}

/// Joins the wire labels of a vocabulary with `", "`.
pub fn vocabulary<T>(values: &[T], label: fn(&T) -> &str) -> String {
    values.iter().map(label).collect::<Vec<_>>().join(", ")
}

// Field readers for provider output. Listings are taken as sent: a value of the
// wrong JSON type is coerced or defaulted instead of failing the whole envelope.
mod lenient {
    use super::Amenity;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(super) fn label(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn number_of(value: &Value) -> Option<f64> {
        let number: Option<f64> = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_start_matches('£').trim().parse().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(label(&Value::deserialize(deserializer)?))
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(number_of(&Value::deserialize(deserializer)?).unwrap_or(0.0))
    }

    // 482, 482.0 and "482" all read as 482
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let count = number_of(&Value::deserialize(deserializer)?)
            .filter(|n| *n >= 0.0)
            .map(|n| n.round().min(f64::from(u32::MAX)) as u32);
        Ok(count.unwrap_or(0))
    }

    pub fn amenities<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Amenity>, D::Error> {
        let amenities = match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .iter()
                .map(|item| Amenity::from(label(item).as_str()))
                .collect(),
            Value::String(s) => vec![Amenity::from(s.as_str())],
            _ => Vec::new(),
        };
        Ok(amenities)
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            other => Some(label(&other)),
        })
    }

    pub fn optional_flag<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<bool>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Bool(flag) => Some(flag),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        })
    }
}

// One generated accommodation, as returned by the provider
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub tagline: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub price_per_night: f64,
    #[serde(default, deserialize_with = "lenient::amenities")]
    pub amenities: Vec<Amenity>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rating: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub review_count: u32,
    #[serde(default, deserialize_with = "lenient::text")]
    pub guest_highlight: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(default)]
    pub style: HotelStyle,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub special_offer: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::optional_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_ai_suggested: Option<bool>,
}

impl Listing {
    pub fn ai_suggested(&self) -> bool {
        self.is_ai_suggested.unwrap_or(false)
    }

    pub fn has_offer(&self) -> bool {
        self.special_offer
            .as_deref()
            .is_some_and(|offer| !offer.trim().is_empty())
    }
}

pub const REQUESTED_LISTINGS: usize = 4;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ListingEnvelope {
    pub hotels: Vec<Listing>,
}

/// Ways an envelope can break the contract the prompt asks the provider to honour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickViolation {
    WrongCount { expected: usize, actual: usize },
    NoAiPick,
    MultipleAiPicks(usize),
    OfferOnAiPick { name: String },
}

impl std::fmt::Display for PickViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickViolation::WrongCount { expected, actual } => {
                write!(f, "expected {} listings, got {}", expected, actual)
            }
            PickViolation::NoAiPick => f.write_str("no listing is marked as the AI pick"),
            PickViolation::MultipleAiPicks(count) => {
                write!(f, "{} listings are marked as the AI pick", count)
            }
            PickViolation::OfferOnAiPick { name } => {
                write!(f, "AI pick '{}' carries a special offer", name)
            }
        }
    }
}

impl ListingEnvelope {
    /// Reports advisory violations without touching the listings.
    pub fn pick_violations(&self) -> Vec<PickViolation> {
        let mut violations = Vec::new();

        if self.hotels.len() != REQUESTED_LISTINGS {
            violations.push(PickViolation::WrongCount {
                expected: REQUESTED_LISTINGS,
                actual: self.hotels.len(),
            });
        }

        let picks: Vec<&Listing> = self.hotels.iter().filter(|l| l.ai_suggested()).collect();
        match picks.len() {
            0 => violations.push(PickViolation::NoAiPick),
            1 => {}
            n => violations.push(PickViolation::MultipleAiPicks(n)),
        }

        for pick in picks.iter().filter(|l| l.has_offer()) {
            violations.push(PickViolation::OfferOnAiPick {
                name: pick.name.clone(),
            });
        }

        violations
    }

    pub fn ai_pick(&self) -> Option<&Listing> {
        self.hotels.iter().find(|l| l.ai_suggested())
    }

    /// Amenity and style labels outside the fixed vocabularies, as
    /// (listing name, label). Advisory like `pick_violations`.
    pub fn unknown_labels(&self) -> Vec<(&str, &str)> {
        let mut unknown = Vec::new();
        for listing in &self.hotels {
            for amenity in listing.amenities.iter().filter(|a| !a.is_known()) {
                unknown.push((listing.name.as_str(), amenity.label()));
            }
            if !listing.style.is_known() && !listing.style.label().is_empty() {
                unknown.push((listing.name.as_str(), listing.style.label()));
            }
        }
        unknown
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Please enter a destination.")]
    EmptyDestination,

    #[error("Check-out ({check_out}) must be after check-in ({check_in}).")]
    InvalidStayWindow {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },
}

/// One user search. Built fresh per request and passed by value into the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    destination: String,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
}

impl SearchQuery {
    pub fn new(
        destination: impl Into<String>,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
    ) -> Result<Self, QueryError> {
        let destination = destination.into().trim().to_string();
        if destination.is_empty() {
            return Err(QueryError::EmptyDestination);
        }

        if let (Some(check_in), Some(check_out)) = (check_in, check_out) {
            if check_out <= check_in {
                return Err(QueryError::InvalidStayWindow {
                    check_in,
                    check_out,
                });
            }
        }

        Ok(Self {
            destination,
            check_in,
            check_out,
        })
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn check_in(&self) -> Option<NaiveDate> {
        self.check_in
    }

    pub fn check_out(&self) -> Option<NaiveDate> {
        self.check_out
    }

    /// Both dates, only when the caller supplied a complete stay window.
    pub fn stay_window(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.check_in.zip(self.check_out)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn listing(name: &str, price: f64, rating: f64, style: HotelStyle) -> Listing {
        Listing {
            name: name.to_string(),
            tagline: format!("{} tagline", name),
            price_per_night: price,
            amenities: vec![Amenity::Wifi, Amenity::Breakfast],
            rating,
            review_count: 120,
            guest_highlight: "Lovely stay, spotless rooms.".to_string(),
            location: "Five minutes from the old town".to_string(),
            style,
            special_offer: None,
            is_ai_suggested: Some(false),
        }
    }

    pub fn lisbon_envelope() -> ListingEnvelope {
        let mut pick = listing("Palácio do Rio", 240.0, 4.8, HotelStyle::Luxury);
        pick.is_ai_suggested = Some(true);
        pick.amenities = vec![Amenity::Spa, Amenity::Pool, Amenity::Restaurant];

        let mut boutique = listing("Casa Alfama", 135.0, 4.6, HotelStyle::Boutique);
        boutique.special_offer = Some("15% off stays of three nights or more".to_string());

        let mut family = listing("Belém Family Suites", 160.0, 4.3, HotelStyle::FamilyFriendly);
        family.amenities = vec![Amenity::Pool, Amenity::Parking, Amenity::Wifi];

        let budget = listing("Baixa Backpackers", 45.0, 3.9, HotelStyle::Budget);

        ListingEnvelope {
            hotels: vec![pick, boutique, family, budget],
        }
    }
}
