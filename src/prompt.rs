// Prompt construction. One prompt serves both the structured-output call and the
// raw JSON call, so it spells out the full shape as well as the vocabularies.

use crate::listing::{vocabulary, Amenity, HotelStyle, SearchQuery, REQUESTED_LISTINGS};
use chrono::NaiveDate;

/// Renders a date the way en-GB long dates read, e.g. `11 June 2025`.
pub fn format_stay_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

fn stay_clause(query: &SearchQuery) -> String {
    match query.stay_window() {
        Some((check_in, check_out)) => format!(
            "The user is looking to stay from {} to {}. Provide recommendations and potential special offers relevant to this period.",
            format_stay_date(check_in),
            format_stay_date(check_out)
        ),
        None => String::new(),
    }
}

pub fn build_prompt(query: &SearchQuery) -> String {
    let amenities = vocabulary(&Amenity::ALL, Amenity::label);
    let styles = vocabulary(&HotelStyle::ALL, HotelStyle::label);

    let mut lines = vec![
        format!(
            "You are an expert travel API. Your task is to generate a list of hotel options for a trip to {}, in the style of an Airbnb or Agoda listing.",
            query.destination()
        ),
        "Use British English. Prices must be in British pounds (£).".to_string(),
        "You must return ONLY a single valid JSON object. Do not include any text, markdown, or explanations before or after the JSON object.".to_string(),
        format!(
            "The JSON object must have a single key \"hotels\", which is an array of exactly {} distinct, realistic, top-rated hotel objects with a variety of vibes.",
            REQUESTED_LISTINGS
        ),
    ];

    let stay = stay_clause(query);
    if !stay.is_empty() {
        lines.push(stay);
    }

    lines.extend([
        "Each hotel object in the \"hotels\" array must have the following structure:".to_string(),
        "- name: string (The name of the hotel)".to_string(),
        "- tagline: string (A short, catchy tagline)".to_string(),
        "- pricePerNight: number (Average price per night in British pounds, e.g., 150)".to_string(),
        format!("- amenities: string[] (Only values from this exact list: [{}])", amenities),
        "- rating: number (A rating between 3.5 and 5.0)".to_string(),
        "- reviewCount: number (Total number of reviews, e.g., 482)".to_string(),
        "- guestHighlight: string (A short, positive quote from a guest that sounds authentic)".to_string(),
        "- location: string (Brief description of the location and proximity to attractions)".to_string(),
        format!("- style: string (Exactly one value from this list: [{}])", styles),
        "- specialOffer: string (Optional. A compelling special offer or promotion)".to_string(),
        "- isAiSuggested: boolean (Must be true for exactly ONE hotel, the top AI pick, and false for the other three)".to_string(),
        "IMPORTANT RULE: Do NOT add a 'specialOffer' to the hotel where 'isAiSuggested' is true. You can optionally add a 'specialOffer' to any of the other three hotels.".to_string(),
    ]);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_prompt_contains_destination_and_vocabularies() {
        let query = SearchQuery::new("Lisbon", None, None).unwrap();
        let prompt = build_prompt(&query);

        assert!(prompt.contains("Lisbon"));
        for amenity in Amenity::ALL {
            assert!(prompt.contains(amenity.label()), "missing {}", amenity);
        }
        for style in HotelStyle::ALL {
            assert!(prompt.contains(style.label()), "missing {}", style);
        }
        assert!(prompt.contains("British English"));
        assert!(prompt.contains("£"));
        assert!(prompt.contains("exactly 4"));
        assert!(prompt.contains("Do NOT add a 'specialOffer'"));
    }

    #[test_case("Lisbon"; "plain ascii")]
    #[test_case("São Paulo"; "accented")]
    #[test_case("Zürich"; "umlaut")]
    #[test_case("東京"; "non latin script")]
    #[test_case("Washington, D.C."; "comma and dots")]
    #[test_case("Côte d'Azur"; "apostrophe")]
    #[test_case("Saint-Rémy-de-Provence"; "hyphenated")]
    #[test_case("Kraków (Old Town) & \"Kazimierz\""; "brackets ampersand and quotes")]
    fn test_destination_appears_verbatim(destination: &str) {
        let query = SearchQuery::new(destination, None, None).unwrap();
        let prompt = build_prompt(&query);

        let first_line = prompt.lines().next().unwrap();
        assert!(
            first_line.contains(&format!("a trip to {},", destination)),
            "{}",
            first_line
        );
        assert!(prompt.contains("exactly 4"));
        assert!(prompt.contains("Do NOT add a 'specialOffer'"));
    }

    #[test]
    fn test_stay_window_rendered_when_both_dates_present() {
        let query =
            SearchQuery::new("Kyoto", Some(date(2025, 6, 11)), Some(date(2025, 6, 14))).unwrap();
        let prompt = build_prompt(&query);

        assert!(prompt.contains("from 11 June 2025 to 14 June 2025"));
        assert!(prompt.contains("relevant to this period"));
    }

    #[test]
    fn test_no_stay_clause_with_partial_dates() {
        let check_in_only = SearchQuery::new("Kyoto", Some(date(2025, 6, 11)), None).unwrap();
        let check_out_only = SearchQuery::new("Kyoto", None, Some(date(2025, 6, 14))).unwrap();

        for query in [check_in_only, check_out_only] {
            let prompt = build_prompt(&query);
            assert!(!prompt.contains("looking to stay"));
            assert!(!prompt.contains("June 2025"));
        }
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let query =
            SearchQuery::new("Porto", Some(date(2025, 12, 1)), Some(date(2025, 12, 3))).unwrap();
        assert_eq!(build_prompt(&query), build_prompt(&query));
    }

    #[test]
    fn test_format_stay_date_has_no_padding() {
        assert_eq!(format_stay_date(date(2025, 3, 5)), "5 March 2025");
    }
}
