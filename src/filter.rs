// Client-side narrowing and ordering of a generated result set

use crate::listing::{Amenity, HotelStyle, Listing};

/// Upper bound of the price slider. A ceiling at this value does not count as a filter.
pub const PRICE_CEILING: f64 = 1000.0;

/// Minimum-rating choices offered to the user, as (label, threshold).
pub const RATING_LEVELS: [(&str, f64); 4] =
    [("Any", 0.0), ("3.5+", 3.5), ("4.0+", 4.0), ("4.5+", 4.5)];

#[derive(Debug, Clone, PartialEq)]
pub struct FilterCriteria {
    pub max_price: f64,
    /// Every selected amenity must be present.
    pub amenities: Vec<Amenity>,
    pub min_rating: f64,
    /// Empty means any style.
    pub styles: Vec<HotelStyle>,
    pub offers_only: bool,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            max_price: PRICE_CEILING,
            amenities: Vec::new(),
            min_rating: 0.0,
            styles: Vec::new(),
            offers_only: false,
        }
    }
}

impl FilterCriteria {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn has_active_filters(&self) -> bool {
        !self.amenities.is_empty()
            || self.max_price < PRICE_CEILING
            || self.min_rating > 0.0
            || !self.styles.is_empty()
            || self.offers_only
    }

    pub fn toggle_amenity(&mut self, amenity: Amenity) {
        toggle(&mut self.amenities, amenity);
    }

    pub fn toggle_style(&mut self, style: HotelStyle) {
        toggle(&mut self.styles, style);
    }

    pub fn matches(&self, listing: &Listing) -> bool {
        if listing.price_per_night > self.max_price {
            return false;
        }

        if !self
            .amenities
            .iter()
            .all(|amenity| listing.amenities.contains(amenity))
        {
            return false;
        }

        if listing.rating < self.min_rating {
            return false;
        }

        if !self.styles.is_empty() && !self.styles.contains(&listing.style) {
            return false;
        }

        if self.offers_only && !listing.has_offer() {
            return false;
        }

        true
    }

    /// Keeps the matching listings, AI pick first. The sort is stable so the
    /// provider's order survives among the rest.
    pub fn apply<'a>(&self, listings: &'a [Listing]) -> Vec<&'a Listing> {
        let mut filtered: Vec<&Listing> = listings
            .iter()
            .filter(|listing| self.matches(listing))
            .collect();
        filtered.sort_by_key(|listing| !listing.ai_suggested());
        filtered
    }
}

fn toggle<T: PartialEq>(selected: &mut Vec<T>, value: T) {
    if let Some(pos) = selected.iter().position(|v| *v == value) {
        selected.remove(pos);
    } else {
        selected.push(value);
    }
}
