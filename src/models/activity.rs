//! Activity model.
//!
//! An activity is a single stop of a trip: loading, unloading, or one of
//! the trip-start/trip-end markers. Each activity happens at a site within
//! a time window and usually belongs to one transport.
//!
//! Within a trip, activities form a strict sequence. Loading and unloading
//! of the same delivery are linked through `delivery_ref`.

use serde::{Deserialize, Serialize};

use super::TimeWindow;

/// What happens at an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    /// Goods are picked up.
    Loading,
    /// Goods are dropped off.
    Unloading,
    /// Start marker of the trip (depot departure).
    TripStart,
    /// End marker of the trip (depot return).
    TripEnd,
}

/// Location of an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    /// Site or company name.
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    /// ISO 3166-1 alpha-2 country code.
    #[serde(default)]
    pub country_code: String,
}

impl Site {
    /// Creates a site with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the street address.
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Sets postal code and city.
    pub fn with_city(mut self, postal_code: impl Into<String>, city: impl Into<String>) -> Self {
        self.postal_code = postal_code.into();
        self.city = city.into();
        self
    }

    /// Sets the country code.
    pub fn with_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = country_code.into();
        self
    }

    /// Case-insensitive substring match over every address field.
    ///
    /// `needle` must already be lowercase.
    pub fn matches_text(&self, needle: &str) -> bool {
        [
            &self.name,
            &self.address,
            &self.postal_code,
            &self.city,
            &self.country_code,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A stop of a trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity uid, unique within the snapshot.
    pub uid: String,
    /// Kind of stop.
    pub category: ActivityCategory,
    /// Where it happens.
    pub site: Site,
    /// When it happens.
    pub window: TimeWindow,
    /// Transport this activity belongs to (none for markers).
    #[serde(default)]
    pub transport_ref: Option<String>,
    /// Delivery linking a loading to its unloading.
    #[serde(default)]
    pub delivery_ref: Option<String>,
}

impl Activity {
    /// Creates a new activity.
    pub fn new(
        uid: impl Into<String>,
        category: ActivityCategory,
        site: Site,
        window: TimeWindow,
    ) -> Self {
        Self {
            uid: uid.into(),
            category,
            site,
            window,
            transport_ref: None,
            delivery_ref: None,
        }
    }

    /// Links the activity to a transport.
    pub fn for_transport(mut self, transport_uid: impl Into<String>) -> Self {
        self.transport_ref = Some(transport_uid.into());
        self
    }

    /// Links the activity to a delivery.
    pub fn for_delivery(mut self, delivery_uid: impl Into<String>) -> Self {
        self.delivery_ref = Some(delivery_uid.into());
        self
    }

    /// Whether goods are picked up here.
    pub fn is_pickup(&self) -> bool {
        self.category == ActivityCategory::Loading
    }

    /// Whether goods are dropped off here.
    pub fn is_delivery(&self) -> bool {
        self.category == ActivityCategory::Unloading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::at;

    #[test]
    fn test_activity_with_site_and_times() {
        let window = TimeWindow::new(at(8, 0), at(9, 0)).unwrap();
        let act = Activity::new("A1", ActivityCategory::Loading, Site::named("Depot"), window)
            .for_transport("TR1")
            .for_delivery("D1");

        assert_eq!(act.uid, "A1");
        assert!(act.is_pickup());
        assert!(!act.is_delivery());
        assert_eq!(act.transport_ref.as_deref(), Some("TR1"));
        assert_eq!(act.delivery_ref.as_deref(), Some("D1"));
        assert_eq!(act.window, window);
    }

    #[test]
    fn test_site_text_match() {
        let site = Site::named("Cold Store Nord")
            .with_address("12 Hafenstrasse")
            .with_city("20457", "Hamburg")
            .with_country("DE");

        assert!(site.matches_text("hamburg"));
        assert!(site.matches_text("hafen"));
        assert!(site.matches_text("2045"));
        assert!(site.matches_text("cold store"));
        assert!(!site.matches_text("berlin"));
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&ActivityCategory::TripStart).unwrap(),
            "\"trip_start\""
        );
    }
}
