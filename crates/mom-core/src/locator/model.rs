//! Provider locator domain models.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::MomError;
use crate::geo::{format_distance, Coordinate};

/// Fallback texts for place records with missing fields.
pub const UNKNOWN_NAME: &str = "Unknown";
pub const NO_ADDRESS: &str = "Address not available";
pub const NO_HOURS: &str = "Hours not available";

/// Kind of healthcare provider to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[default]
    Dermatologist,
    Doctor,
    Pharmacy,
}

impl Category {
    pub const ALL: [Category; 3] = [Self::Dermatologist, Self::Doctor, Self::Pharmacy];

    /// Text query sent to the places service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dermatologist => "dermatologist",
            Self::Doctor => "doctor",
            Self::Pharmacy => "pharmacy",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            Self::Dermatologist => "Dermatologists",
            Self::Doctor => "Doctors",
            Self::Pharmacy => "Pharmacies",
        }
    }

    /// Map marker colour.
    pub fn marker_color(&self) -> &'static str {
        match self {
            Self::Dermatologist => "#8B1538",
            Self::Doctor => "#2563eb",
            Self::Pharmacy => "#16a34a",
        }
    }
}

impl FromStr for Category {
    type Err = MomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dermatologist" | "dermatologists" => Ok(Self::Dermatologist),
            "doctor" | "doctors" => Ok(Self::Doctor),
            "pharmacy" | "pharmacies" => Ok(Self::Pharmacy),
            other => Err(MomError::validation(format!(
                "unknown provider category '{other}' (expected dermatologist, doctor or pharmacy)"
            ))),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A place as returned by the places service, before any fallbacks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceRecord {
    pub place_id: Option<String>,
    pub name: Option<String>,
    pub rating: Option<f64>,
    pub formatted_address: Option<String>,
    pub location: Option<Coordinate>,
    pub phone: Option<String>,
    /// Opening hours, one line per weekday starting Monday.
    pub weekday_text: Vec<String>,
}

/// A provider ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcareProvider {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub rating: f64,
    pub distance: String,
    pub address: String,
    pub phone: Option<String>,
    pub hours: Option<String>,
    pub location: Coordinate,
}

impl HealthcareProvider {
    /// Build a provider from a place record.
    ///
    /// `index` is the record's position in the service response and stands in
    /// for a missing place id. `weekday` selects the opening-hours line
    /// (0 = Monday).
    pub fn from_place(
        index: usize,
        place: PlaceRecord,
        category: Category,
        origin: &Coordinate,
        weekday: usize,
    ) -> Self {
        let location = place.location.unwrap_or_default();
        let hours = place
            .weekday_text
            .get(weekday)
            .cloned()
            .unwrap_or_else(|| NO_HOURS.to_string());

        Self {
            id: place.place_id.unwrap_or_else(|| index.to_string()),
            name: place.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            category,
            rating: place.rating.unwrap_or(0.0),
            distance: format_distance(origin.distance_km(&location)),
            address: place
                .formatted_address
                .unwrap_or_else(|| NO_ADDRESS.to_string()),
            phone: place.phone.filter(|p| !p.trim().is_empty()),
            hours: Some(hours),
            location,
        }
    }

    pub fn directions_url(&self) -> String {
        format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            self.location.lat, self.location.lng
        )
    }

    pub fn tel_url(&self) -> Option<String> {
        self.phone.as_ref().map(|p| format!("tel:{}", p.replace(' ', "")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("Pharmacies".parse::<Category>().unwrap(), Category::Pharmacy);
        assert_eq!("doctor".parse::<Category>().unwrap(), Category::Doctor);
        assert!("dentist".parse::<Category>().is_err());
    }

    #[test]
    fn test_fallbacks() {
        let origin = Coordinate::new(0.0, 0.0);
        let provider = HealthcareProvider::from_place(3, PlaceRecord::default(), Category::Doctor, &origin, 0);
        assert_eq!(provider.id, "3");
        assert_eq!(provider.name, UNKNOWN_NAME);
        assert_eq!(provider.rating, 0.0);
        assert_eq!(provider.address, NO_ADDRESS);
        assert_eq!(provider.hours.as_deref(), Some(NO_HOURS));
        assert_eq!(provider.location, Coordinate::new(0.0, 0.0));
        assert_eq!(provider.distance, "0m");
        assert!(provider.phone.is_none());
    }

    #[test]
    fn test_from_place() {
        let origin = Coordinate::new(48.8566, 2.3522);
        let place = PlaceRecord {
            place_id: Some("abc".into()),
            name: Some("Clinique".into()),
            rating: Some(4.6),
            formatted_address: Some("1 Rue de Rivoli".into()),
            location: Some(Coordinate::new(48.8606, 2.3376)),
            phone: Some("01 23 45 67 89".into()),
            weekday_text: (0..7).map(|d| format!("day {d}")).collect(),
        };
        let provider = HealthcareProvider::from_place(0, place, Category::Dermatologist, &origin, 2);
        assert_eq!(provider.id, "abc");
        assert_eq!(provider.hours.as_deref(), Some("day 2"));
        assert!(provider.distance.ends_with("km"));
        assert_eq!(provider.tel_url().as_deref(), Some("tel:0123456789"));
        assert_eq!(
            provider.directions_url(),
            "https://www.google.com/maps/dir/?api=1&destination=48.8606,2.3376"
        );
    }
}
