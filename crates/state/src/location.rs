//! Delivery location types.
//!
//! The device location subsystem supplying the current delivery location is
//! an external collaborator; this module only carries the value and the
//! logout reset rule for saved addresses.

use serde::{Deserialize, Serialize};

/// Generic label applied when a saved address is downgraded to an ad-hoc
/// location on logout.
pub const UNSAVED_LABEL: &str = "Selected Location";

/// The current delivery location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Human-readable label ("Home", "Work", or the generic placeholder).
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Formatted delivery address text.
    pub delivery_address: String,
    /// Saved-address id when the location came from the user's address
    /// book; `None` for ad-hoc locations.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Location {
    /// Whether this location references a saved address.
    #[must_use]
    pub const fn is_saved_address(&self) -> bool {
        self.id.is_some()
    }

    /// Downgrade a saved address to an unsaved location: same coordinates
    /// and delivery address, generic label, no id.
    #[must_use]
    pub fn into_unsaved(self) -> Self {
        Self {
            label: UNSAVED_LABEL.to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            delivery_address: self.delivery_address,
            id: None,
        }
    }
}

/// Holder for the current delivery location.
#[derive(Debug, Default)]
pub struct LocationProvider {
    current: Option<Location>,
}

impl LocationProvider {
    /// Create a provider with no location selected.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// The current location, if one is selected.
    #[must_use]
    pub const fn current(&self) -> Option<&Location> {
        self.current.as_ref()
    }

    /// Replace the current location.
    pub fn set(&mut self, location: Location) {
        self.current = Some(location);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_unsaved_preserves_coordinates() {
        let saved = Location {
            label: "Home".to_string(),
            latitude: 52.52,
            longitude: 13.405,
            delivery_address: "Alexanderplatz 1, Berlin".to_string(),
            id: Some("addr-1".to_string()),
        };
        assert!(saved.is_saved_address());

        let unsaved = saved.clone().into_unsaved();
        assert_eq!(unsaved.label, UNSAVED_LABEL);
        assert!(unsaved.id.is_none());
        assert!((unsaved.latitude - saved.latitude).abs() < f64::EPSILON);
        assert!((unsaved.longitude - saved.longitude).abs() < f64::EPSILON);
        assert_eq!(unsaved.delivery_address, saved.delivery_address);
        assert!(!unsaved.is_saved_address());
    }
}
