//! Geocoding and routing results.

use geo::LineString;
use serde::{Deserialize, Serialize};

/// A geographic coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<&crate::models::Location> for LatLng {
    fn from(loc: &crate::models::Location) -> Self {
        Self {
            lat: loc.latitude,
            lng: loc.longitude,
        }
    }
}

/// A search or reverse-geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub display_name: String,
    pub position: LatLng,
}

impl Place {
    /// Convert into a booking location.
    pub fn to_location(&self) -> crate::models::Location {
        crate::models::Location {
            address: Some(self.display_name.clone()),
            latitude: self.position.lat,
            longitude: self.position.lng,
        }
    }
}

/// Driving route between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub distance_meters: f64,
    pub duration_secs: f64,
    /// Path with `x = longitude`, `y = latitude`
    pub geometry: LineString<f64>,
}

impl Route {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }
}
