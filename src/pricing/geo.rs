//! Geographic calculations

use serde::{Deserialize, Serialize};

use super::PricingError;

/// Earth radius in miles
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Reject coordinates outside the valid latitude/longitude ranges.
    pub fn validate(&self) -> Result<(), PricingError> {
        for (field, value, limit) in [("lat", self.lat, 90.0), ("lng", self.lng, 180.0)] {
            if !value.is_finite() {
                return Err(PricingError::NotFinite { field });
            }

            if value.abs() > limit {
                return Err(PricingError::OutOfRange { field, value });
            }
        }

        Ok(())
    }
}

/// Calculate Haversine distance between two points in miles
pub fn haversine_miles(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}
