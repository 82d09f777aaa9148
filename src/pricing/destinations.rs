//! Named destinations with precomputed mileage from the home base.

use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, serde_as};

use super::{
    PricingError, check_non_negative,
    geo::{Coordinates, haversine_miles},
};

/// Name of the home base every distance is measured from.
pub const HOME_BASE_NAME: &str = "Home Base";

/// Coordinates of the home base.
pub const HOME_BASE: Coordinates = Coordinates::new(26.7153, -80.0534);

/// A place the route form can be pre-filled with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    /// One-way miles from the home base.
    pub miles: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

struct KnownDestination {
    name: &'static str,
    miles: f64,
    coordinates: Option<Coordinates>,
}

const fn known(name: &'static str, miles: f64) -> KnownDestination {
    KnownDestination { name, miles, coordinates: None }
}

const fn pinned(name: &'static str, miles: f64, lat: f64, lng: f64) -> KnownDestination {
    KnownDestination {
        name,
        miles,
        coordinates: Some(Coordinates::new(lat, lng)),
    }
}

const DESTINATIONS: &[KnownDestination] = &[
    pinned("West Palm Beach (Local)", 5.0, 26.7153, -80.0534),
    pinned("Palm Beach Gardens", 15.0, 26.8242, -80.1386),
    pinned("Jupiter", 19.0, 26.9342, -80.0942),
    pinned("Lake Worth", 10.0, 26.6159, -80.0573),
    pinned("Boynton Beach", 17.0, 26.5251, -80.0628),
    pinned("Delray Beach", 24.0, 26.4615, -80.0728),
    pinned("Boca Raton", 28.0, 26.3587, -80.0831),
    known("Deerfield Beach", 31.0),
    known("Pompano Beach", 40.0),
    known("Coral Springs", 53.0),
    pinned("Fort Lauderdale", 47.0, 26.1224, -80.1373),
    known("Hollywood", 55.0),
    known("Pembroke Pines", 57.0),
    known("Miramar", 60.0),
    known("Aventura", 62.0),
    known("Hialeah", 70.0),
    pinned("Miami", 71.0, 25.7617, -80.1918),
    known("Miami Beach", 73.0),
    known("Doral", 70.0),
    pinned("Homestead", 100.0, 25.4687, -80.4776),
    known("Key Largo", 115.0),
    known("Islamorada", 145.0),
    known("Marathon", 170.0),
    pinned("Key West", 230.0, 24.5551, -81.78),
    pinned("Port St. Lucie", 50.0, 27.2931, -80.3503),
    known("Stuart", 40.0),
    known("Vero Beach", 80.0),
    known("Fort Pierce", 63.0),
    known("Melbourne", 110.0),
    known("Daytona Beach", 208.0),
    pinned("Orlando", 170.0, 28.5383, -81.3792),
    known("Kissimmee", 165.0),
    known("Winter Park", 172.0),
    known("Ocala", 240.0),
    known("Gainesville", 267.0),
    known("Sarasota", 180.0),
    known("Bradenton", 185.0),
    known("St. Petersburg", 230.0),
    known("Clearwater", 225.0),
    pinned("Tampa", 210.0, 27.9506, -82.4572),
    known("Lakeland", 190.0),
    known("Fort Myers", 126.0),
    known("Naples", 112.0),
    known("Bonita Springs", 120.0),
    known("Cape Coral", 130.0),
    known("Lehigh Acres", 135.0),
    known("Punta Gorda", 140.0),
    known("Sebring", 110.0),
    known("Okeechobee", 60.0),
    known("St. Augustine", 260.0),
    pinned("Jacksonville", 279.0, 30.3322, -81.6557),
    known("Palm Coast", 230.0),
    known("Tallahassee", 400.0),
    known("Panama City", 480.0),
    known("Pensacola", 610.0),
];

impl From<&KnownDestination> for Destination {
    fn from(known: &KnownDestination) -> Self {
        Self {
            name: known.name.to_string(),
            miles: known.miles,
            coordinates: known.coordinates,
        }
    }
}

/// Every named destination, in display order.
pub fn all() -> Vec<Destination> {
    DESTINATIONS.iter().map(Destination::from).collect()
}

/// Exact, case-sensitive lookup by name.
pub fn find(name: &str) -> Option<Destination> {
    DESTINATIONS.iter().find(|d| d.name == name).map(Destination::from)
}

/// Case-insensitive substring match used by the destination combobox.
pub fn search(query: &str) -> Vec<Destination> {
    let query = query.trim().to_lowercase();

    DESTINATIONS.iter().filter(|d| d.name.to_lowercase().contains(&query)).map(Destination::from).collect()
}

/// Build a destination for a pinned or searched point.
///
/// The name is the first comma-separated segment of `label` followed by the rounded
/// mileage, e.g. `Jupiter Inlet (~20 mi)`.
pub fn custom_destination(coordinates: Coordinates, label: Option<&str>) -> Destination {
    let miles = haversine_miles(&HOME_BASE, &coordinates);

    let place = label.and_then(|label| label.split(',').next()).map(str::trim).filter(|place| !place.is_empty()).unwrap_or("Custom Location");

    Destination {
        name: format!("{place} (~{miles:.0} mi)"),
        miles,
        coordinates: Some(coordinates),
    }
}

/// A point picked on the map or returned by location search.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomPoint {
    pub lat: f64,
    pub lng: f64,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default)]
    pub label: Option<String>,
}

impl CustomPoint {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    pub fn resolve(&self) -> Result<Destination, PricingError> {
        let coordinates = self.coordinates();
        coordinates.validate()?;

        Ok(custom_destination(coordinates, self.label.as_deref()))
    }
}

/// Name of the calculator entry that keeps the manually entered miles.
pub const CUSTOM_DESTINATION: &str = "Custom";

/// What the route form points at: one of a named destination, a custom point, or raw miles.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RouteTarget {
    pub destination: Option<String>,
    pub location: Option<CustomPoint>,
    pub one_way_miles: Option<f64>,
}

impl RouteTarget {
    /// Resolve the target to a destination; a named destination wins over a custom point,
    /// which wins over manually entered miles.
    pub fn resolve(&self) -> Result<Destination, PricingError> {
        // `Custom` selects the manual fields rather than a table entry.
        if let Some(name) = self.destination.as_deref().filter(|name| !name.is_empty() && *name != CUSTOM_DESTINATION) {
            if let Some(found) = find(name) {
                return Ok(found);
            }

            // A custom point keeps its generated name, so accept that name too.
            if let Some(location) = &self.location {
                let custom = location.resolve()?;
                if custom.name == name {
                    return Ok(custom);
                }
            }

            return Err(PricingError::UnknownDestination(name.to_string()));
        }

        if let Some(location) = &self.location {
            return location.resolve();
        }

        if let Some(miles) = self.one_way_miles {
            check_non_negative("one_way_miles", miles)?;

            return Ok(Destination {
                name: CUSTOM_DESTINATION.to_string(),
                miles,
                coordinates: None,
            });
        }

        Err(PricingError::MissingTarget)
    }
}
