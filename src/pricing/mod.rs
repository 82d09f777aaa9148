//! Delivery fee estimation.
//!
//! The estimate is plain arithmetic over a handful of settings and the route the user
//! picked: drive time is billed at the driver rate, fuel is billed by the gallon, tolls and
//! extras pass through, and the subtotal is marked up by the profit margin.
//!
//! Destinations (named or custom) and great-circle distances live in the submodules.

pub mod destinations;
pub mod geo;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use destinations::{Destination, RouteTarget};

// Errors.

/// Errors raised while validating estimator input.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("`{field}` must be a finite number.")]
    NotFinite { field: &'static str },
    #[error("`{field}` must not be negative (got {value}).")]
    Negative { field: &'static str, value: f64 },
    #[error("`{field}` is out of range (got {value}).")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("Invalid destination selected.")]
    UnknownDestination(String),
    #[error("Select a destination, drop a pin, or enter the one-way miles.")]
    MissingTarget,
}

/// Reject NaN, infinities and negative values.
pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<(), PricingError> {
    if !value.is_finite() {
        return Err(PricingError::NotFinite { field });
    }

    if value < 0.0 {
        return Err(PricingError::Negative { field, value });
    }

    Ok(())
}

// Settings.

/// Baseline parameters shared by every estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeSettings {
    /// Driver pay in dollars per hour.
    pub driver_rate: f64,
    /// Fuel price in dollars per gallon.
    pub gas_price: f64,
    /// Van fuel economy in miles per gallon.
    pub mpg: f64,
    /// Average driving speed in miles per hour.
    pub avg_speed: f64,
    /// Profit margin as a fraction (`0.15` is 15%).
    pub margin: f64,
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self {
            driver_rate: 22.5,
            gas_price: 3.5,
            mpg: 15.0,
            avg_speed: 50.0,
            margin: 0.15,
        }
    }
}

impl FeeSettings {
    pub fn validate(&self) -> Result<(), PricingError> {
        check_non_negative("driver_rate", self.driver_rate)?;
        check_non_negative("gas_price", self.gas_price)?;
        check_non_negative("mpg", self.mpg)?;
        check_non_negative("avg_speed", self.avg_speed)?;
        check_non_negative("margin", self.margin)?;

        Ok(())
    }
}

/// Per-request adjustments layered over the configured [`FeeSettings`].
///
/// `margin_percent` mirrors the dashboard input, which is entered in percent; when both
/// margin fields are present the fraction wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct SettingsOverride {
    pub driver_rate: Option<f64>,
    pub gas_price: Option<f64>,
    pub mpg: Option<f64>,
    pub avg_speed: Option<f64>,
    pub margin: Option<f64>,
    pub margin_percent: Option<f64>,
}

impl SettingsOverride {
    pub fn apply(&self, base: FeeSettings) -> FeeSettings {
        FeeSettings {
            driver_rate: self.driver_rate.unwrap_or(base.driver_rate),
            gas_price: self.gas_price.unwrap_or(base.gas_price),
            mpg: self.mpg.unwrap_or(base.mpg),
            avg_speed: self.avg_speed.unwrap_or(base.avg_speed),
            margin: self.margin.or(self.margin_percent.map(|percent| percent / 100.0)).unwrap_or(base.margin),
        }
    }
}

// Route.

/// The route-specific part of an estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteInput {
    pub one_way_miles: f64,
    pub tolls: f64,
    pub extras: f64,
}

impl RouteInput {
    pub fn validate(&self) -> Result<(), PricingError> {
        check_non_negative("one_way_miles", self.one_way_miles)?;
        check_non_negative("tolls", self.tolls)?;
        check_non_negative("extras", self.extras)?;

        Ok(())
    }
}

// Result.

/// Itemized estimate shown in the fee breakdown card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub round_trip_miles: f64,
    pub est_hours: f64,
    pub labor_cost: f64,
    pub gallons: f64,
    pub gas_cost: f64,
    pub tolls_and_extras: f64,
    pub subtotal: f64,
    pub suggested_fee: f64,
}

/// Compute the fee breakdown for `route` under `settings`.
///
/// When either `mpg` or `avg_speed` is zero the whole breakdown is zero.
pub fn estimate(settings: &FeeSettings, route: &RouteInput) -> FeeBreakdown {
    if settings.mpg == 0.0 || settings.avg_speed == 0.0 {
        return FeeBreakdown::default();
    }

    let round_trip_miles = route.one_way_miles * 2.0;
    let est_hours = round_trip_miles / settings.avg_speed;
    let labor_cost = est_hours * settings.driver_rate;
    let gallons = round_trip_miles / settings.mpg;
    let gas_cost = gallons * settings.gas_price;
    let tolls_and_extras = route.tolls + route.extras;
    let subtotal = labor_cost + gas_cost + tolls_and_extras;
    let suggested_fee = subtotal * (1.0 + settings.margin);

    FeeBreakdown {
        round_trip_miles,
        est_hours,
        labor_cost,
        gallons,
        gas_cost,
        tolls_and_extras,
        subtotal,
        suggested_fee,
    }
}

// Quotes.

/// A complete estimate request from the route form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FeeRequest {
    #[serde(flatten)]
    pub target: RouteTarget,
    #[serde(default)]
    pub tolls: f64,
    #[serde(default)]
    pub extras: f64,
    #[serde(default)]
    pub settings: SettingsOverride,
}

/// The resolved destination, the settings actually used, and the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quote {
    pub destination: Destination,
    pub settings: FeeSettings,
    pub breakdown: FeeBreakdown,
}

/// Resolve `request` against the configured `base` settings and estimate the fee.
pub fn quote(base: FeeSettings, request: &FeeRequest) -> Result<Quote, PricingError> {
    let settings = request.settings.apply(base);
    settings.validate()?;

    let destination = request.target.resolve()?;

    let route = RouteInput {
        one_way_miles: destination.miles,
        tolls: request.tolls,
        extras: request.extras,
    };
    route.validate()?;

    Ok(Quote {
        breakdown: estimate(&settings, &route),
        destination,
        settings,
    })
}
