use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use serde::Serialize;
use tracing::instrument;

use crate::{
    pricing::{
        self, FeeRequest, Quote,
        destinations::{self, CustomPoint, Destination},
    },
    runtime::Runtime,
    server::error::ApiError,
};

use super::SearchQuery;

/// Maximum candidates returned by location search.
const LOCATION_SEARCH_LIMIT: usize = 5;

/// A geocoded place, already priced as a custom destination.
#[derive(Debug, Clone, Serialize)]
pub struct LocationCandidate {
    pub label: String,
    pub destination: Destination,
}

pub async fn destinations(Query(query): Query<SearchQuery>) -> Json<Vec<Destination>> {
    let list = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => destinations::search(q),
        None => destinations::all(),
    };

    Json(list)
}

#[instrument(name = "routes::fees::estimate", skip_all)]
pub async fn estimate(State(runtime): State<Runtime>, payload: Result<Json<FeeRequest>, JsonRejection>) -> Result<Json<Quote>, ApiError> {
    let Json(request) = payload?;

    let quote = pricing::quote(runtime.config.fee_settings(), &request)?;

    Ok(Json(quote))
}

pub async fn custom_location(payload: Result<Json<CustomPoint>, JsonRejection>) -> Result<Json<Destination>, ApiError> {
    let Json(point) = payload?;

    Ok(Json(point.resolve()?))
}

#[instrument(name = "routes::fees::search_locations", skip_all)]
pub async fn search_locations(State(runtime): State<Runtime>, Query(query): Query<SearchQuery>) -> Result<Json<Vec<LocationCandidate>>, ApiError> {
    let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(Json(Vec::new()));
    };

    let hits = runtime.geocode.search(q, LOCATION_SEARCH_LIMIT).await.map_err(|err| ApiError::internal("Location search failed", err))?;

    let candidates = hits
        .into_iter()
        .filter(|hit| hit.coordinates.validate().is_ok())
        .map(|hit| LocationCandidate {
            destination: destinations::custom_destination(hit.coordinates, Some(&hit.label)),
            label: hit.label,
        })
        .collect();

    Ok(Json(candidates))
}
