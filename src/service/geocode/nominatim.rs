//! Nominatim (OpenStreetMap) geocoding.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::{
    base::{config::Config, types::Res},
    pricing::geo::Coordinates,
};

use super::{GenericGeocodeClient, GeocodeClient, GeocodeHit};

const USER_AGENT: &str = concat!("dispatch-desk/", env!("CARGO_PKG_VERSION"));

// Extra methods on `GeocodeClient` applied by the nominatim implementation.

impl GeocodeClient {
    pub fn nominatim(config: &Config) -> Res<Self> {
        let client = NominatimGeocodeClient::new(&config.nominatim_base_url)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

/// Raw search result; Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimResult {
    fn into_hit(self) -> Option<GeocodeHit> {
        let lat = self.lat.parse().ok()?;
        let lng = self.lon.parse().ok()?;

        Some(GeocodeHit {
            label: self.display_name,
            coordinates: Coordinates::new(lat, lng),
        })
    }
}

/// Nominatim geocoding client.
#[derive(Clone)]
pub struct NominatimGeocodeClient {
    base_url: String,
    client: reqwest::Client,
}

impl NominatimGeocodeClient {
    pub fn new(base_url: &str) -> Res<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl GenericGeocodeClient for NominatimGeocodeClient {
    #[instrument(name = "NominatimGeocodeClient::search", skip(self))]
    async fn search(&self, query: &str, limit: usize) -> Res<Vec<GeocodeHit>> {
        let url = format!("{}/search", self.base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", limit.as_str())])
            .send()
            .await
            .context("Failed to send geocoding request")?;

        if !response.status().is_success() {
            warn!("Geocoding request returned {}", response.status());
            return Ok(Vec::new());
        }

        let results: Vec<NominatimResult> = response.json().await.context("Failed to parse geocoding response")?;

        Ok(results.into_iter().filter_map(NominatimResult::into_hit).collect())
    }
}
