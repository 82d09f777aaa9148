//! Free-text location search for the map widget.

pub mod nominatim;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{base::types::Res, pricing::geo::Coordinates};

// Types.

/// One candidate returned by a location search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeHit {
    /// Full display label, e.g. `Jupiter Inlet, Jupiter, Palm Beach County, Florida`.
    pub label: String,
    pub coordinates: Coordinates,
}

// Traits.

/// Generic geocoding client trait that clients must implement.
#[async_trait]
pub trait GenericGeocodeClient: Send + Sync + 'static {
    /// Search for up to `limit` places matching `query`.
    async fn search(&self, query: &str, limit: usize) -> Res<Vec<GeocodeHit>>;
}

// Structs.

/// Geocoding client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct GeocodeClient {
    inner: Arc<dyn GenericGeocodeClient>,
}

impl Deref for GeocodeClient {
    type Target = dyn GenericGeocodeClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl GeocodeClient {
    pub fn new(inner: Arc<dyn GenericGeocodeClient>) -> Self {
        Self { inner }
    }
}
