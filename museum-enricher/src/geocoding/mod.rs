//! Geocoding.
//!
//! The [`Geocoder`] trait resolves museums to places; [`NominatimClient`]
//! implements it against the OpenStreetMap Nominatim API.

mod models;
mod nominatim;

pub use models::{osm_type_code, Geometry, Place, PlaceDetails};
pub use nominatim::{GeocoderConfig, NominatimClient, DEFAULT_NOMINATIM_URL};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::GeocodeError;

/// Place lookup service.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text query to its best match.
    async fn geocode(&self, ctx: &CancellationToken, query: &str) -> Result<Place, GeocodeError>;

    /// Fetch the details of an OSM object. `osm_type` may be the long form
    /// (`node`, `way`, `relation`) or the single-letter code.
    async fn place_details(
        &self,
        ctx: &CancellationToken,
        osm_type: &str,
        osm_id: i64,
    ) -> Result<PlaceDetails, GeocodeError>;
}
