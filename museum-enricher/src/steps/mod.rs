//! Museum enrichment steps.
//!
//! Stage one geocodes the museum, stage two looks up the details of the OSM
//! object stage one found.

mod geocode;
mod place_details;

pub use geocode::GeocodeStep;
pub use place_details::PlaceDetailsStep;

use std::sync::Arc;

use museum_shared::Museum;

use crate::geocoding::Geocoder;
use crate::pipeline::{Pipeline, Stage};

/// Result key holding the OSM object type written by [`GeocodeStep`].
pub const OSM_TYPE_KEY: &str = "osm_type";

/// Result key holding the OSM object id written by [`GeocodeStep`].
pub const OSM_ID_KEY: &str = "osm_id";

/// Result key under which [`PlaceDetailsStep`] stores its details.
pub const DETAILS_KEY: &str = "details";

/// The two-stage museum pipeline: geocode, then place details.
pub fn museum_pipeline(geocoder: Arc<dyn Geocoder>) -> Pipeline<Museum> {
    Pipeline::new(vec![
        Stage::new().with_step(GeocodeStep::new(geocoder.clone())),
        Stage::new().with_step(PlaceDetailsStep::new(geocoder)),
    ])
}
