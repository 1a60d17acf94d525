//! Geocoding step.

use std::sync::Arc;

use async_trait::async_trait;
use museum_shared::Museum;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::StepError;
use crate::geocoding::Geocoder;
use crate::pipeline::{PipelineItem, Step};

/// Resolves a museum by name and country and merges the matching place into
/// the item's results.
pub struct GeocodeStep {
    geocoder: Arc<dyn Geocoder>,
}

impl GeocodeStep {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    fn query(museum: &Museum) -> String {
        format!("{} {}", museum.name, museum.country)
            .trim()
            .to_string()
    }
}

#[async_trait]
impl Step<Museum> for GeocodeStep {
    fn name(&self) -> &str {
        "geocode"
    }

    async fn run(&self, ctx: &CancellationToken, item: &PipelineItem<Museum>) -> Result<(), StepError> {
        let query = Self::query(item.object());
        let place = self.geocoder.geocode(ctx, &query).await?;

        let written = item.merge_into_results(&place)?;
        debug!(query = %query, osm_id = place.osm_id, fields = written, "Geocoded museum");
        Ok(())
    }
}
