//! Place details step.

use std::sync::Arc;

use async_trait::async_trait;
use museum_shared::Museum;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{DETAILS_KEY, OSM_ID_KEY, OSM_TYPE_KEY};
use crate::errors::StepError;
use crate::geocoding::Geocoder;
use crate::pipeline::{PipelineItem, Step};

/// Looks up the OSM object found by the geocoding stage and stores its
/// details under [`DETAILS_KEY`].
pub struct PlaceDetailsStep {
    geocoder: Arc<dyn Geocoder>,
}

impl PlaceDetailsStep {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }
}

#[async_trait]
impl Step<Museum> for PlaceDetailsStep {
    fn name(&self) -> &str {
        "place_details"
    }

    async fn run(&self, ctx: &CancellationToken, item: &PipelineItem<Museum>) -> Result<(), StepError> {
        let (Some(osm_type), Some(osm_id)) = (item.get_str(OSM_TYPE_KEY), item.get_i64(OSM_ID_KEY))
        else {
            debug!(name = %item.object().name, "No OSM reference, skipping place details");
            return Ok(());
        };

        let details = self.geocoder.place_details(ctx, &osm_type, osm_id).await?;
        let value =
            serde_json::to_value(&details).map_err(|e| StepError::merge(e.to_string()))?;
        item.insert(DETAILS_KEY, value);

        debug!(osm_type = %osm_type, osm_id = osm_id, "Stored place details");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::{louvre, FixedGeocoder};
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_reference_is_a_no_op() {
        let geocoder = Arc::new(FixedGeocoder::new(Some(louvre())));
        let step = PlaceDetailsStep::new(geocoder.clone());
        let item = PipelineItem::new(Museum::new("France", "Louvre"));
        item.insert(OSM_TYPE_KEY, json!("way"));

        step.run(&CancellationToken::new(), &item).await.unwrap();

        assert_eq!(geocoder.detail_calls(), 0);
        assert!(!item.contains_key(DETAILS_KEY));
    }

    #[tokio::test]
    async fn test_stores_details() {
        let geocoder = Arc::new(FixedGeocoder::new(Some(louvre())));
        let step = PlaceDetailsStep::new(geocoder.clone());
        let item = PipelineItem::new(Museum::new("France", "Louvre"));
        item.insert(OSM_TYPE_KEY, json!("way"));
        item.insert(OSM_ID_KEY, json!(42));

        step.run(&CancellationToken::new(), &item).await.unwrap();

        assert_eq!(geocoder.detail_calls(), 1);
        let details = item.get(DETAILS_KEY).unwrap();
        assert_eq!(details["osm_id"], json!(42));
        assert_eq!(details["localname"], json!("Louvre"));
    }

    #[tokio::test]
    async fn test_two_stage_pipeline_chains_steps() {
        let geocoder = Arc::new(FixedGeocoder::new(Some(louvre())));
        let pipeline = crate::steps::museum_pipeline(geocoder.clone());
        let item = PipelineItem::new(Museum::new("France", "Louvre"));

        let failures = pipeline.process_item(&CancellationToken::new(), &item).await;

        assert_eq!(failures, 0);
        assert_eq!(geocoder.detail_calls(), 1);
        assert_eq!(item.get(DETAILS_KEY).unwrap()["osm_type"], json!("way"));
    }
}
